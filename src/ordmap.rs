//! Ordered map and set.
//!
//! An AVL tree keyed by any `Ord` type. Point operations (lookup,
//! insert, remove) rebalance incrementally with single and double
//! rotations. The bulk set-algebra operations (`union_with`,
//! `intersect_with`) instead take sorted snapshots of both operands,
//! merge them in one linear pass, and rebuild a perfectly balanced
//! tree from the result with `from_sorted_vec`; this is much cheaper
//! than inserting or removing entries one at a time, and it is the
//! hot path of every set-valued dataflow analysis.
//!
//! Scratch space for the merges is allocated per call and sized from
//! the operands, so there is no upper bound on set size.
//!
//! With the `check-ordmap` feature every mutation re-derives the whole
//! tree and panics on a broken invariant.

use std::cmp::Ordering;
use std::fmt::Debug;
use std::iter::{FromIterator, Peekable};

type Link<K, V> = Option<Box<Node<K, V>>>;

#[derive(Clone)]
struct Node<K, V> {
    key: K,
    value: V,
    /// Height of the subtree rooted here; a leaf has height 1.
    height: u32,
    left: Link<K, V>,
    right: Link<K, V>,
}

fn height<K, V>(link: &Link<K, V>) -> u32 {
    link.as_ref().map_or(0, |node| node.height)
}

impl<K, V> Node<K, V> {
    fn leaf(key: K, value: V) -> Box<Self> {
        Box::new(Node {
            key,
            value,
            height: 1,
            left: None,
            right: None,
        })
    }

    fn update_height(&mut self) {
        self.height = 1 + std::cmp::max(height(&self.left), height(&self.right));
    }

    fn balance(&self) -> i64 {
        i64::from(height(&self.left)) - i64::from(height(&self.right))
    }
}

fn rotate_right<K, V>(mut node: Box<Node<K, V>>) -> Box<Node<K, V>> {
    match node.left.take() {
        Some(mut pivot) => {
            node.left = pivot.right.take();
            node.update_height();
            pivot.right = Some(node);
            pivot.update_height();
            pivot
        }
        None => node,
    }
}

fn rotate_left<K, V>(mut node: Box<Node<K, V>>) -> Box<Node<K, V>> {
    match node.right.take() {
        Some(mut pivot) => {
            node.right = pivot.left.take();
            node.update_height();
            pivot.left = Some(node);
            pivot.update_height();
            pivot
        }
        None => node,
    }
}

/// Restore the AVL invariant at `node`, assuming both subtrees are
/// valid AVL trees whose heights differ by at most two.
fn rebalance<K, V>(mut node: Box<Node<K, V>>) -> Box<Node<K, V>> {
    node.update_height();
    let balance = node.balance();
    if balance > 1 {
        // Left-right case: straighten the left child first.
        if node.left.as_ref().map_or(0, |left| left.balance()) < 0 {
            node.left = node.left.take().map(rotate_left);
        }
        rotate_right(node)
    } else if balance < -1 {
        // Right-left case.
        if node.right.as_ref().map_or(0, |right| right.balance()) > 0 {
            node.right = node.right.take().map(rotate_right);
        }
        rotate_left(node)
    } else {
        node
    }
}

fn insert_at<K: Ord, V>(link: Link<K, V>, key: K, value: V) -> (Box<Node<K, V>>, Option<V>) {
    let mut node = match link {
        None => return (Node::leaf(key, value), None),
        Some(node) => node,
    };
    let old = match key.cmp(&node.key) {
        Ordering::Equal => {
            let old = std::mem::replace(&mut node.value, value);
            // No structural change.
            return (node, Some(old));
        }
        Ordering::Less => {
            let (child, old) = insert_at(node.left.take(), key, value);
            node.left = Some(child);
            old
        }
        Ordering::Greater => {
            let (child, old) = insert_at(node.right.take(), key, value);
            node.right = Some(child);
            old
        }
    };
    (rebalance(node), old)
}

/// Detach the minimum node of a subtree; returns the remaining
/// (rebalanced) subtree and the detached node.
fn take_min<K, V>(mut node: Box<Node<K, V>>) -> (Link<K, V>, Box<Node<K, V>>) {
    match node.left.take() {
        None => {
            let rest = node.right.take();
            (rest, node)
        }
        Some(left) => {
            let (rest, min) = take_min(left);
            node.left = rest;
            (Some(rebalance(node)), min)
        }
    }
}

fn remove_at<K: Ord, V>(link: Link<K, V>, key: &K) -> (Link<K, V>, Option<V>) {
    let mut node = match link {
        None => return (None, None),
        Some(node) => node,
    };
    match key.cmp(&node.key) {
        Ordering::Less => {
            let (child, old) = remove_at(node.left.take(), key);
            node.left = child;
            (Some(rebalance(node)), old)
        }
        Ordering::Greater => {
            let (child, old) = remove_at(node.right.take(), key);
            node.right = child;
            (Some(rebalance(node)), old)
        }
        Ordering::Equal => {
            let Node {
                value, left, right, ..
            } = *node;
            let joined = match (left, right) {
                (None, right) => right,
                (left, None) => left,
                (Some(left), Some(right)) => {
                    // Replace the removed node by its in-order successor.
                    let (rest, mut succ) = take_min(right);
                    succ.left = Some(left);
                    succ.right = rest;
                    Some(rebalance(succ))
                }
            };
            (joined, Some(value))
        }
    }
}

/// Build a height-balanced tree from the next `len` entries of an
/// ascending sequence, in linear time.
fn build_balanced<K, V, I: Iterator<Item = (K, V)>>(entries: &mut I, len: usize) -> Link<K, V> {
    if len == 0 {
        return None;
    }
    let left = build_balanced(entries, len / 2);
    let (key, value) = match entries.next() {
        Some(entry) => entry,
        None => return left,
    };
    let right = build_balanced(entries, len - len / 2 - 1);
    let mut node = Box::new(Node {
        key,
        value,
        height: 1,
        left,
        right,
    });
    node.update_height();
    Some(node)
}

/// Re-derive heights, ordering and balance of a subtree. Returns the
/// subtree's height and entry count, or `None` if any invariant fails.
fn check_subtree<K: Ord, V>(
    link: &Link<K, V>,
    lower: Option<&K>,
    upper: Option<&K>,
) -> Option<(u32, usize)> {
    let node = match link {
        None => return Some((0, 0)),
        Some(node) => node,
    };
    if lower.map_or(false, |lower| node.key <= *lower)
        || upper.map_or(false, |upper| node.key >= *upper)
    {
        return None;
    }
    let (lh, lc) = check_subtree(&node.left, lower, Some(&node.key))?;
    let (rh, rc) = check_subtree(&node.right, Some(&node.key), upper)?;
    let h = 1 + std::cmp::max(lh, rh);
    if h != node.height || (i64::from(lh) - i64::from(rh)).abs() > 1 {
        return None;
    }
    Some((h, lc + rc + 1))
}

/// Which operand(s) the next merge step draws from.
enum Step {
    Left,
    Right,
    Both,
    Done,
}

fn next_step<'a, K: Ord + 'a, A, B, L, R>(lhs: &mut Peekable<L>, rhs: &mut Peekable<R>) -> Step
where
    L: Iterator<Item = (K, A)>,
    R: Iterator<Item = (&'a K, B)>,
{
    match (lhs.peek(), rhs.peek()) {
        (Some((lk, _)), Some((rk, _))) => match lk.cmp(*rk) {
            Ordering::Less => Step::Left,
            Ordering::Greater => Step::Right,
            Ordering::Equal => Step::Both,
        },
        (Some(_), None) => Step::Left,
        (None, Some(_)) => Step::Right,
        (None, None) => Step::Done,
    }
}

/// An ordered map backed by an AVL tree.
#[derive(Clone)]
pub struct OrderedMap<K, V> {
    root: Link<K, V>,
    len: usize,
}

impl<K, V> Default for OrderedMap<K, V> {
    fn default() -> Self {
        OrderedMap { root: None, len: 0 }
    }
}

impl<K, V> OrderedMap<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Height of the tree; zero when empty.
    pub fn height(&self) -> u32 {
        height(&self.root)
    }

    pub fn clear(&mut self) {
        self.root = None;
        self.len = 0;
    }

    /// In-order iteration: every entry exactly once, ascending by key.
    pub fn iter(&self) -> Iter<'_, K, V> {
        let mut iter = Iter {
            stack: Vec::with_capacity(self.height() as usize),
            remaining: self.len,
        };
        iter.push_left(self.root.as_deref());
        iter
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.iter().map(|(_, v)| v)
    }
}

impl<K: Ord, V> OrderedMap<K, V> {
    pub fn get(&self, key: &K) -> Option<&V> {
        let mut link = &self.root;
        while let Some(node) = link {
            link = match key.cmp(&node.key) {
                Ordering::Equal => return Some(&node.value),
                Ordering::Less => &node.left,
                Ordering::Greater => &node.right,
            };
        }
        None
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// Insert or overwrite; returns the previous value, if any.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let (root, old) = insert_at(self.root.take(), key, value);
        self.root = Some(root);
        if old.is_none() {
            self.len += 1;
        }
        self.debug_check();
        old
    }

    /// Insert `Some(value)`, or remove the key for `None`.
    pub fn set(&mut self, key: K, value: Option<V>) -> Option<V> {
        match value {
            Some(value) => self.insert(key, value),
            None => self.remove(&key),
        }
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        let (root, old) = remove_at(self.root.take(), key);
        self.root = root;
        if old.is_some() {
            self.len -= 1;
        }
        self.debug_check();
        old
    }

    /// Consume the map into its entries, ascending by key.
    pub fn into_sorted_vec(self) -> Vec<(K, V)> {
        self.into_iter().collect()
    }

    /// Build a balanced map from strictly ascending entries in linear
    /// time.
    pub fn from_sorted_vec(entries: Vec<(K, V)>) -> Self {
        debug_assert!(
            entries.windows(2).all(|w| w[0].0 < w[1].0),
            "from_sorted_vec: keys not strictly ascending"
        );
        let len = entries.len();
        let root = build_balanced(&mut entries.into_iter(), len);
        let map = OrderedMap { root, len };
        map.debug_check();
        map
    }

    /// Re-derive every node's height and check key order, the AVL
    /// balance condition and the cached length.
    pub fn check_invariants(&self) -> bool {
        match check_subtree(&self.root, None, None) {
            Some((_, count)) => count == self.len,
            None => false,
        }
    }

    /// Full re-derivation after every mutation; linear per call, so
    /// only built with the `check-ordmap` feature.
    fn debug_check(&self) {
        #[cfg(feature = "check-ordmap")]
        {
            if !self.check_invariants() {
                panic!("ordered map invariants violated");
            }
        }
    }
}

impl<K: Ord + Clone, V: Clone> OrderedMap<K, V> {
    /// Snapshot of the entries, ascending by key.
    pub fn to_sorted_vec(&self) -> Vec<(K, V)> {
        self.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }

    /// Keep every key present on either side; on a shared key the
    /// value already in `self` wins. Returns `true` if `other`
    /// contributed at least one key absent from `self`.
    pub fn union_with(&mut self, other: &Self) -> bool {
        let mut merged = Vec::with_capacity(self.len + other.len);
        let mut changed = false;
        let mut lhs = std::mem::take(self).into_iter().peekable();
        let mut rhs = other.iter().peekable();
        loop {
            match next_step(&mut lhs, &mut rhs) {
                Step::Left => merged.extend(lhs.next()),
                Step::Right => {
                    if let Some((k, v)) = rhs.next() {
                        merged.push((k.clone(), v.clone()));
                        changed = true;
                    }
                }
                Step::Both => {
                    merged.extend(lhs.next());
                    rhs.next();
                }
                Step::Done => break,
            }
        }
        *self = Self::from_sorted_vec(merged);
        changed
    }

    /// Keep only the keys present on both sides, with the values from
    /// `self`. Returns `true` if `self` lost at least one key.
    pub fn intersect_with(&mut self, other: &Self) -> bool {
        let mut merged = Vec::with_capacity(std::cmp::min(self.len, other.len));
        let mut changed = false;
        let mut lhs = std::mem::take(self).into_iter().peekable();
        let mut rhs = other.iter().peekable();
        loop {
            match next_step(&mut lhs, &mut rhs) {
                Step::Left => {
                    lhs.next();
                    changed = true;
                }
                Step::Right => {
                    if lhs.peek().is_none() {
                        break;
                    }
                    rhs.next();
                }
                Step::Both => {
                    merged.extend(lhs.next());
                    rhs.next();
                }
                Step::Done => break,
            }
        }
        *self = Self::from_sorted_vec(merged);
        changed
    }
}

impl<K: Ord + Clone, V: Clone + PartialEq> OrderedMap<K, V> {
    /// Keep only the entries that `other` holds with an equal value.
    /// Returns `true` if anything was dropped.
    pub fn retain_agreeing(&mut self, other: &Self) -> bool {
        let before = self.len;
        let kept = std::mem::take(self)
            .into_iter()
            .filter(|(k, v)| other.get(k) == Some(v))
            .collect::<Vec<_>>();
        *self = Self::from_sorted_vec(kept);
        self.len != before
    }
}

impl<K: PartialEq, V: PartialEq> PartialEq for OrderedMap<K, V> {
    fn eq(&self, other: &Self) -> bool {
        // Both sides iterate in key order, so a lockstep walk suffices.
        self.len == other.len
            && self
                .iter()
                .zip(other.iter())
                .all(|((ak, av), (bk, bv))| ak == bk && av == bv)
    }
}

impl<K: Eq, V: Eq> Eq for OrderedMap<K, V> {}

impl<K: Debug, V: Debug> Debug for OrderedMap<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: Ord, V> FromIterator<(K, V)> for OrderedMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = OrderedMap::new();
        map.extend(iter);
        map
    }
}

impl<K: Ord, V> Extend<(K, V)> for OrderedMap<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<'a, K, V> IntoIterator for &'a OrderedMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;
    fn into_iter(self) -> Iter<'a, K, V> {
        self.iter()
    }
}

impl<K, V> IntoIterator for OrderedMap<K, V> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;
    fn into_iter(self) -> IntoIter<K, V> {
        let mut iter = IntoIter {
            stack: Vec::with_capacity(self.height() as usize),
            remaining: self.len,
        };
        iter.push_left(self.root);
        iter
    }
}

/// Borrowing in-order iterator. Uses an explicit stack bounded by the
/// tree height.
pub struct Iter<'a, K, V> {
    stack: Vec<&'a Node<K, V>>,
    remaining: usize,
}

impl<'a, K, V> Iter<'a, K, V> {
    fn push_left(&mut self, mut link: Option<&'a Node<K, V>>) {
        while let Some(node) = link {
            self.stack.push(node);
            link = node.left.as_deref();
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.push_left(node.right.as_deref());
        self.remaining -= 1;
        Some((&node.key, &node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, K, V> ExactSizeIterator for Iter<'a, K, V> {}

/// Consuming in-order iterator.
pub struct IntoIter<K, V> {
    stack: Vec<Box<Node<K, V>>>,
    remaining: usize,
}

impl<K, V> IntoIter<K, V> {
    fn push_left(&mut self, mut link: Link<K, V>) {
        while let Some(mut node) = link {
            link = node.left.take();
            self.stack.push(node);
        }
    }
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<(K, V)> {
        let mut node = self.stack.pop()?;
        let right = node.right.take();
        self.push_left(right);
        self.remaining -= 1;
        let Node { key, value, .. } = *node;
        Some((key, value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {}

/// An ordered set: an `OrderedMap` with unit values.
#[derive(Clone, PartialEq, Eq)]
pub struct OrderedSet<K> {
    map: OrderedMap<K, ()>,
}

impl<K> Default for OrderedSet<K> {
    fn default() -> Self {
        OrderedSet {
            map: OrderedMap::default(),
        }
    }
}

impl<K> OrderedSet<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn clear(&mut self) {
        self.map.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &K> + '_ {
        self.map.keys()
    }
}

impl<K: Ord> OrderedSet<K> {
    pub fn contains(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }

    /// Returns `true` if the key was not already present.
    pub fn insert(&mut self, key: K) -> bool {
        self.map.insert(key, ()).is_none()
    }

    /// Returns `true` if the key was present.
    pub fn remove(&mut self, key: &K) -> bool {
        self.map.remove(key).is_some()
    }

    pub fn into_sorted_vec(self) -> Vec<K> {
        self.map.into_iter().map(|(k, ())| k).collect()
    }

    pub fn from_sorted_vec(keys: Vec<K>) -> Self {
        OrderedSet {
            map: OrderedMap::from_sorted_vec(keys.into_iter().map(|k| (k, ())).collect()),
        }
    }

    pub fn check_invariants(&self) -> bool {
        self.map.check_invariants()
    }
}

impl<K: Ord + Clone> OrderedSet<K> {
    pub fn to_sorted_vec(&self) -> Vec<K> {
        self.iter().cloned().collect()
    }

    /// See `OrderedMap::union_with`.
    pub fn union_with(&mut self, other: &Self) -> bool {
        self.map.union_with(&other.map)
    }

    /// See `OrderedMap::intersect_with`.
    pub fn intersect_with(&mut self, other: &Self) -> bool {
        self.map.intersect_with(&other.map)
    }
}

impl<K: Debug> Debug for OrderedSet<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<K: Ord> FromIterator<K> for OrderedSet<K> {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut set = OrderedSet::new();
        set.extend(iter);
        set
    }
}

impl<K: Ord> Extend<K> for OrderedSet<K> {
    fn extend<I: IntoIterator<Item = K>>(&mut self, iter: I) {
        for k in iter {
            self.insert(k);
        }
    }
}
