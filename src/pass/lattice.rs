//! Confluence operators for the fact representations analyses use.

use crate::ordmap::{OrderedMap, OrderedSet};
use std::fmt::Debug;

/// How set-valued facts combine where control flow joins.
///
/// `Union` suits may-analyses (a property holds on some incoming
/// path; top is the empty set). `Intersection` suits must-analyses (a
/// property holds on every incoming path; top is the universe of
/// possible elements, which the analysis must supply as its `init`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Meet {
    Union,
    Intersection,
}

impl Meet {
    /// Mutate `into` to `into meet other`. Returns `true` if any
    /// changes occurred.
    pub fn apply<K: Ord + Clone>(self, into: &mut OrderedSet<K>, other: &OrderedSet<K>) -> bool {
        match self {
            Meet::Union => into.union_with(other),
            Meet::Intersection => into.intersect_with(other),
        }
    }
}

/// A map-valued must-fact with an explicit top.
///
/// `Top` is "no path has reached here yet" and is the identity of
/// `meet_with`; a concrete map holds the entries that agree on every
/// path seen so far. This avoids materializing a universe of every
/// (key, value) pair.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MapFact<K, V> {
    Top,
    Known(OrderedMap<K, V>),
}

impl<K, V> Default for MapFact<K, V> {
    fn default() -> Self {
        MapFact::Top
    }
}

impl<K: Ord + Clone + Debug, V: Clone + PartialEq + Debug> MapFact<K, V> {
    pub fn empty() -> Self {
        MapFact::Known(OrderedMap::new())
    }

    pub fn is_top(&self) -> bool {
        matches!(self, MapFact::Top)
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        match self {
            MapFact::Top => None,
            MapFact::Known(map) => map.get(key),
        }
    }

    /// Bind or unbind `key`. No-op on top, which only unreachable code
    /// ever observes.
    pub fn set(&mut self, key: K, value: Option<V>) {
        if let MapFact::Known(map) = self {
            map.set(key, value);
        }
    }

    /// Keep the entries both sides agree on. Returns `true` if any
    /// changes occurred.
    pub fn meet_with(&mut self, other: &Self) -> bool {
        let theirs = match other {
            MapFact::Top => return false,
            MapFact::Known(theirs) => theirs,
        };
        match self {
            MapFact::Top => {
                *self = MapFact::Known(theirs.clone());
                true
            }
            MapFact::Known(map) => map.retain_agreeing(theirs),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn set_meets() {
        let mut a: OrderedSet<u32> = [1, 2, 3].iter().copied().collect();
        let b: OrderedSet<u32> = [2, 3, 4].iter().copied().collect();
        assert!(Meet::Union.apply(&mut a, &b));
        assert_eq!(a.to_sorted_vec(), vec![1, 2, 3, 4]);
        assert!(Meet::Intersection.apply(&mut a, &b));
        assert_eq!(a.to_sorted_vec(), vec![2, 3, 4]);
        assert!(!Meet::Intersection.apply(&mut a, &b));
    }

    #[test]
    fn map_fact_meet() {
        let mut fact = MapFact::Top;
        let mut known = MapFact::empty();
        known.set(1u32, Some(10i64));
        known.set(2, Some(20));
        assert!(!known.clone().meet_with(&MapFact::Top));
        assert!(fact.meet_with(&known));
        assert_eq!(fact.get(&1), Some(&10));

        let mut other = MapFact::empty();
        other.set(1, Some(10));
        other.set(2, Some(21));
        assert!(fact.meet_with(&other));
        assert_eq!(fact.get(&1), Some(&10));
        assert_eq!(fact.get(&2), None);
        assert!(!fact.meet_with(&other));
    }
}
