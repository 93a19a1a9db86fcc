//! Fuzzing-specific utilities.
//!
//! Public/exported only for access by fuzzers.

use crate::ordmap::{OrderedMap, OrderedSet};
use libfuzzer_sys::arbitrary;
use std::collections::{BTreeMap, BTreeSet};

/// One step of a differential run against `BTreeMap`.
#[derive(Clone, Debug)]
pub enum MapOp {
    Insert(u8, u32),
    /// `None` removes.
    Set(u8, Option<u32>),
    Remove(u8),
    Union(Vec<u8>),
    Intersect(Vec<u8>),
    /// Round-trip through a sorted vector.
    Rebuild,
}

impl<'a> arbitrary::Arbitrary<'a> for MapOp {
    fn arbitrary(u: &mut arbitrary::Unstructured<'a>) -> arbitrary::Result<Self> {
        Ok(match u.int_in_range(0..=5u8)? {
            0 => MapOp::Insert(u.arbitrary()?, u.arbitrary()?),
            1 => MapOp::Set(u.arbitrary()?, u.arbitrary()?),
            2 => MapOp::Remove(u.arbitrary()?),
            3 => MapOp::Union(u.arbitrary()?),
            4 => MapOp::Intersect(u.arbitrary()?),
            _ => MapOp::Rebuild,
        })
    }
}

/// Apply `ops` to an `OrderedMap` and a `BTreeMap` in lockstep,
/// panicking on the first divergence in results, contents, or balance.
pub fn check_against_btree(ops: &[MapOp]) {
    let mut map: OrderedMap<u8, u32> = OrderedMap::new();
    let mut oracle: BTreeMap<u8, u32> = BTreeMap::new();

    for op in ops {
        log::trace!("op: {:?}", op);
        match op {
            MapOp::Insert(k, v) => assert_eq!(map.insert(*k, *v), oracle.insert(*k, *v)),
            MapOp::Set(k, v) => {
                let expected = match v {
                    Some(v) => oracle.insert(*k, *v),
                    None => oracle.remove(k),
                };
                assert_eq!(map.set(*k, *v), expected);
            }
            MapOp::Remove(k) => assert_eq!(map.remove(k), oracle.remove(k)),
            MapOp::Union(keys) => {
                let other: OrderedMap<u8, u32> = keys.iter().map(|&k| (k, 0)).collect();
                let mut grew = false;
                for &k in keys {
                    if !oracle.contains_key(&k) {
                        oracle.insert(k, 0);
                        grew = true;
                    }
                }
                assert_eq!(map.union_with(&other), grew);
            }
            MapOp::Intersect(keys) => {
                let other: OrderedMap<u8, u32> = keys.iter().map(|&k| (k, 0)).collect();
                let keep: BTreeSet<u8> = keys.iter().copied().collect();
                let before = oracle.len();
                oracle.retain(|k, _| keep.contains(k));
                assert_eq!(map.intersect_with(&other), oracle.len() != before);
            }
            MapOp::Rebuild => {
                map = OrderedMap::from_sorted_vec(std::mem::take(&mut map).into_sorted_vec());
            }
        }
        assert!(map.check_invariants(), "unbalanced after {:?}", op);
        assert_eq!(map.len(), oracle.len());
        assert!(map.iter().eq(oracle.iter()));
    }

    let keys: OrderedSet<u8> = map.keys().copied().collect();
    assert!(keys.iter().eq(oracle.keys()));
}
