#![cfg(test)]

// Property tests for HashListMap against a std HashMap model, kept inside
// the crate so they run with the regular unit-test pass.

use crate::{HashListMap, ListCollection, ListMap};
use proptest::prelude::*;
use std::collections::HashMap;

// Small key pool so op sequences revisit keys; indices shrink toward
// earlier keys and op lists shrink in length.
fn key(raw: usize) -> String {
    format!("k{}", raw % 8)
}

proptest! {
    // Invariants exercised against the model after every operation:
    // - `get`/`contains_key`/`remove`/`put` agree with std HashMap.
    // - `size` equals the model's len; `raw_size` never shrinks below it.
    // - every view reports the parent's size.
    // At the end, a map rebuilt from the model in sorted order is equal to
    // the grown one and hashes identically (order independence).
    #[test]
    fn prop_model_equivalence(ops in proptest::collection::vec((0u8..=3u8, 0usize..64, 0i32..100), 1..200)) {
        let mut map: HashListMap<String, i32> = HashListMap::new();
        let mut model: HashMap<String, i32> = HashMap::new();

        for (op, raw_key, value) in ops {
            let key = key(raw_key);
            match op {
                0 => {
                    let previous = map.put(key.clone(), value).unwrap();
                    prop_assert_eq!(previous, model.insert(key.clone(), value));
                }
                1 => {
                    let removed = map.remove(&key).unwrap();
                    prop_assert_eq!(removed, model.remove(&key));
                }
                2 => {
                    prop_assert_eq!(map.get(&key), model.get(&key));
                }
                3 => {
                    prop_assert_eq!(map.contains_key(&key), model.contains_key(&key));
                }
                _ => unreachable!(),
            }

            prop_assert_eq!(map.size(), model.len());
            prop_assert!(map.raw_size() >= map.size());
            prop_assert_eq!(map.keys().size(), map.size());
            prop_assert_eq!(map.values().size(), map.size());
            prop_assert_eq!(map.entries().size(), map.size());
        }

        let mut sorted: Vec<(String, i32)> = model.iter().map(|(k, v)| (k.clone(), *v)).collect();
        sorted.sort();
        let rebuilt: HashListMap<String, i32> = sorted.into_iter().collect();
        prop_assert!(map.map_eq(&rebuilt));
        prop_assert!(rebuilt.map_eq(&map));
        prop_assert_eq!(map.map_hash(), rebuilt.map_hash());
    }

    // Invariant: all three views and `for_each` walk the same live slots
    // in the same ascending order, whatever tombstones removal left
    // behind.
    #[test]
    fn prop_views_follow_slot_order(
        inserts in proptest::collection::vec((0usize..64, 0i32..100), 0..40),
        removals in proptest::collection::vec(0usize..64, 0..16),
    ) {
        let mut map: HashListMap<String, i32> = HashListMap::new();
        for (raw_key, value) in inserts {
            map.put(key(raw_key), value).unwrap();
        }
        for raw_key in removals {
            map.remove(&key(raw_key)).unwrap();
        }

        let mut walked = Vec::new();
        map.for_each(|k, v| walked.push((k.clone(), *v)));
        prop_assert_eq!(walked.len(), map.size());

        let keys: Vec<String> = map.keys().iter().cloned().collect();
        let values: Vec<i32> = map.values().iter().copied().collect();
        let zipped: Vec<(String, i32)> = keys.into_iter().zip(values).collect();
        prop_assert_eq!(&walked, &zipped);

        let entry_pairs: Vec<(String, i32)> = map
            .entries()
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect();
        prop_assert_eq!(&walked, &entry_pairs);
    }

    // Invariant: every live entry is found by `entries().get_index` under
    // its exact pair, and not found under a perturbed value.
    #[test]
    fn prop_entries_get_index_requires_value_match(
        inserts in proptest::collection::vec((0usize..16, 0i32..100), 1..24),
    ) {
        use crate::ListSet;

        let mut map: HashListMap<String, i32> = HashListMap::new();
        for (raw_key, value) in inserts {
            map.put(key(raw_key), value).unwrap();
        }

        let pairs: Vec<(String, i32)> = map
            .entries()
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect();
        for (k, v) in pairs {
            let entries = map.entries();
            let index = entries.get_index(&(k.clone(), v));
            prop_assert_eq!(index, map.get_index(&k));
            prop_assert_eq!(entries.get_index(&(k, v + 1)), None);
        }
    }
}
