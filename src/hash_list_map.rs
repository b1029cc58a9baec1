//! Hash-indexed concrete container over flat slot storage.

use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash, Hasher};
use core::mem;
use hashbrown::hash_table::Entry as TableEntry;
use hashbrown::HashTable;
use std::collections::hash_map::RandomState;

use crate::collection::check_slot_index;
use crate::map::{ListMap, UnsupportedOperation};
use crate::reentry::ReentryFlag;

#[derive(Debug)]
struct Slot<K, V> {
    key: K,
    value: V,
    hash: u64,
}

/// Mutable map over an append-only slot vector with a `HashTable` index.
///
/// Removal is logical: the slot becomes a tombstone and its index stays
/// allocated until `clear`, so live slot indices are stable. The index
/// table only ever refers to live slots. Each slot stores its precomputed
/// hash; probing and unlinking always use the stored hash, so user `Hash`
/// code never runs during removal or table growth.
///
/// Indexed reads of a tombstoned slot are a contract violation and panic;
/// every enumerating operation checks `is_removed` first and never reads
/// one.
pub struct HashListMap<K, V, S = RandomState> {
    hasher: S,
    index: HashTable<usize>,
    slots: Vec<Option<Slot<K, V>>>,
    live: usize,
    reentry: ReentryFlag,
}

impl<K, V> HashListMap<K, V>
where
    K: Eq + Hash,
{
    pub fn new() -> Self {
        Self::with_hasher(Default::default())
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            hasher: Default::default(),
            index: HashTable::with_capacity(capacity),
            slots: Vec::with_capacity(capacity),
            live: 0,
            reentry: ReentryFlag::new(),
        }
    }
}

impl<K, V> Default for HashListMap<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> HashListMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            hasher,
            index: HashTable::new(),
            slots: Vec::new(),
            live: 0,
            reentry: ReentryFlag::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Number of slots including tombstones.
    pub fn raw_len(&self) -> usize {
        self.slots.len()
    }

    /// Borrowed lookup: slot index holding `key`, or `None`.
    pub fn find<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _guard = self.reentry.enter();
        let hash = self.hasher.hash_one(key);
        self.index
            .find(hash, |&slot| {
                self.slots[slot]
                    .as_ref()
                    .map(|stored| stored.key.borrow() == key)
                    .unwrap_or(false)
            })
            .copied()
    }

    fn live_slot(&self, index: usize) -> &Slot<K, V> {
        check_slot_index(index, self.slots.len());
        match &self.slots[index] {
            Some(slot) => slot,
            None => panic!("slot {index} is removed"),
        }
    }
}

impl<K, V, S> ListMap<K, V> for HashListMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn size(&self) -> usize {
        self.live
    }

    fn raw_size(&self) -> usize {
        self.slots.len()
    }

    fn is_removed(&self, index: usize) -> bool {
        check_slot_index(index, self.slots.len());
        self.slots[index].is_none()
    }

    fn get_index(&self, key: &K) -> Option<usize> {
        self.find(key)
    }

    fn key_at(&self, index: usize) -> &K {
        &self.live_slot(index).key
    }

    fn value_at(&self, index: usize) -> &V {
        &self.live_slot(index).value
    }

    fn put(&mut self, key: K, value: V) -> Result<Option<V>, UnsupportedOperation> {
        let _guard = self.reentry.enter();
        let hash = self.hasher.hash_one(&key);
        match self.index.entry(
            hash,
            |&slot| {
                self.slots[slot]
                    .as_ref()
                    .map(|stored| stored.key == key)
                    .unwrap_or(false)
            },
            |&slot| self.slots[slot].as_ref().map(|stored| stored.hash).unwrap_or(0),
        ) {
            TableEntry::Occupied(occupied) => {
                let slot = *occupied.get();
                let stored = self.slots[slot].as_mut().expect("indexed slot must be live");
                Ok(Some(mem::replace(&mut stored.value, value)))
            }
            TableEntry::Vacant(vacant) => {
                let slot = self.slots.len();
                self.slots.push(Some(Slot { key, value, hash }));
                let _ = vacant.insert(slot);
                self.live += 1;
                Ok(None)
            }
        }
    }

    fn remove_at(&mut self, index: usize) -> Result<V, UnsupportedOperation> {
        check_slot_index(index, self.slots.len());
        let slot = {
            let _guard = self.reentry.enter();
            let slot = match self.slots[index].take() {
                Some(slot) => slot,
                None => panic!("slot {index} is removed"),
            };
            match self.index.find_entry(slot.hash, |&stored| stored == index) {
                Ok(linked) => {
                    linked.remove();
                }
                Err(_) => unreachable!("live slot {index} must be linked in the index"),
            }
            self.live -= 1;
            slot
        };
        // The key drops after the guard releases, so `Drop` impls may
        // safely touch the map again.
        Ok(slot.value)
    }

    fn set_value_at(&mut self, index: usize, value: V) -> Result<V, UnsupportedOperation> {
        check_slot_index(index, self.slots.len());
        match self.slots[index].as_mut() {
            Some(stored) => Ok(mem::replace(&mut stored.value, value)),
            None => panic!("slot {index} is removed"),
        }
    }

    fn clear(&mut self) -> Result<(), UnsupportedOperation> {
        let old = {
            let _guard = self.reentry.enter();
            self.index.clear();
            self.live = 0;
            mem::take(&mut self.slots)
        };
        // Entries drop after the guard releases, so `Drop` impls may
        // safely touch the map again.
        drop(old);
        Ok(())
    }
}

impl<K, V, S1, S2> PartialEq<HashListMap<K, V, S2>> for HashListMap<K, V, S1>
where
    K: Eq + Hash,
    V: PartialEq,
    S1: BuildHasher,
    S2: BuildHasher,
{
    fn eq(&self, other: &HashListMap<K, V, S2>) -> bool {
        self.map_eq(other)
    }
}

impl<K, V, S> Eq for HashListMap<K, V, S>
where
    K: Eq + Hash,
    V: Eq,
    S: BuildHasher,
{
}

impl<K, V, S> Hash for HashListMap<K, V, S>
where
    K: Eq + Hash,
    V: Hash,
    S: BuildHasher,
{
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.map_hash());
    }
}

impl<K, V, S> fmt::Display for HashListMap<K, V, S>
where
    K: Eq + Hash + fmt::Display,
    V: fmt::Display,
    S: BuildHasher,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_map(f)
    }
}

impl<K, V, S> fmt::Debug for HashListMap<K, V, S>
where
    K: Eq + Hash + fmt::Debug,
    V: fmt::Debug,
    S: BuildHasher,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.slots.iter().flatten().map(|slot| (&slot.key, &slot.value)))
            .finish()
    }
}

impl<K, V, S> Extend<(K, V)> for HashListMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, pairs: I) {
        for (key, value) in pairs {
            let _ = self.put(key, value);
        }
    }
}

impl<K, V, S> FromIterator<(K, V)> for HashListMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(pairs: I) -> Self {
        let mut map = Self::with_hasher(S::default());
        map.extend(pairs);
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::ListCollection;
    use std::panic::{catch_unwind, AssertUnwindSafe};

    /// Invariant: `put` of a fresh key appends a slot and returns `None`;
    /// `put` of an existing key replaces in place and returns the previous
    /// value without allocating a new slot.
    #[test]
    fn put_appends_and_replaces() {
        let mut m: HashListMap<String, i32> = HashListMap::new();
        assert_eq!(m.put("a".to_string(), 1).unwrap(), None);
        assert_eq!(m.put("b".to_string(), 2).unwrap(), None);
        assert_eq!(m.raw_len(), 2);

        assert_eq!(m.put("a".to_string(), 10).unwrap(), Some(1));
        assert_eq!(m.raw_len(), 2, "replacement must not allocate a slot");
        assert_eq!(m.get(&"a".to_string()), Some(&10));
        assert_eq!(m.get(&"b".to_string()), Some(&2));
    }

    /// Invariant: removal tombstones the slot. `raw_size` is unchanged,
    /// `size` drops, `is_removed` reports the tombstone, and lookups no
    /// longer resolve the key.
    #[test]
    fn remove_leaves_tombstone() {
        let mut m: HashListMap<String, i32> = HashListMap::new();
        m.put("a".to_string(), 1).unwrap();
        m.put("b".to_string(), 2).unwrap();
        m.put("c".to_string(), 3).unwrap();

        assert_eq!(m.remove(&"b".to_string()).unwrap(), Some(2));
        assert_eq!(m.size(), 2);
        assert_eq!(m.raw_size(), 3);
        assert!(m.is_removed(1));
        assert!(!m.is_removed(0));
        assert!(!m.contains_key(&"b".to_string()));
        assert_eq!(m.get_index(&"b".to_string()), None);

        // Surviving slots keep their indices.
        assert_eq!(m.get_index(&"a".to_string()), Some(0));
        assert_eq!(m.get_index(&"c".to_string()), Some(2));
    }

    /// Invariant: removing an absent key is a no-op returning `Ok(None)`,
    /// also right after the key was removed (idempotence).
    #[test]
    fn remove_is_idempotent_by_key() {
        let mut m: HashListMap<String, i32> = HashListMap::new();
        m.put("k".to_string(), 7).unwrap();
        assert_eq!(m.remove(&"k".to_string()).unwrap(), Some(7));
        assert_eq!(m.remove(&"k".to_string()).unwrap(), None);
        assert_eq!(m.size(), 0);
        assert_eq!(m.raw_size(), 1);
    }

    /// Invariant: reinsertion after removal appends a fresh slot; the
    /// tombstone stays where it was.
    #[test]
    fn reinsert_after_remove_appends_new_slot() {
        let mut m: HashListMap<String, i32> = HashListMap::new();
        m.put("k".to_string(), 1).unwrap();
        m.remove(&"k".to_string()).unwrap();
        m.put("k".to_string(), 2).unwrap();

        assert_eq!(m.raw_size(), 2);
        assert!(m.is_removed(0));
        assert_eq!(m.get_index(&"k".to_string()), Some(1));
        assert_eq!(m.get(&"k".to_string()), Some(&2));
    }

    /// Invariant: borrowed lookup works (store `String`, query `&str`).
    #[test]
    fn borrowed_lookup_with_str() {
        let mut m: HashListMap<String, i32> = HashListMap::new();
        m.put("hello".to_string(), 1).unwrap();
        assert!(m.find("hello").is_some());
        assert!(m.find("world").is_none());
    }

    /// Invariant: lookups resolve correct entries under forced hash
    /// collisions, exercising probing via `Eq`.
    #[test]
    fn collision_handling_with_const_hasher() {
        #[derive(Clone, Default)]
        struct ZeroBuildHasher;
        struct ZeroHasher;
        impl BuildHasher for ZeroBuildHasher {
            type Hasher = ZeroHasher;
            fn build_hasher(&self) -> Self::Hasher {
                ZeroHasher
            }
        }
        impl Hasher for ZeroHasher {
            fn write(&mut self, _bytes: &[u8]) {}
            fn finish(&self) -> u64 {
                0
            } // force all keys into the same bucket
        }

        let mut m: HashListMap<String, i32, ZeroBuildHasher> =
            HashListMap::with_hasher(ZeroBuildHasher);
        m.put("a".to_string(), 1).unwrap();
        m.put("b".to_string(), 2).unwrap();

        assert_eq!(m.get(&"a".to_string()), Some(&1));
        assert_eq!(m.get(&"b".to_string()), Some(&2));
        assert_eq!(m.remove(&"a".to_string()).unwrap(), Some(1));
        assert_eq!(m.get(&"b".to_string()), Some(&2));
    }

    /// Invariant: `len`/`is_empty` track live slots only; replacement does
    /// not change them, removal and clear do.
    #[test]
    fn len_and_is_empty_behaviors() {
        let mut m: HashListMap<String, i32> = HashListMap::new();
        assert_eq!(m.len(), 0);
        assert!(m.is_empty());

        m.put("a".to_string(), 1).unwrap();
        m.put("b".to_string(), 2).unwrap();
        assert_eq!(m.len(), 2);

        m.put("a".to_string(), 3).unwrap();
        assert_eq!(m.len(), 2, "replacement must not change len");

        m.remove(&"a".to_string()).unwrap();
        assert_eq!(m.len(), 1);
        assert!(!m.is_empty());

        m.clear().unwrap();
        assert_eq!(m.len(), 0);
        assert!(m.is_empty());
    }

    /// Invariant: `clear` resets storage completely and the map remains
    /// usable; fresh slots start at index zero again.
    #[test]
    fn clear_resets_everything() {
        let mut m: HashListMap<String, i32> = HashListMap::new();
        m.put("a".to_string(), 1).unwrap();
        m.remove(&"a".to_string()).unwrap();
        m.put("b".to_string(), 2).unwrap();
        m.clear().unwrap();

        assert_eq!(m.raw_size(), 0);
        assert!(!m.contains_key(&"b".to_string()));

        m.put("c".to_string(), 3).unwrap();
        assert_eq!(m.get_index(&"c".to_string()), Some(0));
    }

    /// Invariant: `set_value_at` replaces in place and returns the
    /// previous value; the slot index is unchanged.
    #[test]
    fn set_value_at_replaces_in_place() {
        let mut m: HashListMap<String, i32> = HashListMap::new();
        m.put("k".to_string(), 1).unwrap();
        let index = m.get_index(&"k".to_string()).unwrap();
        assert_eq!(m.set_value_at(index, 9).unwrap(), 1);
        assert_eq!(m.get_index(&"k".to_string()), Some(index));
        assert_eq!(m.get(&"k".to_string()), Some(&9));
    }

    /// Invariant: `Display` renders `{k=v, ...}` in slot order, skipping
    /// tombstones; an empty map renders `{}`.
    #[test]
    fn display_renders_slot_order() {
        let mut m: HashListMap<String, i32> = HashListMap::new();
        assert_eq!(m.to_string(), "{}");

        m.put("a".to_string(), 1).unwrap();
        m.put("b".to_string(), 2).unwrap();
        m.put("c".to_string(), 3).unwrap();
        assert_eq!(m.to_string(), "{a=1, b=2, c=3}");

        m.remove(&"b".to_string()).unwrap();
        assert_eq!(m.to_string(), "{a=1, c=3}");
    }

    /// Invariant: `Debug` shows live entries only.
    #[test]
    fn debug_skips_tombstones() {
        let mut m: HashListMap<&'static str, i32> = HashListMap::new();
        m.put("a", 1).unwrap();
        m.put("b", 2).unwrap();
        m.remove(&"a").unwrap();
        assert_eq!(format!("{m:?}"), r#"{"b": 2}"#);
    }

    /// Invariant: content equality and hashing are order-independent
    /// across instances, including ones carrying tombstones.
    #[test]
    fn equality_and_hash_ignore_slot_order_and_tombstones() {
        let mut left: HashListMap<String, i32> = HashListMap::new();
        left.put("a".to_string(), 1).unwrap();
        left.put("dead".to_string(), 0).unwrap();
        left.put("b".to_string(), 2).unwrap();
        left.remove(&"dead".to_string()).unwrap();

        let right: HashListMap<String, i32> =
            [("b".to_string(), 2), ("a".to_string(), 1)].into_iter().collect();

        assert_eq!(left, right);
        assert_eq!(right, left);
        assert_eq!(left.map_hash(), right.map_hash());

        let mut different = right.clone_by_pairs();
        different.put("b".to_string(), 3).unwrap();
        assert_ne!(left, different);
    }

    /// Invariant: out-of-range and tombstone reads are contract
    /// violations and panic.
    #[test]
    fn invalid_slot_reads_panic() {
        let mut m: HashListMap<String, i32> = HashListMap::new();
        m.put("a".to_string(), 1).unwrap();
        m.remove(&"a".to_string()).unwrap();

        let out_of_range = catch_unwind(AssertUnwindSafe(|| {
            let _ = m.entry_at(1);
        }));
        assert!(out_of_range.is_err(), "expected out-of-range panic");

        let tombstone = catch_unwind(AssertUnwindSafe(|| {
            let _ = m.value_at(0);
        }));
        assert!(tombstone.is_err(), "expected tombstone read to panic");
    }

    /// Invariant (debug-only): calling back into the map from `Eq` while
    /// a probe is running panics via the reentry flag.
    #[cfg(debug_assertions)]
    #[test]
    fn reentry_from_eq_during_probe_panics() {
        #[derive(Clone, Default)]
        struct ZeroBuildHasher;
        struct ZeroHasher;
        impl BuildHasher for ZeroBuildHasher {
            type Hasher = ZeroHasher;
            fn build_hasher(&self) -> Self::Hasher {
                ZeroHasher
            }
        }
        impl Hasher for ZeroHasher {
            fn write(&mut self, _bytes: &[u8]) {}
            fn finish(&self) -> u64 {
                0
            }
        }

        struct Prober {
            id: u8,
            map: *const HashListMap<Prober, i32, ZeroBuildHasher>,
        }
        impl PartialEq for Prober {
            fn eq(&self, other: &Self) -> bool {
                if self.id == other.id {
                    return true;
                }
                if !other.map.is_null() {
                    // Call back into the map mid-probe.
                    let probe = Prober {
                        id: other.id,
                        map: core::ptr::null(),
                    };
                    unsafe {
                        let _ = (*other.map).find(&probe);
                    }
                }
                false
            }
        }
        impl Eq for Prober {}
        impl Hash for Prober {
            fn hash<H: Hasher>(&self, state: &mut H) {
                self.id.hash(state);
            }
        }

        let mut m: HashListMap<Prober, i32, ZeroBuildHasher> =
            HashListMap::with_hasher(ZeroBuildHasher);
        m.put(
            Prober {
                id: 1,
                map: core::ptr::null(),
            },
            10,
        )
        .unwrap();

        let map_ptr = &m as *const _;
        let query = Prober { id: 2, map: map_ptr };
        let result = catch_unwind(AssertUnwindSafe(|| {
            let _ = m.find(&query);
        }));
        assert!(result.is_err(), "expected reentry to panic in debug builds");
    }

    /// Invariant: `for_each` and view iteration walk live slots in
    /// ascending slot order.
    #[test]
    fn for_each_walks_slot_order() {
        let mut m: HashListMap<String, i32> = HashListMap::new();
        m.put("x".to_string(), 1).unwrap();
        m.put("y".to_string(), 2).unwrap();
        m.put("z".to_string(), 3).unwrap();
        m.remove(&"y".to_string()).unwrap();

        let mut walked = Vec::new();
        m.for_each(|key, value| walked.push((key.clone(), *value)));
        assert_eq!(walked, vec![("x".to_string(), 1), ("z".to_string(), 3)]);

        let keys: Vec<String> = m.keys().iter().cloned().collect();
        assert_eq!(keys, vec!["x".to_string(), "z".to_string()]);
    }

    impl<K: Eq + Hash + Clone, V: Clone, S: BuildHasher + Default> HashListMap<K, V, S> {
        /// Test helper: rebuild a map with the same live pairs.
        fn clone_by_pairs(&self) -> Self {
            let mut pairs = Vec::new();
            self.for_each(|key, value| pairs.push((key.clone(), value.clone())));
            pairs.into_iter().collect()
        }
    }
}
