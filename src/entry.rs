//! Live entry projections over a parent map's slots.
//!
//! An entry wraps `(parent, index)` and re-reads the parent's current slot
//! state on every access; it never snapshots. Equality and hashing are
//! structural over the current key/value, so entries from different parents
//! compare equal when their content does.

use core::fmt;
use core::hash::{Hash, Hasher};
use core::marker::PhantomData;

use crate::map::{entry_hash, ListMap, UnsupportedOperation};

/// Read projection of the slot at `index`.
pub struct MapEntry<'a, K, V, M> {
    map: &'a M,
    index: usize,
    _marker: PhantomData<(&'a K, &'a V)>,
}

impl<'a, K, V, M: ListMap<K, V>> MapEntry<'a, K, V, M> {
    pub(crate) fn new(map: &'a M, index: usize) -> Self {
        Self {
            map,
            index,
            _marker: PhantomData,
        }
    }

    /// Slot index this entry projects.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn key(&self) -> &'a K {
        self.map.key_at(self.index)
    }

    pub fn value(&self) -> &'a V {
        self.map.value_at(self.index)
    }
}

impl<'a, K, V, M> Clone for MapEntry<'a, K, V, M> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, K, V, M> Copy for MapEntry<'a, K, V, M> {}

impl<'a, 'b, K, V, M, N> PartialEq<MapEntry<'b, K, V, N>> for MapEntry<'a, K, V, M>
where
    M: ListMap<K, V>,
    N: ListMap<K, V>,
    K: PartialEq,
    V: PartialEq,
{
    fn eq(&self, other: &MapEntry<'b, K, V, N>) -> bool {
        self.key() == other.key() && self.value() == other.value()
    }
}

impl<'a, K, V, M> Eq for MapEntry<'a, K, V, M>
where
    M: ListMap<K, V>,
    K: Eq,
    V: Eq,
{
}

impl<'a, K, V, M> Hash for MapEntry<'a, K, V, M>
where
    M: ListMap<K, V>,
    K: Hash,
    V: Hash,
{
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(entry_hash(self.key(), self.value()));
    }
}

impl<'a, K, V, M> fmt::Display for MapEntry<'a, K, V, M>
where
    M: ListMap<K, V>,
    K: fmt::Display,
    V: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key(), self.value())
    }
}

impl<'a, K, V, M> fmt::Debug for MapEntry<'a, K, V, M>
where
    M: ListMap<K, V>,
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}={:?}", self.key(), self.value())
    }
}

/// Exclusive projection of the slot at `index`; adds value replacement.
pub struct MapEntryMut<'a, K, V, M> {
    map: &'a mut M,
    index: usize,
    _marker: PhantomData<(&'a K, &'a V)>,
}

impl<'a, K, V, M: ListMap<K, V>> MapEntryMut<'a, K, V, M> {
    pub(crate) fn new(map: &'a mut M, index: usize) -> Self {
        Self {
            map,
            index,
            _marker: PhantomData,
        }
    }

    /// Slot index this entry projects.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn key(&self) -> &K {
        self.map.key_at(self.index)
    }

    pub fn value(&self) -> &V {
        self.map.value_at(self.index)
    }

    /// Replace the slot's value through the parent, returning the
    /// previous value. Fails when the parent does not support value
    /// replacement.
    pub fn set_value(&mut self, value: V) -> Result<V, UnsupportedOperation> {
        self.map.set_value_at(self.index, value)
    }
}
