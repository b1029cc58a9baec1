//! Borrowed views over a parent map: keys, values, and entries.
//!
//! Views own no storage. Every operation re-routes to the parent's slot
//! accessors, so a view observes the parent's live state at call time; no
//! caching, no snapshotting. Read views hold a shared borrow; the `*Mut`
//! variants hold an exclusive borrow and forward mutation to the parent,
//! inheriting its supported/unsupported behavior.

use core::fmt;
use core::hash::{Hash, Hasher};
use core::marker::PhantomData;

use crate::collection::{fmt_collection, ListCollection, ListSet, SlotIter};
use crate::entry::MapEntry;
use crate::map::{hash_of, ListMap, UnsupportedOperation};

/// Set view of a map's keys.
pub struct Keys<'a, K, V, M> {
    map: &'a M,
    _marker: PhantomData<(&'a K, &'a V)>,
}

impl<'a, K, V, M: ListMap<K, V>> Keys<'a, K, V, M> {
    pub(crate) fn new(map: &'a M) -> Self {
        Self {
            map,
            _marker: PhantomData,
        }
    }
}

impl<'a, K, V, M> Clone for Keys<'a, K, V, M> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, K, V, M> Copy for Keys<'a, K, V, M> {}

impl<'a, K, V, M: ListMap<K, V>> ListCollection for Keys<'a, K, V, M> {
    type Item<'b>
        = &'b K
    where
        Self: 'b;

    fn size(&self) -> usize {
        self.map.size()
    }

    fn raw_size(&self) -> usize {
        self.map.raw_size()
    }

    fn is_removed(&self, index: usize) -> bool {
        self.map.is_removed(index)
    }

    fn get_entry_at(&self, index: usize) -> &K {
        self.map.key_at(index)
    }
}

impl<'a, K, V, M: ListMap<K, V>> ListSet for Keys<'a, K, V, M> {
    type Query = K;

    fn get_index(&self, query: &K) -> Option<usize> {
        self.map.get_index(query)
    }
}

impl<'s, 'a, K, V, M: ListMap<K, V>> IntoIterator for &'s Keys<'a, K, V, M> {
    type Item = &'s K;
    type IntoIter = SlotIter<'s, Keys<'a, K, V, M>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Set equality: equal sizes and every member of `other` present here.
impl<'a, 'b, K, V1, V2, M, N> PartialEq<Keys<'b, K, V2, N>> for Keys<'a, K, V1, M>
where
    M: ListMap<K, V1>,
    N: ListMap<K, V2>,
{
    fn eq(&self, other: &Keys<'b, K, V2, N>) -> bool {
        self.size() == other.size() && other.iter().all(|key| self.contains(key))
    }
}

impl<'a, K, V, M> Eq for Keys<'a, K, V, M> where M: ListMap<K, V> {}

/// Set hash: wrapping sum of member hashes, order-independent.
impl<'a, K, V, M> Hash for Keys<'a, K, V, M>
where
    M: ListMap<K, V>,
    K: Hash,
{
    fn hash<H: Hasher>(&self, state: &mut H) {
        let mut sum = 0u64;
        for key in self.iter() {
            sum = sum.wrapping_add(hash_of(key));
        }
        state.write_u64(sum);
    }
}

impl<'a, K, V, M> fmt::Display for Keys<'a, K, V, M>
where
    M: ListMap<K, V>,
    K: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_collection(self, f)
    }
}

impl<'a, K, V, M> fmt::Debug for Keys<'a, K, V, M>
where
    M: ListMap<K, V>,
    K: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// Collection view of a map's values.
pub struct Values<'a, K, V, M> {
    map: &'a M,
    _marker: PhantomData<(&'a K, &'a V)>,
}

impl<'a, K, V, M: ListMap<K, V>> Values<'a, K, V, M> {
    pub(crate) fn new(map: &'a M) -> Self {
        Self {
            map,
            _marker: PhantomData,
        }
    }

    /// Linear scan, like the parent's `contains_value`.
    pub fn contains(&self, value: &V) -> bool
    where
        V: PartialEq,
    {
        self.map.contains_value(value)
    }
}

impl<'a, K, V, M> Clone for Values<'a, K, V, M> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, K, V, M> Copy for Values<'a, K, V, M> {}

impl<'a, K, V, M: ListMap<K, V>> ListCollection for Values<'a, K, V, M> {
    type Item<'b>
        = &'b V
    where
        Self: 'b;

    fn size(&self) -> usize {
        self.map.size()
    }

    fn raw_size(&self) -> usize {
        self.map.raw_size()
    }

    fn is_removed(&self, index: usize) -> bool {
        self.map.is_removed(index)
    }

    fn get_entry_at(&self, index: usize) -> &V {
        self.map.value_at(index)
    }
}

impl<'s, 'a, K, V, M: ListMap<K, V>> IntoIterator for &'s Values<'a, K, V, M> {
    type Item = &'s V;
    type IntoIter = SlotIter<'s, Values<'a, K, V, M>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K, V, M> fmt::Display for Values<'a, K, V, M>
where
    M: ListMap<K, V>,
    V: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_collection(self, f)
    }
}

impl<'a, K, V, M> fmt::Debug for Values<'a, K, V, M>
where
    M: ListMap<K, V>,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

/// Set view of a map's entries, as live projections.
pub struct Entries<'a, K, V, M> {
    map: &'a M,
    _marker: PhantomData<(&'a K, &'a V)>,
}

impl<'a, K, V, M: ListMap<K, V>> Entries<'a, K, V, M> {
    pub(crate) fn new(map: &'a M) -> Self {
        Self {
            map,
            _marker: PhantomData,
        }
    }
}

impl<'a, K, V, M> Clone for Entries<'a, K, V, M> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, K, V, M> Copy for Entries<'a, K, V, M> {}

impl<'a, K, V, M: ListMap<K, V>> ListCollection for Entries<'a, K, V, M> {
    type Item<'b>
        = MapEntry<'b, K, V, M>
    where
        Self: 'b;

    fn size(&self) -> usize {
        self.map.size()
    }

    fn raw_size(&self) -> usize {
        self.map.raw_size()
    }

    fn is_removed(&self, index: usize) -> bool {
        self.map.is_removed(index)
    }

    fn get_entry_at(&self, index: usize) -> MapEntry<'_, K, V, M> {
        self.map.entry_at(index)
    }
}

impl<'a, K, V, M> ListSet for Entries<'a, K, V, M>
where
    M: ListMap<K, V>,
    V: PartialEq,
{
    type Query = (K, V);

    /// Index of the slot holding exactly `(key, value)`. A key match with
    /// a different stored value is not-found. The key lookup
    /// short-circuits before any slot accessor runs.
    fn get_index(&self, query: &(K, V)) -> Option<usize> {
        let index = self.map.get_index(&query.0)?;
        (self.map.value_at(index) == &query.1).then_some(index)
    }
}

impl<'s, 'a, K, V, M: ListMap<K, V>> IntoIterator for &'s Entries<'a, K, V, M> {
    type Item = MapEntry<'s, K, V, M>;
    type IntoIter = SlotIter<'s, Entries<'a, K, V, M>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, 'b, K, V, M, N> PartialEq<Entries<'b, K, V, N>> for Entries<'a, K, V, M>
where
    M: ListMap<K, V>,
    N: ListMap<K, V>,
    V: PartialEq,
{
    fn eq(&self, other: &Entries<'b, K, V, N>) -> bool {
        if self.size() != other.size() {
            return false;
        }
        other.iter().all(|entry| match self.map.get_index(entry.key()) {
            Some(index) => self.map.value_at(index) == entry.value(),
            None => false,
        })
    }
}

impl<'a, K, V, M> Eq for Entries<'a, K, V, M>
where
    M: ListMap<K, V>,
    V: Eq,
{
}

/// The wrapping sum of entry hashes equals the parent's `map_hash`.
impl<'a, K, V, M> Hash for Entries<'a, K, V, M>
where
    M: ListMap<K, V>,
    K: Hash,
    V: Hash,
{
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.map.map_hash());
    }
}

impl<'a, K, V, M> fmt::Display for Entries<'a, K, V, M>
where
    M: ListMap<K, V>,
    K: fmt::Display,
    V: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_collection(self, f)
    }
}

impl<'a, K, V, M> fmt::Debug for Entries<'a, K, V, M>
where
    M: ListMap<K, V>,
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// Exclusive keys view; removal goes through the parent.
pub struct KeysMut<'a, K, V, M> {
    map: &'a mut M,
    _marker: PhantomData<(&'a K, &'a V)>,
}

impl<'a, K, V, M: ListMap<K, V>> KeysMut<'a, K, V, M> {
    pub(crate) fn new(map: &'a mut M) -> Self {
        Self {
            map,
            _marker: PhantomData,
        }
    }

    /// Remove the slot holding `key`. `Ok(false)` when absent, even on
    /// containers that do not support removal.
    pub fn remove(&mut self, key: &K) -> Result<bool, UnsupportedOperation> {
        match self.map.get_index(key) {
            None => Ok(false),
            Some(index) => self.map.remove_at(index).map(|_| true),
        }
    }

    /// Remove the slot at `index`, discarding its value.
    pub fn remove_at(&mut self, index: usize) -> Result<(), UnsupportedOperation> {
        self.map.remove_at(index).map(|_| ())
    }

    pub fn clear(&mut self) -> Result<(), UnsupportedOperation> {
        self.map.clear()
    }
}

impl<'a, K, V, M: ListMap<K, V>> ListCollection for KeysMut<'a, K, V, M> {
    type Item<'b>
        = &'b K
    where
        Self: 'b;

    fn size(&self) -> usize {
        self.map.size()
    }

    fn raw_size(&self) -> usize {
        self.map.raw_size()
    }

    fn is_removed(&self, index: usize) -> bool {
        self.map.is_removed(index)
    }

    fn get_entry_at(&self, index: usize) -> &K {
        self.map.key_at(index)
    }
}

impl<'a, K, V, M: ListMap<K, V>> ListSet for KeysMut<'a, K, V, M> {
    type Query = K;

    fn get_index(&self, query: &K) -> Option<usize> {
        self.map.get_index(query)
    }
}

/// Exclusive values view; removal goes through the parent.
pub struct ValuesMut<'a, K, V, M> {
    map: &'a mut M,
    _marker: PhantomData<(&'a K, &'a V)>,
}

impl<'a, K, V, M: ListMap<K, V>> ValuesMut<'a, K, V, M> {
    pub(crate) fn new(map: &'a mut M) -> Self {
        Self {
            map,
            _marker: PhantomData,
        }
    }

    /// Remove the slot at `index`, discarding its value.
    pub fn remove_at(&mut self, index: usize) -> Result<(), UnsupportedOperation> {
        self.map.remove_at(index).map(|_| ())
    }

    pub fn clear(&mut self) -> Result<(), UnsupportedOperation> {
        self.map.clear()
    }
}

impl<'a, K, V, M: ListMap<K, V>> ListCollection for ValuesMut<'a, K, V, M> {
    type Item<'b>
        = &'b V
    where
        Self: 'b;

    fn size(&self) -> usize {
        self.map.size()
    }

    fn raw_size(&self) -> usize {
        self.map.raw_size()
    }

    fn is_removed(&self, index: usize) -> bool {
        self.map.is_removed(index)
    }

    fn get_entry_at(&self, index: usize) -> &V {
        self.map.value_at(index)
    }
}

/// Exclusive entries view; removal goes through the parent.
pub struct EntriesMut<'a, K, V, M> {
    map: &'a mut M,
    _marker: PhantomData<(&'a K, &'a V)>,
}

impl<'a, K, V, M: ListMap<K, V>> EntriesMut<'a, K, V, M> {
    pub(crate) fn new(map: &'a mut M) -> Self {
        Self {
            map,
            _marker: PhantomData,
        }
    }

    /// Remove the slot holding exactly `(key, value)`. A key match with a
    /// different stored value is a no-op yielding `Ok(false)`.
    pub fn remove(&mut self, query: &(K, V)) -> Result<bool, UnsupportedOperation>
    where
        V: PartialEq,
    {
        let index = match self.map.get_index(&query.0) {
            Some(index) if self.map.value_at(index) == &query.1 => index,
            _ => return Ok(false),
        };
        self.map.remove_at(index).map(|_| true)
    }

    /// Remove the slot at `index`, discarding its value.
    pub fn remove_at(&mut self, index: usize) -> Result<(), UnsupportedOperation> {
        self.map.remove_at(index).map(|_| ())
    }

    pub fn clear(&mut self) -> Result<(), UnsupportedOperation> {
        self.map.clear()
    }
}

impl<'a, K, V, M: ListMap<K, V>> ListCollection for EntriesMut<'a, K, V, M> {
    type Item<'b>
        = MapEntry<'b, K, V, M>
    where
        Self: 'b;

    fn size(&self) -> usize {
        self.map.size()
    }

    fn raw_size(&self) -> usize {
        self.map.raw_size()
    }

    fn is_removed(&self, index: usize) -> bool {
        self.map.is_removed(index)
    }

    fn get_entry_at(&self, index: usize) -> MapEntry<'_, K, V, M> {
        self.map.entry_at(index)
    }
}

impl<'a, K, V, M> ListSet for EntriesMut<'a, K, V, M>
where
    M: ListMap<K, V>,
    V: PartialEq,
{
    type Query = (K, V);

    fn get_index(&self, query: &(K, V)) -> Option<usize> {
        let index = self.map.get_index(&query.0)?;
        (self.map.value_at(index) == &query.1).then_some(index)
    }
}
