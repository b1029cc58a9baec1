//! The abstract map contract over slot-indexed storage.
//!
//! A concrete container implements the four required primitives (plus
//! whichever optional ones it supports); every other map operation is a
//! provided method defined purely in terms of those primitives.

use core::fmt;
use core::hash::{Hash, Hasher};
use std::collections::hash_map::DefaultHasher;

use crate::collection::check_slot_index;
use crate::entry::{MapEntry, MapEntryMut};
use crate::views::{Entries, EntriesMut, Keys, KeysMut, Values, ValuesMut};

/// Error returned by a mutating operation the container does not support.
///
/// Carries a description identifying the rejecting container. This failure
/// is deliberate and permanent; callers must not retry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsupportedOperation {
    container: &'static str,
}

impl UnsupportedOperation {
    pub(crate) fn of<M: ?Sized>() -> Self {
        Self {
            container: core::any::type_name::<M>(),
        }
    }

    /// Description of the container that rejected the operation.
    pub fn container(&self) -> &str {
        self.container
    }
}

impl fmt::Display for UnsupportedOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "modification not supported: {}", self.container)
    }
}

impl std::error::Error for UnsupportedOperation {}

/// Deterministic 64-bit hash of one element. `DefaultHasher` has fixed
/// keys, so equal content hashes identically across container instances.
pub(crate) fn hash_of<T: Hash + ?Sized>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Per-entry hash: `hash(key) ^ hash(value)`. [`ListMap::map_hash`] sums
/// these (wrapping) across live slots; the sum is order-independent, so
/// equal maps hash identically regardless of slot order. This is the
/// general map-hashing convention and must not change.
pub(crate) fn entry_hash<K: Hash, V: Hash>(key: &K, value: &V) -> u64 {
    hash_of(key) ^ hash_of(value)
}

/// Map contract over flat slot storage.
///
/// Required primitives: [`size`](ListMap::size), [`get_index`](ListMap::get_index),
/// [`key_at`](ListMap::key_at), [`value_at`](ListMap::value_at). Containers
/// with tombstones additionally override [`raw_size`](ListMap::raw_size) and
/// [`is_removed`](ListMap::is_removed). Mutable containers override the
/// mutation primitives, which otherwise return [`UnsupportedOperation`].
///
/// `key_at`/`value_at` are defined only for live slots below `raw_size()`.
pub trait ListMap<K, V> {
    /// Number of live (non-removed) slots.
    fn size(&self) -> usize;

    /// Slot index holding `key`, or `None` when absent. Never resolves to
    /// a tombstone.
    fn get_index(&self, key: &K) -> Option<usize>;

    /// Key stored at `index`.
    fn key_at(&self, index: usize) -> &K;

    /// Value stored at `index`.
    fn value_at(&self, index: usize) -> &V;

    /// Number of slots ever allocated, tombstones included.
    fn raw_size(&self) -> usize {
        self.size()
    }

    /// Whether the slot at `index` is a tombstone.
    fn is_removed(&self, index: usize) -> bool {
        let _ = index;
        false
    }

    /// Insert or replace, returning the previous value for the key.
    fn put(&mut self, key: K, value: V) -> Result<Option<V>, UnsupportedOperation> {
        let _ = (key, value);
        Err(UnsupportedOperation::of::<Self>())
    }

    /// Turn the slot at `index` into a tombstone, returning its value.
    fn remove_at(&mut self, index: usize) -> Result<V, UnsupportedOperation> {
        let _ = index;
        Err(UnsupportedOperation::of::<Self>())
    }

    /// Replace the value at `index`, returning the previous value.
    fn set_value_at(&mut self, index: usize, value: V) -> Result<V, UnsupportedOperation> {
        let _ = (index, value);
        Err(UnsupportedOperation::of::<Self>())
    }

    /// Remove every slot.
    fn clear(&mut self) -> Result<(), UnsupportedOperation> {
        Err(UnsupportedOperation::of::<Self>())
    }

    fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Value for `key`, or `None` when absent.
    fn get(&self, key: &K) -> Option<&V> {
        self.get_index(key).map(|index| self.value_at(index))
    }

    /// Value for `key`, or `default` when absent.
    fn get_or_default<'a>(&'a self, key: &K, default: &'a V) -> &'a V {
        match self.get_index(key) {
            Some(index) => self.value_at(index),
            None => default,
        }
    }

    /// Presence is decided on the resolved index, never by comparing
    /// values, so this stays correct when the stored value is itself some
    /// "empty" value (e.g. `V = Option<T>` holding `None`).
    fn contains_key(&self, key: &K) -> bool {
        self.get_index(key).is_some()
    }

    /// Linear scan over live slots.
    fn contains_value(&self, value: &V) -> bool
    where
        V: PartialEq,
    {
        for index in 0..self.raw_size() {
            if !self.is_removed(index) && self.value_at(index) == value {
                return true;
            }
        }
        false
    }

    /// Visits live entries in ascending slot order.
    fn for_each<F: FnMut(&K, &V)>(&self, mut action: F) {
        for index in 0..self.raw_size() {
            if !self.is_removed(index) {
                action(self.key_at(index), self.value_at(index));
            }
        }
    }

    /// Live projection of the slot at `index`, re-reading the parent on
    /// every access. Panics unless `index < raw_size()`.
    fn entry_at(&self, index: usize) -> MapEntry<'_, K, V, Self>
    where
        Self: Sized,
    {
        check_slot_index(index, self.raw_size());
        MapEntry::new(self, index)
    }

    /// Exclusive projection of the slot at `index`; adds value
    /// replacement. Panics unless `index < raw_size()`.
    fn entry_at_mut(&mut self, index: usize) -> MapEntryMut<'_, K, V, Self>
    where
        Self: Sized,
    {
        check_slot_index(index, self.raw_size());
        MapEntryMut::new(self, index)
    }

    /// Remove by key. An absent key is a no-op yielding `Ok(None)`, even
    /// on containers that do not support removal.
    fn remove(&mut self, key: &K) -> Result<Option<V>, UnsupportedOperation> {
        match self.get_index(key) {
            None => Ok(None),
            Some(index) => self.remove_at(index).map(Some),
        }
    }

    /// `put` every live entry of `other` into this map, stopping at the
    /// first failure. Inherits `put`'s support behavior.
    fn put_all<M>(&mut self, other: &M) -> Result<(), UnsupportedOperation>
    where
        M: ListMap<K, V>,
        K: Clone,
        V: Clone,
    {
        for index in 0..other.raw_size() {
            if !other.is_removed(index) {
                self.put(other.key_at(index).clone(), other.value_at(index).clone())?;
            }
        }
        Ok(())
    }

    fn keys(&self) -> Keys<'_, K, V, Self>
    where
        Self: Sized,
    {
        Keys::new(self)
    }

    fn values(&self) -> Values<'_, K, V, Self>
    where
        Self: Sized,
    {
        Values::new(self)
    }

    fn entries(&self) -> Entries<'_, K, V, Self>
    where
        Self: Sized,
    {
        Entries::new(self)
    }

    fn keys_mut(&mut self) -> KeysMut<'_, K, V, Self>
    where
        Self: Sized,
    {
        KeysMut::new(self)
    }

    fn values_mut(&mut self) -> ValuesMut<'_, K, V, Self>
    where
        Self: Sized,
    {
        ValuesMut::new(self)
    }

    fn entries_mut(&mut self) -> EntriesMut<'_, K, V, Self>
    where
        Self: Sized,
    {
        EntriesMut::new(self)
    }

    /// Content equality with any other slot-indexed map: equal sizes, and
    /// every live entry of `other` resolves through this map's
    /// `get_index` to an equal value.
    fn map_eq<M>(&self, other: &M) -> bool
    where
        M: ListMap<K, V>,
        V: PartialEq,
    {
        if self.size() != other.size() {
            return false;
        }
        for index in 0..other.raw_size() {
            if other.is_removed(index) {
                continue;
            }
            match self.get_index(other.key_at(index)) {
                None => return false,
                Some(own) => {
                    if self.value_at(own) != other.value_at(index) {
                        return false;
                    }
                }
            }
        }
        true
    }

    /// Order-independent content hash; see [`entry_hash`]. Equal maps
    /// produce equal hashes regardless of slot order.
    fn map_hash(&self) -> u64
    where
        K: Hash,
        V: Hash,
    {
        let mut hash = 0u64;
        for index in 0..self.raw_size() {
            if !self.is_removed(index) {
                hash = hash.wrapping_add(entry_hash(self.key_at(index), self.value_at(index)));
            }
        }
        hash
    }

    /// Renders `{k1=v1, k2=v2}` over live slots in slot order; `{}` when
    /// empty. Concrete containers wire this into their `Display` impl.
    fn fmt_map(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    where
        K: fmt::Display,
        V: fmt::Display,
    {
        f.write_str("{")?;
        let mut first = true;
        for index in 0..self.raw_size() {
            if self.is_removed(index) {
                continue;
            }
            if !first {
                f.write_str(", ")?;
            }
            first = false;
            write!(f, "{}={}", self.key_at(index), self.value_at(index))?;
        }
        f.write_str("}")
    }
}
