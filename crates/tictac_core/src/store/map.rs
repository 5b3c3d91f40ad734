//! # Keyed Store
//!
//! A `HashMap` behind its own `parking_lot::RwLock`.
//!
//! ## Design
//!
//! - Single-key operations take the lock for the duration of the call only
//! - Values are returned by clone, never by reference, so no guard escapes
//! - Multi-step critical sections use [`Store::read`] / [`Store::write`]
//!   directly and must follow the lock order documented on `EntityStore`

use std::collections::HashMap;
use std::hash::Hash;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Concurrency-safe keyed collection.
pub struct Store<K, V> {
    data: RwLock<HashMap<K, V>>,
}

impl<K, V> Default for Store<K, V> {
    fn default() -> Self {
        Self {
            data: RwLock::new(HashMap::new()),
        }
    }
}

impl<K, V> Store<K, V>
where
    K: Eq + Hash,
{
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a clone of the value under `key`; `None` means the entity does not exist.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        self.data.read().get(key).cloned()
    }

    /// Returns true if `key` is present.
    #[must_use]
    pub fn contains(&self, key: &K) -> bool {
        self.data.read().contains_key(key)
    }

    /// Inserts or replaces a value, returning the previous one.
    pub fn set(&self, key: K, value: V) -> Option<V> {
        self.data.write().insert(key, value)
    }

    /// Removes a value.
    pub fn delete(&self, key: &K) -> Option<V> {
        self.data.write().remove(key)
    }

    /// Removes `key` only if its current value equals `expected`.
    ///
    /// Used by stale-index cleanup so that a concurrent re-registration is
    /// never clobbered.
    pub fn delete_if(&self, key: &K, expected: &V) -> bool
    where
        V: PartialEq,
    {
        let mut data = self.data.write();
        if data.get(key) == Some(expected) {
            data.remove(key);
            true
        } else {
            false
        }
    }

    /// Mutates a value in place under the write lock.
    pub fn update<R>(&self, key: &K, f: impl FnOnce(&mut V) -> R) -> Option<R> {
        self.data.write().get_mut(key).map(f)
    }

    /// Visits entries under the read lock until `f` returns false.
    pub fn for_each(&self, mut f: impl FnMut(&K, &V) -> bool) {
        for (key, value) in self.data.read().iter() {
            if !f(key, value) {
                break;
            }
        }
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Returns true if the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    /// Shared guard for multi-step reads.
    pub fn read(&self) -> RwLockReadGuard<'_, HashMap<K, V>> {
        self.data.read()
    }

    /// Exclusive guard for multi-step critical sections.
    pub fn write(&self) -> RwLockWriteGuard<'_, HashMap<K, V>> {
        self.data.write()
    }
}
