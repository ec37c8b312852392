//! An insertion-order-agnostic key/value map built on [`crate::table::RawTable`].

use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::iter::FromIterator;

use crate::error::TableError;
use crate::iter::Iter;
use crate::table::{CoreOutcome, DefaultHashBuilder, HookId, InsertMode, RawTable};

/// The result of [`HashMap::insert`]: whether the key was fresh or the
/// value of an existing key was overwritten.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inserted<V> {
    Added,
    Replaced(V),
}

/// The result of [`HashMap::try_insert`]: whether the key was fresh or an
/// existing value was left untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TryInserted<V> {
    Added,
    KeptExisting(V),
}

/// A hash map with explicit per-bucket chain metadata.
///
/// `S` defaults to [`DefaultHashBuilder`], a fixed-key `siphasher`-backed
/// builder; supply a different `BuildHasher` to customize hashing.
/// Equality is always `K: Eq`.
pub struct HashMap<K, V, S = DefaultHashBuilder> {
    table: RawTable<K, V, S>,
}

impl<K, V> HashMap<K, V, DefaultHashBuilder> {
    pub fn new() -> Self {
        HashMap {
            table: RawTable::new(),
        }
    }

    pub fn with_capacity(min: usize) -> Self {
        HashMap {
            table: RawTable::with_capacity(min),
        }
    }
}

impl<K, V> Default for HashMap<K, V, DefaultHashBuilder> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Hash + Eq, V, S: BuildHasher> HashMap<K, V, S> {
    pub fn with_capacity_and_hasher(min: usize, hash_builder: S) -> Self {
        HashMap {
            table: RawTable::with_capacity_and_hasher(min, hash_builder),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    pub fn set_max_load_factor(&mut self, f: f32) -> Result<(), TableError<K>> {
        self.table.set_max_load_factor(f)
    }

    #[cfg(debug_assertions)]
    pub fn excessive_resizes(&self) -> u64 {
        self.table.excessive_resizes()
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.table.contains_key(key)
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.table.get(key)
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        self.table.get_mut(key)
    }

    /// Strict lookup: returns `KeyNotFound` instead of `None` on a miss.
    pub fn get_checked(&self, key: &K) -> Result<&V, TableError<K>> {
        self.table.get_checked(key)
    }

    /// Returns the value for `key`, computing and inserting it via `init`
    /// if absent. Requires `K: Clone` since the table may need to retain
    /// its own copy of the key independent of the caller's.
    pub fn get_or_insert_with(
        &mut self,
        key: K,
        init: impl FnOnce() -> V,
    ) -> Result<&mut V, TableError<K>>
    where
        K: Clone,
    {
        self.table.get_or_insert_with(key, init)
    }

    /// Inserts `key`/`value`, overwriting and returning any previous value.
    pub fn insert(&mut self, key: K, value: V) -> Result<Inserted<V>, TableError<K>> {
        match self.table.insert(key, value, InsertMode::Replace)? {
            CoreOutcome::Added(_) => Ok(Inserted::Added),
            CoreOutcome::Replaced(old) => Ok(Inserted::Replaced(old)),
            CoreOutcome::KeptExisting(_) => unreachable!("Replace mode never keeps existing"),
        }
    }

    /// Inserts `key`/`value` only if `key` is absent; otherwise returns the
    /// value the caller supplied, untouched.
    pub fn try_insert(&mut self, key: K, value: V) -> Result<TryInserted<V>, TableError<K>> {
        match self.table.insert(key, value, InsertMode::KeepExisting)? {
            CoreOutcome::Added(_) => Ok(TryInserted::Added),
            CoreOutcome::KeptExisting(v) => Ok(TryInserted::KeptExisting(v)),
            CoreOutcome::Replaced(_) => unreachable!("KeepExisting mode never replaces"),
        }
    }

    /// Inserts `key`/`value`, raising `DuplicateKey` if `key` is already
    /// present rather than silently overwriting or discarding.
    pub fn insert_unique(&mut self, key: K, value: V) -> Result<(), TableError<K>> {
        match self.table.insert(key, value, InsertMode::Throw)? {
            CoreOutcome::Added(_) => Ok(()),
            _ => unreachable!("Throw mode either adds or errors"),
        }
    }

    pub fn remove(&mut self, key: &K) -> Result<Option<V>, TableError<K>> {
        Ok(self.table.remove(key)?.map(|(_, v)| v))
    }

    pub fn remove_where(
        &mut self,
        pred: impl FnMut(&K, &V) -> bool,
    ) -> Result<usize, TableError<K>>
    where
        K: Clone,
    {
        self.table.remove_where(pred)
    }

    pub fn clear(&mut self) -> Result<(), TableError<K>> {
        self.table.clear()
    }

    pub fn ensure_capacity(&mut self, min: usize) {
        self.table.ensure_capacity(min)
    }

    /// Iterates `Result<(&K, &V), TableError<K>>` pairs. A structural
    /// mutation racing the walk (only reachable from within a hook
    /// callback, since an ordinary borrow-checked mutation cannot
    /// coexist with a live iterator) surfaces as a terminal
    /// `Err(ConcurrentModification)` rather than truncating silently.
    pub fn iter(&self) -> Iter<'_, K, V, S> {
        Iter::new(&self.table)
    }

    pub fn keys(&self) -> impl Iterator<Item = Result<&K, TableError<K>>> {
        self.iter().map(|r| r.map(|(k, _)| k))
    }

    pub fn values(&self) -> impl Iterator<Item = Result<&V, TableError<K>>> {
        self.iter().map(|r| r.map(|(_, v)| v))
    }

    /// Registers a hook fired after every user-visible insert that adds a
    /// fresh key (not on replace-in-place of an existing key, and not
    /// during internal re-emplacement).
    pub fn on_added(&mut self, hook: impl FnMut(&K, &V) + 'static) -> HookId {
        self.table.on_added(hook)
    }

    /// Registers a hook fired after every successful removal.
    pub fn on_removed(&mut self, hook: impl FnMut(&K, &V) + 'static) -> HookId {
        self.table.on_removed(hook)
    }

    pub fn unregister_added(&mut self, id: HookId) {
        self.table.unregister_added(id)
    }

    pub fn unregister_removed(&mut self, id: HookId) {
        self.table.unregister_removed(id)
    }
}

impl<K: Hash + Eq + Clone, V: Clone, S: BuildHasher + Clone> Clone for HashMap<K, V, S> {
    fn clone(&self) -> Self {
        let mut out =
            HashMap::with_capacity_and_hasher(self.len(), self.table.hash_builder().clone());
        for entry in self.iter() {
            let (k, v) = match entry {
                Ok(pair) => pair,
                Err(_) => unreachable!("table cannot be mutated while borrowed by iter()"),
            };
            let outcome = out.insert(k.clone(), v.clone());
            debug_assert!(outcome.is_ok(), "fresh map insert cannot fail");
        }
        out
    }
}

impl<K: Hash + Eq + fmt::Debug, V: fmt::Debug, S: BuildHasher> fmt::Debug for HashMap<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.iter().filter_map(|r| r.ok()))
            .finish()
    }
}

impl<K: Hash + Eq, V> FromIterator<(K, V)> for HashMap<K, V, DefaultHashBuilder> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = HashMap::new();
        map.extend(iter);
        map
    }
}

impl<K: Hash + Eq, V, S: BuildHasher> Extend<(K, V)> for HashMap<K, V, S> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            let outcome = self.insert(k, v);
            debug_assert!(outcome.is_ok(), "Replace mode insert never errors");
        }
    }
}
