//! An unordered set built on [`crate::table::RawTable`] with `V = ()`.

use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::iter::FromIterator;

use crate::error::TableError;
use crate::table::{CoreOutcome, DefaultHashBuilder, HookId, InsertMode, RawTable};

/// A hash set with explicit per-bucket chain metadata, sharing its probing
/// engine with [`crate::map::HashMap`].
pub struct HashSet<T, S = DefaultHashBuilder> {
    table: RawTable<T, (), S>,
}

impl<T> HashSet<T, DefaultHashBuilder> {
    pub fn new() -> Self {
        HashSet {
            table: RawTable::new(),
        }
    }

    pub fn with_capacity(min: usize) -> Self {
        HashSet {
            table: RawTable::with_capacity(min),
        }
    }
}

impl<T> Default for HashSet<T, DefaultHashBuilder> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Hash + Eq, S: BuildHasher> HashSet<T, S> {
    pub fn with_capacity_and_hasher(min: usize, hash_builder: S) -> Self {
        HashSet {
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

    pub fn set_max_load_factor(&mut self, f: f32) -> Result<(), TableError<T>> {
        self.table.set_max_load_factor(f)
    }

    pub fn contains(&self, value: &T) -> bool {
        self.table.contains_key(value)
    }

    /// Inserts `value`, returning `true` if it was not already present.
    pub fn insert(&mut self, value: T) -> Result<bool, TableError<T>> {
        match self.table.insert(value, (), InsertMode::KeepExisting)? {
            CoreOutcome::Added(_) => Ok(true),
            CoreOutcome::KeptExisting(()) => Ok(false),
            CoreOutcome::Replaced(()) => unreachable!("KeepExisting mode never replaces"),
        }
    }

    /// Inserts `value`, raising `DuplicateKey` if it is already present.
    pub fn insert_unique(&mut self, value: T) -> Result<(), TableError<T>> {
        match self.table.insert(value, (), InsertMode::Throw)? {
            CoreOutcome::Added(_) => Ok(()),
            _ => unreachable!("Throw mode either adds or errors"),
        }
    }

    /// Removes `value`, returning `true` if it was present.
    pub fn remove(&mut self, value: &T) -> Result<bool, TableError<T>> {
        Ok(self.table.remove(value)?.is_some())
    }

    pub fn remove_where(&mut self, mut pred: impl FnMut(&T) -> bool) -> Result<usize, TableError<T>>
    where
        T: Clone,
    {
        self.table.remove_where(|k, _| pred(k))
    }

    pub fn clear(&mut self) -> Result<(), TableError<T>> {
        self.table.clear()
    }

    pub fn ensure_capacity(&mut self, min: usize) {
        self.table.ensure_capacity(min)
    }

    /// Iterates `Result<&T, TableError<T>>`; see [`crate::map::HashMap::iter`]
    /// for why a structural-mutation race surfaces as a terminal error
    /// instead of truncating the sequence.
    pub fn iter(&self) -> impl Iterator<Item = Result<&T, TableError<T>>> {
        crate::iter::Iter::new(&self.table).map(|r| r.map(|(k, _)| k))
    }

    pub fn on_added(&mut self, mut hook: impl FnMut(&T) + 'static) -> HookId {
        self.table.on_added(move |k, _| hook(k))
    }

    pub fn on_removed(&mut self, mut hook: impl FnMut(&T) + 'static) -> HookId {
        self.table.on_removed(move |k, _| hook(k))
    }

    pub fn unregister_added(&mut self, id: HookId) {
        self.table.unregister_added(id)
    }

    pub fn unregister_removed(&mut self, id: HookId) {
        self.table.unregister_removed(id)
    }
}

impl<T: Hash + Eq + Clone, S: BuildHasher + Clone> Clone for HashSet<T, S> {
    fn clone(&self) -> Self {
        let mut out =
            HashSet::with_capacity_and_hasher(self.len(), self.table.hash_builder().clone());
        for v in self.iter() {
            let v = v.expect("table cannot be mutated while borrowed by iter()");
            out.insert(v.clone()).expect("fresh set insert cannot fail");
        }
        out
    }
}

impl<T: Hash + Eq + fmt::Debug, S: BuildHasher> fmt::Debug for HashSet<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter().filter_map(|r| r.ok())).finish()
    }
}

impl<T: Hash + Eq> FromIterator<T> for HashSet<T, DefaultHashBuilder> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = HashSet::new();
        set.extend(iter);
        set
    }
}

impl<T: Hash + Eq, S: BuildHasher> Extend<T> for HashSet<T, S> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for v in iter {
            self.insert(v).expect("KeepExisting mode insert never errors");
        }
    }
}
