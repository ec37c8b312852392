//! Dense, swap-remove-backed collaborators layered on [`crate::map::HashMap`].
//!
//! Neither type reaches into [`crate::table::RawTable`] directly; both are
//! built entirely from the map's public insert/get/remove surface rather
//! than sharing its internals.

use std::hash::Hash;

use crate::error::TableError;
use crate::map::HashMap;

/// A set that additionally remembers insertion order and supports
/// constant-time indexed access, at the cost of swap-remove semantics: the
/// last element moves into a removed slot rather than the remainder
/// shifting down.
pub struct IndexedSet<T> {
    items: Vec<T>,
    index_of: HashMap<T, usize>,
}

impl<T: Hash + Eq + Clone> IndexedSet<T> {
    pub fn new() -> Self {
        IndexedSet {
            items: Vec::new(),
            index_of: HashMap::new(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, value: &T) -> bool {
        self.index_of.contains_key(value)
    }

    pub fn index_of(&self, value: &T) -> Option<usize> {
        self.index_of.get(value).copied()
    }

    pub fn get_index(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    /// Appends `value` if absent, returning its index either way.
    pub fn insert(&mut self, value: T) -> Result<usize, TableError<T>> {
        if let Some(&i) = self.index_of.get(&value) {
            return Ok(i);
        }
        let i = self.items.len();
        self.items.push(value.clone());
        self.index_of.insert_unique(value, i)?;
        Ok(i)
    }

    /// Removes `value` via swap-remove: the last element takes its slot and
    /// its index entry is updated. Returns `true` if `value` was present.
    pub fn remove(&mut self, value: &T) -> Result<bool, TableError<T>> {
        match self.index_of.remove(value)? {
            Some(i) => {
                self.swap_remove_at(i);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Removes the element at `index` via swap-remove, returning it.
    pub fn swap_remove_index(&mut self, index: usize) -> Option<T> {
        if index >= self.items.len() {
            return None;
        }
        let removed = self.swap_remove_at(index);
        self.index_of
            .remove(&removed)
            .expect("removed element must have had an index entry");
        Some(removed)
    }

    fn swap_remove_at(&mut self, index: usize) -> T {
        let removed = self.items.swap_remove(index);
        if let Some(moved) = self.items.get(index) {
            self.index_of
                .insert(moved.clone(), index)
                .expect("index update for swapped element cannot fail");
        }
        removed
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }
}

impl<T: Hash + Eq + Clone> Default for IndexedSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// A bijective map between `X` and `Y`, indexed by a shared dense sequence
/// of `(X, Y)` pairs. Both sides are unique; removing via either key
/// swap-removes the underlying pair.
pub struct IndexedBiMap<X, Y> {
    pairs: Vec<(X, Y)>,
    left_index: HashMap<X, usize>,
    right_index: HashMap<Y, usize>,
}

impl<X: Hash + Eq + Clone, Y: Hash + Eq + Clone> IndexedBiMap<X, Y> {
    pub fn new() -> Self {
        IndexedBiMap {
            pairs: Vec::new(),
            left_index: HashMap::new(),
            right_index: HashMap::new(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn get_by_left(&self, x: &X) -> Option<&Y> {
        let i = *self.left_index.get(x)?;
        Some(&self.pairs[i].1)
    }

    pub fn get_by_right(&self, y: &Y) -> Option<&X> {
        let i = *self.right_index.get(y)?;
        Some(&self.pairs[i].0)
    }

    /// Inserts the pair `(x, y)`, raising `DuplicateKey` if either side is
    /// already bound to a different partner.
    pub fn insert(&mut self, x: X, y: Y) -> Result<(), TableError<X>> {
        if self.left_index.contains_key(&x) {
            return Err(TableError::DuplicateKey(x));
        }
        if self.right_index.contains_key(&y) {
            return Err(TableError::InvalidArgument(
                "right-hand key already bound to a different pair",
            ));
        }
        let i = self.pairs.len();
        self.pairs.push((x.clone(), y.clone()));
        self.left_index
            .insert_unique(x, i)
            .map_err(|_| TableError::InternalInvariant("left index out of sync"))?;
        self.right_index
            .insert_unique(y, i)
            .map_err(|_| TableError::InternalInvariant("right index out of sync"))?;
        Ok(())
    }

    pub fn remove_by_left(&mut self, x: &X) -> Option<(X, Y)> {
        let i = self.left_index.remove(x).ok().flatten()?;
        Some(self.swap_remove_at(i))
    }

    pub fn remove_by_right(&mut self, y: &Y) -> Option<(X, Y)> {
        let i = self.right_index.remove(y).ok().flatten()?;
        Some(self.swap_remove_at(i))
    }

    fn swap_remove_at(&mut self, index: usize) -> (X, Y) {
        let removed = self.pairs.swap_remove(index);
        self.left_index
            .remove(&removed.0)
            .expect("removed pair must have had a left index entry");
        self.right_index
            .remove(&removed.1)
            .expect("removed pair must have had a right index entry");
        if let Some((moved_x, moved_y)) = self.pairs.get(index) {
            self.left_index
                .insert(moved_x.clone(), index)
                .expect("left index update for swapped pair cannot fail");
            self.right_index
                .insert(moved_y.clone(), index)
                .expect("right index update for swapped pair cannot fail");
        }
        removed
    }

    pub fn iter(&self) -> std::slice::Iter<'_, (X, Y)> {
        self.pairs.iter()
    }
}

impl<X: Hash + Eq + Clone, Y: Hash + Eq + Clone> Default for IndexedBiMap<X, Y> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indexed_set_assigns_stable_indices_until_removal() {
        let mut s = IndexedSet::new();
        assert_eq!(s.insert("a").unwrap(), 0);
        assert_eq!(s.insert("b").unwrap(), 1);
        assert_eq!(s.insert("a").unwrap(), 0);
        assert_eq!(s.len(), 2);
        assert_eq!(s.get_index(1), Some(&"b"));
    }

    #[test]
    fn indexed_set_swap_remove_updates_moved_element() {
        let mut s = IndexedSet::new();
        for v in ["a", "b", "c"] {
            s.insert(v).unwrap();
        }
        assert!(s.remove(&"a").unwrap());
        assert_eq!(s.len(), 2);
        // "c" was the last element and should have moved into slot 0.
        assert_eq!(s.get_index(0), Some(&"c"));
        assert_eq!(s.index_of(&"c"), Some(0));
        assert!(!s.contains(&"a"));
    }

    #[test]
    fn indexed_set_swap_remove_index_returns_value() {
        let mut s = IndexedSet::new();
        for v in [10, 20, 30] {
            s.insert(v).unwrap();
        }
        assert_eq!(s.swap_remove_index(0), Some(10));
        assert_eq!(s.len(), 2);
        assert!(!s.contains(&10));
    }

    #[test]
    fn bimap_looks_up_both_directions() {
        let mut m = IndexedBiMap::new();
        m.insert(1, "a").unwrap();
        m.insert(2, "b").unwrap();
        assert_eq!(m.get_by_left(&1), Some(&"a"));
        assert_eq!(m.get_by_right(&"b"), Some(&2));
    }

    #[test]
    fn bimap_rejects_reused_right_key() {
        let mut m = IndexedBiMap::new();
        m.insert(1, "a").unwrap();
        assert!(m.insert(2, "a").is_err());
    }

    #[test]
    fn bimap_remove_by_either_side_is_consistent() {
        let mut m = IndexedBiMap::new();
        m.insert(1, "a").unwrap();
        m.insert(2, "b").unwrap();
        m.insert(3, "c").unwrap();
        assert_eq!(m.remove_by_left(&1), Some((1, "a")));
        assert_eq!(m.len(), 2);
        assert_eq!(m.get_by_right(&"c"), Some(&3));
        assert_eq!(m.remove_by_right(&"c"), Some((3, "c")));
        assert_eq!(m.len(), 1);
        assert!(m.get_by_left(&3).is_none());
    }
}
