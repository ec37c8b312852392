//! Version-checked iteration over a [`crate::table::RawTable`].
//!
//! `Enumerator` takes the table fresh on every `next()` call instead of
//! borrowing it for the enumerator's lifetime. That makes the
//! concurrent-modification check (`ConcurrentModification`) an honest
//! runtime guard rather than something the borrow checker already forbids:
//! the caller can, between calls, do anything it likes with the table so
//! long as it hands the *same* table back in, and a version mismatch is
//! reported rather than silently producing stale or skipped entries.

use crate::error::TableError;
use crate::table::RawTable;

/// A low-level cursor over a table's occupied slots. Re-checks the
/// table's version against the version recorded at construction on every
/// `next()` call.
pub struct Enumerator {
    version: u64,
    next_slot: usize,
}

impl Enumerator {
    pub(crate) fn new<K, V, S>(table: &RawTable<K, V, S>) -> Self
    where
        K: std::hash::Hash + Eq,
        S: std::hash::BuildHasher,
    {
        Enumerator {
            version: table.version(),
            next_slot: 0,
        }
    }

    /// Advances the cursor and returns the next occupied slot's contents,
    /// or `None` once every slot has been visited.
    ///
    /// # Errors
    /// Returns `ConcurrentModification` if `table`'s version no longer
    /// matches the version recorded when the enumerator was created.
    pub(crate) fn next<'a, K, V, S>(
        &mut self,
        table: &'a RawTable<K, V, S>,
    ) -> Result<Option<(&'a K, &'a V)>, TableError<K>>
    where
        K: std::hash::Hash + Eq,
        S: std::hash::BuildHasher,
    {
        if table.version() != self.version {
            return Err(TableError::ConcurrentModification);
        }
        let slots = table.slots();
        while self.next_slot < slots.len() {
            let idx = self.next_slot;
            self.next_slot += 1;
            if let Some((k, v)) = &slots[idx] {
                return Ok(Some((k, v)));
            }
        }
        Ok(None)
    }
}

/// An ergonomic [`Iterator`] over a table's entries, built on [`Enumerator`].
///
/// Yields `Result<(&K, &V), TableError<K>>` rather than a bare pair: a
/// structural mutation racing the iteration (most plausibly a table
/// mutation triggered from inside a hook callback while this iterator's
/// underlying table is being walked) must surface as `Err(ConcurrentModification)`
/// rather than silently truncating the sequence. Once an error is
/// yielded the iterator is exhausted; it never retries.
pub struct Iter<'a, K, V, S> {
    table: &'a RawTable<K, V, S>,
    inner: Enumerator,
    poisoned: bool,
}

impl<'a, K, V, S> Iter<'a, K, V, S>
where
    K: std::hash::Hash + Eq,
    S: std::hash::BuildHasher,
{
    pub(crate) fn new(table: &'a RawTable<K, V, S>) -> Self {
        Iter {
            inner: Enumerator::new(table),
            table,
            poisoned: false,
        }
    }
}

impl<'a, K, V, S> Iterator for Iter<'a, K, V, S>
where
    K: std::hash::Hash + Eq,
    S: std::hash::BuildHasher,
{
    type Item = Result<(&'a K, &'a V), TableError<K>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.poisoned {
            return None;
        }
        match self.inner.next(self.table) {
            Ok(Some(item)) => Some(Ok(item)),
            Ok(None) => None,
            Err(e) => {
                self.poisoned = true;
                Some(Err(e))
            }
        }
    }
}
