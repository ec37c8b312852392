//! Error types surfaced by the table, map, set, and indexed collaborators.

use std::fmt;

use thiserror::Error;

/// Errors produced by table operations.
///
/// None of these are swallowed internally: every fallible path in
/// [`crate::table`], [`crate::map`], and [`crate::set`] returns one of
/// these variants rather than silently discarding the condition.
///
/// `Debug` is implemented by hand rather than derived so that
/// `TableError<K>: Debug` holds regardless of whether `K` is `Debug`
/// itself (a derive would add a `K: Debug` bound to the impl, which
/// would then have to be threaded through every generic function that
/// calls `.expect()`/`.unwrap()` on a `Result<_, TableError<K>>`).
#[derive(Error, Clone, PartialEq, Eq)]
pub enum TableError<K> {
    /// A strict (`Throw`-mode) insert was attempted for a key already
    /// present in the table.
    #[error("duplicate key on strict insert")]
    DuplicateKey(K),

    /// A strict lookup found no entry for the given key.
    #[error("key not found")]
    KeyNotFound,

    /// A type-erased facade was asked to operate as the wrong concrete
    /// type.
    #[error("operation attempted on wrong dynamic type")]
    TypeMismatch,

    /// A live iterator observed a structural mutation between two
    /// `next()` calls.
    #[error("concurrent modification: table was mutated during iteration")]
    ConcurrentModification,

    /// An internal invariant was violated; this indicates a bug in the
    /// table implementation itself rather than caller misuse.
    #[error("internal invariant violated: {0}")]
    InternalInvariant(&'static str),

    /// A configuration value was out of its valid range, e.g. a load
    /// factor outside `(0, 1]`.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
}

impl<K> fmt::Debug for TableError<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableError::DuplicateKey(_) => f.write_str("DuplicateKey(..)"),
            TableError::KeyNotFound => f.write_str("KeyNotFound"),
            TableError::TypeMismatch => f.write_str("TypeMismatch"),
            TableError::ConcurrentModification => f.write_str("ConcurrentModification"),
            TableError::InternalInvariant(msg) => write!(f, "InternalInvariant({msg:?})"),
            TableError::InvalidArgument(msg) => write!(f, "InvalidArgument({msg:?})"),
        }
    }
}

pub type Result<T, K> = std::result::Result<T, TableError<K>>;
