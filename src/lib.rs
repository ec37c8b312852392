#![doc = include_str!("../README.md")]

pub mod error;
pub mod indexed;
pub mod iter;
pub mod map;
mod nibble;
pub mod set;
pub mod table;
mod tails;

pub use error::TableError;
pub use indexed::{IndexedBiMap, IndexedSet};
pub use map::{HashMap, Inserted, TryInserted};
pub use set::HashSet;
pub use table::{DefaultHashBuilder, HookId, InsertMode};
