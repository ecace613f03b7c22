//! Data structures for concurrent collections.
//!
//! # Organization
//!
//! - [`sorted`] - Sorted sets (LazyList)
//! - `internal` - Node representation (pub(crate))

pub(crate) mod internal;
pub mod sorted;

pub use sorted::{LazyList, LazyListIter};
