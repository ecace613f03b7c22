//! Sorted set implementations.
//!
//! Collections are parameterized by a guard type `G: Guard` that determines
//! the memory reclamation strategy:
//!
//! - `DeferredGuard`: Testing - defers destruction until the list drops
//! - `EpochGuard`: Production - epoch-based reclamation (lazyset-crossbeam)

pub mod lazy_list;
pub mod lazy_list_iter;

pub use lazy_list::LazyList;
pub use lazy_list_iter::LazyListIter;
