//! Concurrent ordered set with lock-free reads and per-node locked writes.
//!
//! ```rust
//! use lazyset_core::{DeferredGuard, LazyList};
//!
//! let set: LazyList<i64, DeferredGuard> = LazyList::new();
//! assert!(set.insert(5));
//! assert!(set.insert(3));
//! assert!(!set.insert(5));
//! assert_eq!(set.to_vec(), vec![3, 5]);
//! assert!(set.delete(&3));
//! assert!(!set.contains(&3));
//! assert_eq!(set.len(), 1);
//! ```

pub mod common_tests;
pub mod data_structures;
pub mod error;
pub mod guard;

pub use data_structures::{LazyList, LazyListIter};
pub use error::ChainViolation;
pub use guard::{DeferredGuard, Guard};
