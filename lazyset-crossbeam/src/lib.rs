//! Crossbeam-based reclamation for lazyset collections.
//!
//! This crate provides `EpochGuard`, an implementation of the `Guard` trait
//! using crossbeam-epoch for memory reclamation.
//!
//! # Usage
//!
//! ```
//! use lazyset_core::LazyList;
//! use lazyset_crossbeam::EpochGuard;
//!
//! let set: LazyList<i64, EpochGuard> = LazyList::new();
//! set.insert(42);
//! assert!(set.contains(&42));
//! ```
//!
//! Retired nodes are freed by the global collector, possibly after the list
//! itself is gone, so keys must be `'static`. A key borrowing a local is
//! rejected:
//!
//! ```compile_fail
//! use lazyset_core::LazyList;
//! use lazyset_crossbeam::EpochGuard;
//!
//! let owner = String::from("short-lived");
//! let set: LazyList<&String, EpochGuard> = LazyList::new();
//! set.insert(&owner);
//! set.delete(&&owner);
//! drop(set);
//! drop(owner);
//! ```

pub mod epoch_guard;

// Export the Guard implementation
pub use epoch_guard::EpochGuard;

/// A lazy list using epoch-based reclamation.
pub type EpochLazyList<T> = lazyset_core::LazyList<T, EpochGuard>;
