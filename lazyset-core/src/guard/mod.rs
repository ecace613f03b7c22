//! Guard trait for memory reclamation strategies.
//!
//! A lazy list unlinks nodes while other threads may still be walking through
//! them. The `Guard` decides when such a retired node is actually freed:
//!
//! ```text
//! LazyList<T, G: Guard>
//!     │
//!     ├── LazyList<T, EpochGuard>      (production, lazyset-crossbeam)
//!     └── LazyList<T, DeferredGuard>   (testing)
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use lazyset_core::LazyList;
//! use lazyset_crossbeam::EpochGuard;
//!
//! let set: LazyList<i64, EpochGuard> = LazyList::new();
//! set.insert(42);
//! ```

mod deferred_guard;

pub use deferred_guard::DeferredGuard;

/// A memory reclamation guard that protects concurrent access to nodes.
///
/// # Safety Contract
///
/// Implementations must ensure that a node passed to `defer_destroy` is not
/// freed while any thread that pinned a `ReadGuard` before the call still
/// holds it.
///
/// Guards are stored in collections and must be `Send + Sync`. Pinning
/// happens per-operation, not when the guard is created.
///
pub trait Guard: Sized + Default + Send + Sync {
    /// An active guard that protects reads for its lifetime.
    ///
    /// For epoch-based guards, this holds a pinned `crossbeam_epoch::Guard`.
    /// For deferred guards, this is `()` since nothing is freed before the
    /// collection itself.
    ///
    type ReadGuard: Sized;

    /// Pin an active read guard.
    ///
    /// Note: This is different from `Default::default()` which creates
    /// a guard for storage in collections.
    ///
    fn pin() -> Self::ReadGuard;

    /// Schedule a node for deferred destruction.
    ///
    /// # Safety
    ///
    /// - `node` must be a valid pointer previously allocated by the collection
    /// - `node` must be unlinked (not reachable by a fresh traversal)
    /// - `node` must not be retired twice
    /// - `dealloc` must be the correct deallocation function for `node`
    ///
    /// `N: 'static` because the destructor may run on another thread after
    /// the owning collection has been dropped.
    ///
    unsafe fn defer_destroy<N: 'static>(&self, node: *mut N, dealloc: unsafe fn(*mut N));
}
