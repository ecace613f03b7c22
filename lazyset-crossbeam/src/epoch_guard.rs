//! Epoch-based guard implementation using crossbeam-epoch.
//!
//! `EpochGuard` is a zero-sized type that schedules destruction using the
//! global epoch collector. Lists parameterized with `EpochGuard` get
//! epoch-based memory reclamation:
//!
//! ```text
//! LazyList<i64, EpochGuard>
//!     │
//!     └── Uses crossbeam-epoch for memory safety
//! ```

use crossbeam_epoch::{self as epoch, Guard as CrossbeamGuard};
use lazyset_core::guard::Guard;

/// Epoch-based memory reclamation guard.
///
/// Nodes are not freed until all threads have advanced past the epoch in
/// which they were retired.
///
/// Unlike `DeferredGuard` which stores pending destructions, `EpochGuard`
/// holds no state, so it can be stored in every list for free.
///
/// When `defer_destroy` is called, it:
/// 1. Pins the current thread to the current epoch
/// 2. Schedules the destruction to run after all threads have advanced
/// 3. Unpins immediately (the destruction is managed globally)
///
#[derive(Clone, Copy, Debug, Default)]
pub struct EpochGuard {
    // Zero-sized - all state is in the global epoch collector
}

impl EpochGuard {
    pub fn new() -> Self {
        EpochGuard {}
    }
}

impl Guard for EpochGuard {
    /// A pinned crossbeam guard held for the duration of an operation.
    type ReadGuard = CrossbeamGuard;

    fn pin() -> Self::ReadGuard {
        epoch::pin()
    }

    unsafe fn defer_destroy<N: 'static>(&self, node: *mut N, dealloc: unsafe fn(*mut N)) {
        let guard = epoch::pin();
        unsafe {
            guard.defer_unchecked(move || {
                dealloc(node);
            });
        }
        // guard dropped here - unpins the thread
    }
}
