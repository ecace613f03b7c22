//! Test bodies shared by every reclamation strategy.
//!
//! Each function is generic over the guard so that `lazyset-core` (with
//! `DeferredGuard`) and `lazyset-crossbeam` (with `EpochGuard`) run the same
//! checks.
