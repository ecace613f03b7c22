use thiserror::Error;

/// A structural problem found by [`LazyList::verify`](crate::LazyList::verify).
///
/// Positions are zero-based indexes of value nodes, counted from the first
/// node after the sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainViolation {
    #[error("node at position {position} is not greater than its predecessor")]
    OutOfOrder { position: usize },

    #[error("node at position {position} is marked deleted but still reachable")]
    DeletedReachable { position: usize },

    #[error("counted {counted} reachable nodes but length records {recorded}")]
    LengthMismatch { counted: usize, recorded: usize },
}
