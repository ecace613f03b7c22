//! Internal implementation details.
//!
//! These are pub(crate) and not intended for external use.

pub mod list_node;

pub(crate) use list_node::{ListNode, NodePtr};
