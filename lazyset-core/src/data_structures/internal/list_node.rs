use std::ptr;
use std::sync::atomic::{AtomicBool, AtomicPtr, Ordering};

use parking_lot::{Mutex, MutexGuard};

pub(crate) type NodePtr<T> = *mut ListNode<T>;

/// A node of the lazy list.
///
/// `next` and `deleted` are read by lock-free traversals, so both are atomics.
/// `lock` only serializes writers that change this node's `next` or `deleted`.
///
/// The sentinel head carries no value.
///
pub(crate) struct ListNode<T> {
    value: Option<T>,
    deleted: AtomicBool,
    next: AtomicPtr<ListNode<T>>,
    lock: Mutex<()>,
}

impl<T> ListNode<T> {
    pub(crate) fn new(value: T, next: NodePtr<T>) -> Self {
        ListNode {
            value: Some(value),
            deleted: AtomicBool::new(false),
            next: AtomicPtr::new(next),
            lock: Mutex::new(()),
        }
    }

    pub(crate) fn new_sentinel() -> Self {
        ListNode {
            value: None,
            deleted: AtomicBool::new(false),
            next: AtomicPtr::new(ptr::null_mut()),
            lock: Mutex::new(()),
        }
    }

    /// The node's value, `None` for the sentinel.
    #[inline]
    pub(crate) fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    // =========================================================================
    // Next pointer accessors
    // =========================================================================

    /// Load next pointer (Acquire ordering)
    #[inline]
    pub(crate) fn get_next(&self) -> NodePtr<T> {
        self.next.load(Ordering::Acquire)
    }

    /// Store next pointer (Release ordering)
    ///
    /// Callers must hold this node's lock.
    #[inline]
    pub(crate) fn set_next(&self, next: NodePtr<T>) {
        self.next.store(next, Ordering::Release)
    }

    // =========================================================================
    // Logical deletion
    // =========================================================================

    #[inline]
    pub(crate) fn is_deleted(&self) -> bool {
        self.deleted.load(Ordering::Acquire)
    }

    /// Callers must hold this node's lock and its predecessor's lock.
    #[inline]
    pub(crate) fn mark_deleted(&self) {
        self.deleted.store(true, Ordering::Release)
    }

    #[inline]
    pub(crate) fn lock(&self) -> MutexGuard<'_, ()> {
        self.lock.lock()
    }

    /// Deallocate a node created with `Box::new`.
    ///
    /// # Safety
    /// - `ptr` must come from `Box::into_raw`
    /// - Must only be called once, and the node must not be accessed afterwards
    ///
    pub(crate) unsafe fn dealloc_ptr(ptr: NodePtr<T>) {
        unsafe { drop(Box::from_raw(ptr)) };
    }
}

impl<T: Ord> ListNode<T> {
    /// True if this node sorts strictly before `key`.
    ///
    /// The sentinel precedes every key.
    #[inline]
    pub(crate) fn precedes(&self, key: &T) -> bool {
        self.value.as_ref().is_none_or(|value| value < key)
    }

    #[inline]
    pub(crate) fn holds(&self, key: &T) -> bool {
        self.value.as_ref() == Some(key)
    }
}
