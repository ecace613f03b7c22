use std::fmt;
use std::marker::PhantomData;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicUsize, Ordering};

use crossbeam_utils::Backoff;

use crate::data_structures::internal::{ListNode, NodePtr};
use crate::data_structures::sorted::lazy_list_iter::LazyListIter;
use crate::error::ChainViolation;
use crate::guard::Guard;

///
/// Concurrent ordered set based on a sorted singly-linked list with per-node
/// locks and logical deletion (the "lazy list").
///
/// Readers (`contains`, `range`, `iter`, `len`) never lock. Writers traverse
/// without locks, then lock the one or two nodes they change and validate
/// that the window they saw is still intact before committing.
///
// =============================================================================
// LIST STRUCTURE
// =============================================================================
//
// ┌──────┐    ┌──────┐    ┌──────┐    ┌──────┐
// │ HEAD │───►│  10  │───►│  20  │───►│  30  │───► NULL
// │(sent)│    │      │    │      │    │      │
// └──────┘    └──────┘    └──────┘    └──────┘
//
// INVARIANTS:
// 1. Nodes reachable from HEAD are strictly ascending
// 2. A node is marked deleted and unlinked in the same critical section,
//    holding both its own lock and its predecessor's lock
// 3. A marked node is never a valid predecessor: insert and delete both
//    reject a locked pred whose deleted flag is set
// 4. `len` equals the reachable node count whenever no writer is mid-commit
// 5. HEAD is never marked or removed
//
// =============================================================================
// INSERT (one lock)
// =============================================================================
//
//   locate(key) -> (pred, curr)           pred ──────► curr
//   lock(pred)
//   validate: !pred.deleted && pred.next == curr
//   node.next = curr; pred.next = node    pred ──► node ──► curr
//   len += 1
//   unlock(pred)
//
// =============================================================================
// DELETE (two locks, successor first)
// =============================================================================
//
//   locate(key) -> (pred, curr)           pred ──────► curr ──────► next
//   lock(curr);  retry if curr.deleted
//   lock(pred);  retry if pred.deleted || pred.next != curr
//   curr.deleted = true
//   pred.next = curr.next                 pred ─────────────────────► next
//   len -= 1                                           curr ──► next (retired)
//   unlock(pred); unlock(curr)
//   guard.defer_destroy(curr)
//
// Keys strictly increase along every path, so delete always locks in
// descending key order and insert holds a single lock: no lock cycle exists.
//
// A retired node keeps its `next`, so a reader standing on it can still walk
// forward into the live list.
//
pub struct LazyList<T, G: Guard> {
    head: NonNull<ListNode<T>>,
    len: AtomicUsize,
    /// Shared guard instance for deferred destruction.
    /// All deleted nodes are retired to this guard.
    guard: G,
    _marker: PhantomData<ListNode<T>>,
}

// Safety: values are shared between threads by reference (`Sync`) and may be
// dropped by whichever thread frees a retired node (`Send`). All node fields
// touched concurrently are atomics or behind the node lock.
unsafe impl<T: Send + Sync, G: Guard> Send for LazyList<T, G> {}
unsafe impl<T: Send + Sync, G: Guard> Sync for LazyList<T, G> {}

/// Predecessor/successor pair produced by a lock-free traversal.
///
/// `pred` is the last node ordered before the key (or HEAD), `curr` the first
/// node not ordered before it (or null).
struct Window<T> {
    pred: NodePtr<T>,
    curr: NodePtr<T>,
}

// Retired nodes may outlive the list inside a reclamation queue, so values
// must not borrow anything.
impl<T, G> LazyList<T, G>
where
    T: Ord + 'static,
    G: Guard,
{
    pub fn new() -> Self {
        let head = Box::new(ListNode::new_sentinel());
        LazyList {
            head: NonNull::from(Box::leak(head)),
            len: AtomicUsize::new(0),
            guard: G::default(),
            _marker: PhantomData,
        }
    }

    /// Get the shared guard instance for this collection.
    pub fn guard(&self) -> &G {
        &self.guard
    }

    /// Walk from HEAD to the window around `key`.
    ///
    /// Takes no locks. The caller must hold a read guard for as long as it
    /// uses the returned pointers.
    fn locate(&self, key: &T) -> Window<T> {
        let mut pred = self.head.as_ptr();
        let mut curr = unsafe { (*pred).get_next() };

        while let Some(node) = unsafe { curr.as_ref() } {
            if !node.precedes(key) {
                break;
            }
            pred = curr;
            curr = node.get_next();
        }

        Window { pred, curr }
    }

    /// Insert a value into the set.
    ///
    /// Returns `true` if the value was inserted, `false` if a live node with
    /// the same value already exists.
    ///
    pub fn insert(&self, key: T) -> bool {
        let _guard = G::pin();
        let backoff = Backoff::new();
        #[cfg(feature = "tracing")]
        let mut attempt: u32 = 0;

        loop {
            let Window { pred, curr } = self.locate(&key);

            // Fast reject before taking any lock.
            //
            if let Some(node) = unsafe { curr.as_ref() } {
                if node.holds(&key) {
                    return false;
                }
            }

            let pred_node = unsafe { &*pred };
            let pred_lock = pred_node.lock();

            if !pred_node.is_deleted() && pred_node.get_next() == curr {
                let node = Box::into_raw(Box::new(ListNode::new(key, curr)));
                pred_node.set_next(node);
                self.len.fetch_add(1, Ordering::Release);
                drop(pred_lock);
                return true;
            }

            drop(pred_lock);

            #[cfg(feature = "tracing")]
            {
                attempt += 1;
                tracing::trace!(attempt, "insert validation failed, retrying");
            }
            backoff.spin();
        }
    }

    /// Remove a value from the set.
    ///
    /// Returns `true` if a live node with the value existed and this call
    /// removed it, `false` otherwise.
    ///
    pub fn delete(&self, key: &T) -> bool {
        let _guard = G::pin();
        let backoff = Backoff::new();
        #[cfg(feature = "tracing")]
        let mut attempt: u32 = 0;

        loop {
            let Window { pred, curr } = self.locate(key);

            let Some(victim) = (unsafe { curr.as_ref() }) else {
                return false;
            };
            if !victim.holds(key) {
                return false;
            }

            let victim_lock = victim.lock();

            if !victim.is_deleted() {
                let pred_node = unsafe { &*pred };
                let pred_lock = pred_node.lock();

                if !pred_node.is_deleted() && pred_node.get_next() == curr {
                    victim.mark_deleted();
                    pred_node.set_next(victim.get_next());
                    self.len.fetch_sub(1, Ordering::Release);

                    drop(pred_lock);
                    drop(victim_lock);

                    // Safety: `curr` is unlinked and only this call observed
                    // the deleted flag transition, so it is retired once.
                    unsafe {
                        self.guard.defer_destroy(curr, ListNode::dealloc_ptr);
                    }
                    return true;
                }

                drop(pred_lock);
            }

            drop(victim_lock);

            #[cfg(feature = "tracing")]
            {
                attempt += 1;
                tracing::trace!(attempt, "delete validation failed, retrying");
            }
            backoff.spin();
        }
    }

    /// Check if a value is in the set.
    ///
    pub fn contains(&self, key: &T) -> bool {
        let _guard = G::pin();
        let Window { curr, .. } = self.locate(key);

        // The deleted flag is read last: the node may be marked after it was found.
        let found = unsafe { curr.as_ref() };
        found.is_some_and(|node| node.holds(key) && !node.is_deleted())
    }

    /// Visit live values in ascending order until `visit` returns `false`.
    ///
    /// This is a best-effort walk, not a snapshot: values inserted or deleted
    /// while it runs may or may not be seen. A node already marked deleted
    /// when the walk reaches it is skipped.
    ///
    pub fn range<F>(&self, mut visit: F)
    where
        F: FnMut(&T) -> bool,
    {
        let _guard = G::pin();
        let mut curr = unsafe { self.head.as_ref() }.get_next();

        while let Some(node) = unsafe { curr.as_ref() } {
            if !node.is_deleted() {
                if let Some(value) = node.value() {
                    if !visit(value) {
                        break;
                    }
                }
            }
            curr = node.get_next();
        }
    }

    /// Returns the number of live values.
    ///
    /// Reflects the most recent commit, not necessarily what a concurrent
    /// traversal observes.
    ///
    pub fn len(&self) -> usize {
        self.len.load(Ordering::Acquire)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterator over live values in ascending order.
    ///
    /// The iterator pins a read guard for its whole lifetime and has the same
    /// weak consistency as [`range`](Self::range).
    ///
    pub fn iter(&self) -> LazyListIter<'_, T, G>
    where
        T: Clone,
    {
        let guard = G::pin();
        let first = unsafe { self.head.as_ref() }.get_next();
        LazyListIter::new(guard, first)
    }

    /// Collects all live values into a Vec.
    ///
    pub fn to_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.iter().collect()
    }

    /// Audit the chain structure.
    ///
    /// Only meaningful while no writer is active; under concurrent mutation
    /// this can report transient states as violations.
    ///
    /// Returns the number of reachable value nodes.
    ///
    pub fn verify(&self) -> Result<usize, ChainViolation> {
        let _guard = G::pin();
        let mut counted = 0;
        let mut prev: Option<&T> = None;
        let mut curr = unsafe { self.head.as_ref() }.get_next();

        while let Some(node) = unsafe { curr.as_ref() } {
            if node.is_deleted() {
                return Err(ChainViolation::DeletedReachable { position: counted });
            }
            let value = node.value();
            if prev.is_some() && value <= prev {
                return Err(ChainViolation::OutOfOrder { position: counted });
            }
            prev = value;
            counted += 1;
            curr = node.get_next();
        }

        let recorded = self.len();
        if counted != recorded {
            return Err(ChainViolation::LengthMismatch { counted, recorded });
        }
        Ok(counted)
    }
}

impl<T, G> Default for LazyList<T, G>
where
    T: Ord + 'static,
    G: Guard,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, G> fmt::Debug for LazyList<T, G>
where
    T: Ord + fmt::Debug + 'static,
    G: Guard,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut set = f.debug_set();
        self.range(|value| {
            set.entry(value);
            true
        });
        set.finish()
    }
}

impl<T, G> Extend<T> for LazyList<T, G>
where
    T: Ord + 'static,
    G: Guard,
{
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.insert(value);
        }
    }
}

impl<T, G> FromIterator<T> for LazyList<T, G>
where
    T: Ord + 'static,
    G: Guard,
{
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut list = Self::new();
        list.extend(iter);
        list
    }
}

impl<T, G: Guard> Drop for LazyList<T, G> {
    fn drop(&mut self) {
        // Free the sentinel and every linked node. Retired nodes belong to the
        // guard, which is dropped after this.
        //
        let mut curr = self.head.as_ptr();
        #[cfg(feature = "tracing")]
        let mut freed: usize = 0;

        while !curr.is_null() {
            unsafe {
                let next = (*curr).get_next();
                debug_assert!(
                    !(*curr).is_deleted(),
                    "deleted node still linked at drop time"
                );
                ListNode::dealloc_ptr(curr);
                curr = next;
            }
            #[cfg(feature = "tracing")]
            {
                freed += 1;
            }
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(freed, "dropped lazy list");
    }
}

// ============================================================================
// Tests - Unique to LazyList
// ============================================================================
// Note: Guard-generic tests live in common_tests and tests/

#[cfg(test)]
mod tests {
    use crate::guard::DeferredGuard;

    use super::*;
    use std::sync::{Arc, Barrier};
    use std::thread;

    type TestList = LazyList<i32, DeferredGuard>;

    #[test]
    fn test_example_trace() {
        let list = TestList::new();

        assert!(list.insert(5));
        assert!(list.insert(3));
        assert!(!list.insert(5));
        assert_eq!(list.to_vec(), vec![3, 5]);
        assert!(list.delete(&3));
        assert!(!list.contains(&3));
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_empty_list() {
        let list = TestList::new();

        assert!(list.is_empty());
        assert!(!list.contains(&0));
        assert!(!list.delete(&0));
        assert_eq!(list.to_vec(), Vec::<i32>::new());
        assert_eq!(list.verify(), Ok(0));
    }

    #[test]
    fn test_locate_window() {
        let list: TestList = [10, 20, 30].into_iter().collect();
        let _guard = DeferredGuard::pin();

        unsafe {
            let window = list.locate(&20);
            assert_eq!((*window.pred).value(), Some(&10));
            assert_eq!((*window.curr).value(), Some(&20));

            let window = list.locate(&5);
            assert_eq!(window.pred, list.head.as_ptr());
            assert_eq!((*window.curr).value(), Some(&10));

            let window = list.locate(&31);
            assert_eq!((*window.pred).value(), Some(&30));
            assert!(window.curr.is_null());
        }
    }

    #[test]
    fn test_delete_retires_to_guard() {
        let list: TestList = (0..10).collect();

        for i in (0..10).step_by(2) {
            assert!(list.delete(&i));
        }

        assert_eq!(list.guard().pending(), 5);
        assert_eq!(list.to_vec(), vec![1, 3, 5, 7, 9]);
        assert_eq!(list.verify(), Ok(5));
    }

    #[test]
    fn test_retired_node_still_walks_forward() {
        let list: TestList = [10, 20, 30].into_iter().collect();
        let _guard = DeferredGuard::pin();

        let retired = list.locate(&20).curr;
        assert!(list.delete(&20));

        unsafe {
            assert!((*retired).is_deleted());
            let next = (*retired).get_next();
            assert_eq!((*next).value(), Some(&30));
        }
    }

    #[test]
    fn test_range_stops_early() {
        let list: TestList = (1..=10).collect();
        let mut seen = Vec::new();

        list.range(|value| {
            seen.push(*value);
            *value < 4
        });

        assert_eq!(seen, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_range_skips_marked_node() {
        let list: TestList = [1, 2, 3].into_iter().collect();
        let _guard = DeferredGuard::pin();

        // Mark 2 without unlinking it, as a reader racing a delete would see it.
        let marked = list.locate(&2).curr;
        unsafe {
            let _lock = (*marked).lock();
            (*marked).mark_deleted();
        }

        let mut seen = Vec::new();
        list.range(|value| {
            seen.push(*value);
            true
        });
        assert_eq!(seen, vec![1, 3]);
        assert!(!list.contains(&2));
        assert_eq!(
            list.verify(),
            Err(ChainViolation::DeletedReachable { position: 1 })
        );

        // Finish the delete by hand so drop sees a clean chain.
        unsafe {
            let pred = list.locate(&2).pred;
            (*pred).set_next((*marked).get_next());
            list.len.fetch_sub(1, Ordering::Release);
            list.guard().defer_destroy(marked, ListNode::dealloc_ptr);
        }
        assert_eq!(list.verify(), Ok(2));
    }

    #[test]
    fn test_verify_detects_length_mismatch() {
        let list: TestList = [1, 2].into_iter().collect();
        list.len.fetch_add(1, Ordering::Release);

        assert_eq!(
            list.verify(),
            Err(ChainViolation::LengthMismatch {
                counted: 2,
                recorded: 3
            })
        );

        list.len.fetch_sub(1, Ordering::Release);
        assert_eq!(list.verify(), Ok(2));
    }

    #[test]
    fn test_debug_format() {
        let list: TestList = [5, 3, 9].into_iter().collect();
        assert_eq!(format!("{:?}", list), "{3, 5, 9}");
    }

    #[test]
    fn test_extend() {
        let mut list = TestList::new();
        list.extend(vec![4, 2, 4, 1]);
        assert_eq!(list.to_vec(), vec![1, 2, 4]);
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn test_string_keys() {
        let list: LazyList<String, DeferredGuard> = LazyList::new();
        assert!(list.insert("pear".to_string()));
        assert!(list.insert("apple".to_string()));
        assert!(!list.insert("pear".to_string()));
        assert!(list.delete(&"apple".to_string()));
        assert_eq!(list.to_vec(), vec!["pear".to_string()]);
    }

    #[test]
    fn test_racing_deletes_single_winner() {
        let list: Arc<TestList> = Arc::new((0..100).collect());
        let num_threads = 8;
        let barrier = Arc::new(Barrier::new(num_threads));

        let handles: Vec<_> = (0..num_threads)
            .map(|_| {
                let list = Arc::clone(&list);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    (0..100).filter(|i| list.delete(i)).count()
                })
            })
            .collect();

        let total: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();

        assert_eq!(total, 100);
        assert!(list.is_empty());
        assert_eq!(list.guard().pending(), 100);
        assert_eq!(list.verify(), Ok(0));
    }

    #[test]
    fn test_insert_next_to_concurrent_delete() {
        // Deleters remove even keys while inserters fill in odd keys right
        // next to them, exercising pred/curr validation on both sides.
        let list: Arc<TestList> = Arc::new((0..2000).step_by(2).collect());
        let barrier = Arc::new(Barrier::new(2));

        let deleter = {
            let list = Arc::clone(&list);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for i in (0..2000).step_by(2) {
                    assert!(list.delete(&i));
                }
            })
        };

        let inserter = {
            let list = Arc::clone(&list);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for i in (1..2000).step_by(2) {
                    assert!(list.insert(i));
                }
            })
        };

        deleter.join().unwrap();
        inserter.join().unwrap();

        let expected: Vec<i32> = (1..2000).step_by(2).collect();
        assert_eq!(list.to_vec(), expected);
        assert_eq!(list.verify(), Ok(1000));
    }
}
