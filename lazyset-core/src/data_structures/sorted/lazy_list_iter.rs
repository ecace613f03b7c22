use std::marker::PhantomData;

use crate::data_structures::internal::NodePtr;
use crate::data_structures::sorted::LazyList;
use crate::guard::Guard;

/// Iterator over a lazy list with guard protection.
///
/// This iterator holds a read guard for the duration of iteration, so every
/// node it can reach stays allocated. For epoch-based guards, this pins the
/// thread. For deferred guards, this is a no-op since the list's guard
/// provides protection.
///
/// Nodes already marked deleted when the iterator reaches them are skipped.
///
pub struct LazyListIter<'a, T, G: Guard> {
    _guard: G::ReadGuard,
    current_node: NodePtr<T>,
    _list: PhantomData<&'a LazyList<T, G>>,
}

impl<'a, T, G: Guard> LazyListIter<'a, T, G> {
    pub(crate) fn new(guard: G::ReadGuard, first: NodePtr<T>) -> Self {
        LazyListIter {
            _guard: guard,
            current_node: first,
            _list: PhantomData,
        }
    }
}

impl<T, G> Iterator for LazyListIter<'_, T, G>
where
    T: Clone,
    G: Guard,
{
    // Values are cloned: a reference would have to outlive the read guard
    // that the iterator owns.
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(node) = unsafe { self.current_node.as_ref() } {
            self.current_node = node.get_next();

            if node.is_deleted() {
                continue;
            }
            if let Some(value) = node.value() {
                return Some(value.clone());
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use crate::LazyList;
    use crate::guard::DeferredGuard;

    #[test]
    fn test_iter_ascending() {
        let list: LazyList<i32, DeferredGuard> = [9, 1, 5, 3, 7].into_iter().collect();
        let values: Vec<i32> = list.iter().collect();
        assert_eq!(values, vec![1, 3, 5, 7, 9]);
    }

    #[test]
    fn test_iter_survives_concurrent_delete() {
        let list: LazyList<i32, DeferredGuard> = (0..10).collect();
        let mut iter = list.iter();

        assert_eq!(iter.next(), Some(0));
        assert_eq!(iter.next(), Some(1));

        // The iterator sits on node 2; delete it and a later node.
        assert!(list.delete(&2));
        assert!(list.delete(&8));

        let rest: Vec<i32> = iter.collect();
        assert_eq!(rest, vec![3, 4, 5, 6, 7, 9]);
    }

    #[test]
    fn test_iter_empty() {
        let list: LazyList<i32, DeferredGuard> = LazyList::new();
        assert_eq!(list.iter().next(), None);
    }
}
