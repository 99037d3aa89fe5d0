//! Thread-scoped value stacks with guaranteed release.
//!
//! A [`ScopedSlot`] attaches per-thread, per-invocation state to a
//! shared channel graph: the record instance under construction, the
//! current projection item, the running reduce accumulator. Each slot
//! owns an id into a thread-local stack table; `push` returns a guard
//! that pops on drop, so a panic mid-evaluation can never leave a stale
//! value visible to a later reentrant call on the same thread.

use std::any::Any;
use std::cell::RefCell;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};

use rustc_hash::FxHashMap;

static NEXT_SLOT_ID: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static STACKS: RefCell<FxHashMap<u64, Vec<Box<dyn Any>>>> =
        RefCell::new(FxHashMap::default());
}

/// A slot of thread-scoped stacked state.
///
/// Cloneable values only: `current` hands out clones so no borrow of the
/// thread-local table escapes.
#[derive(Debug)]
pub struct ScopedSlot<T: Clone + Send + 'static> {
    id: u64,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Clone + Send + 'static> ScopedSlot<T> {
    pub fn new() -> Self {
        ScopedSlot {
            id: NEXT_SLOT_ID.fetch_add(1, Ordering::Relaxed),
            _marker: PhantomData,
        }
    }

    /// Push `value` for the current thread. The returned guard pops it
    /// again on every exit path.
    #[must_use = "dropping the guard immediately pops the value"]
    pub fn push(&self, value: T) -> SlotGuard<'_, T> {
        STACKS.with(|stacks| {
            stacks
                .borrow_mut()
                .entry(self.id)
                .or_default()
                .push(Box::new(value));
        });
        SlotGuard { slot: self }
    }

    /// Clone of the innermost value pushed by the current thread.
    pub fn current(&self) -> Option<T> {
        STACKS.with(|stacks| {
            stacks
                .borrow()
                .get(&self.id)
                .and_then(|stack| stack.last())
                .and_then(|boxed| boxed.downcast_ref::<T>())
                .cloned()
        })
    }

    /// Depth of this thread's stack (diagnostics and tests).
    pub fn depth(&self) -> usize {
        STACKS.with(|stacks| {
            stacks
                .borrow()
                .get(&self.id)
                .map_or(0, Vec::len)
        })
    }

    fn pop(&self) {
        STACKS.with(|stacks| {
            let mut stacks = stacks.borrow_mut();
            if let Some(stack) = stacks.get_mut(&self.id) {
                stack.pop();
                if stack.is_empty() {
                    stacks.remove(&self.id);
                }
            }
        });
    }
}

impl<T: Clone + Send + 'static> Default for ScopedSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Pops the pushed value when dropped.
pub struct SlotGuard<'a, T: Clone + Send + 'static> {
    slot: &'a ScopedSlot<T>,
}

impl<T: Clone + Send + 'static> Drop for SlotGuard<'_, T> {
    fn drop(&mut self) {
        self.slot.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn push_pop_nesting() {
        let slot = ScopedSlot::new();
        assert_eq!(slot.current(), None::<i32>);
        let _outer = slot.push(1);
        {
            let _inner = slot.push(2);
            assert_eq!(slot.current(), Some(2));
        }
        assert_eq!(slot.current(), Some(1));
    }

    #[test]
    fn slots_are_independent() {
        let a = ScopedSlot::new();
        let b = ScopedSlot::new();
        let _ga = a.push(10);
        assert_eq!(b.current(), None::<i32>);
        let _gb = b.push(20);
        assert_eq!(a.current(), Some(10));
    }

    #[test]
    fn panic_does_not_leak_a_stale_value() {
        let slot = ScopedSlot::new();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = slot.push(7);
            panic!("mid-evaluation failure");
        }));
        assert!(result.is_err());
        assert_eq!(slot.current(), None::<i32>);
        assert_eq!(slot.depth(), 0);
    }

    #[test]
    fn threads_do_not_observe_each_other() {
        let slot = std::sync::Arc::new(ScopedSlot::<i32>::new());
        let _guard = slot.push(1);
        let other = std::sync::Arc::clone(&slot);
        let seen = std::thread::spawn(move || other.current()).join();
        assert_eq!(seen.ok().flatten(), None);
    }
}
