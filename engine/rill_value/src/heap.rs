//! Factory-enforced shared heap allocation.

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

/// Shared, immutable heap storage for value payloads.
///
/// Wraps `Arc<T>` with a crate-private constructor so heap variants can
/// only be built through `Value` factory methods. Pointer identity is
/// exposed (`ptr_eq`) because record instances and opaque payloads are
/// compared by identity.
pub struct Heap<T: ?Sized>(Arc<T>);

impl<T> Heap<T> {
    /// Crate-private: all external allocation goes through `Value::`
    /// factories.
    pub(crate) fn new(value: T) -> Self {
        Heap(Arc::new(value))
    }
}

impl<T: ?Sized> Heap<T> {
    pub(crate) fn from_arc(arc: Arc<T>) -> Self {
        Heap(arc)
    }

    /// Identity comparison of the underlying allocation.
    pub fn ptr_eq(&self, other: &Heap<T>) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl<T: ?Sized> Clone for Heap<T> {
    fn clone(&self) -> Self {
        Heap(Arc::clone(&self.0))
    }
}

impl<T: ?Sized> Deref for Heap<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T: fmt::Debug + ?Sized> fmt::Debug for Heap<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl<T: fmt::Display + ?Sized> fmt::Display for Heap<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl<T: PartialEq + ?Sized> PartialEq for Heap<T> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0 == other.0
    }
}
