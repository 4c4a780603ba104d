//! Identity-based change detection across render passes

use crate::ctrl::Required;
use std::rc::Rc;

/// Sameness used by [`ChangeDetector`].
///
/// Shared values compare by pointer, plain scalars by value.
pub trait Identity {
    fn same(&self, other: &Self) -> bool;
}

impl<T: ?Sized> Identity for Rc<T> {
    fn same(&self, other: &Self) -> bool {
        Rc::ptr_eq(self, other)
    }
}

impl<T: Identity> Identity for Option<T> {
    fn same(&self, other: &Self) -> bool {
        match (self, other) {
            (Some(a), Some(b)) => a.same(b),
            (None, None) => true,
            _ => false,
        }
    }
}

impl Identity for bool {
    fn same(&self, other: &Self) -> bool {
        self == other
    }
}

impl Identity for Required {
    fn same(&self, other: &Self) -> bool {
        self == other
    }
}

/// Remembers the value seen on the previous pass of one binding point.
///
/// The first call never reports a change. Every call stores the new value, whatever the outcome.
#[derive(Debug)]
pub struct ChangeDetector<T> {
    last: Option<T>,
}

impl<T> Default for ChangeDetector<T> {
    fn default() -> Self {
        Self { last: None }
    }
}

impl<T: Identity + Clone> ChangeDetector<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn changed(&mut self, value: &T) -> bool {
        let changed = self.last.as_ref().is_some_and(|last| !last.same(value));
        self.last = Some(value.clone());
        changed
    }
}
