//! Per-field version counters with narrow subscriptions
//!
//! Every mutation of a field bumps its counter by one. Listeners see the state before and after
//! each bump, so a field subscription fires only when its own counter moved. A bump over many
//! fields is a single state transition: each listener runs at most once per bump.

use crate::ctrl::FieldId;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

/// Field versions at one point in time
pub type Versions = HashMap<FieldId, u64>;

type Listener = dyn Fn(&Versions, &Versions);

struct ListenerEntry {
    id: u64,
    active: Cell<bool>,
    callback: Box<Listener>,
}

#[derive(Default)]
struct Inner {
    state: Rc<Versions>,
    listeners: Vec<Rc<ListenerEntry>>,
    next_id: u64,
}

/// Process-local version store owned by one form
#[derive(Default)]
pub struct VersionStore {
    inner: Rc<RefCell<Inner>>,
}

impl VersionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current version of a field, `None` until it is bumped for the first time
    pub fn get_version(&self, field: &FieldId) -> Option<u64> {
        self.inner.borrow().state.get(field).copied()
    }

    /// Increment the given fields, creating entries that start at 1
    pub fn bump<'a>(&self, fields: impl IntoIterator<Item = &'a FieldId>) {
        self.set_state(|prev| {
            let mut next = prev.clone();
            for field in fields {
                *next.entry(field.clone()).or_insert(0) += 1;
            }
            next
        });
    }

    /// Increment every field that already has a version plus `fields`, each exactly once.
    ///
    /// No entry is ever dropped, so versions only grow.
    pub fn bump_all<'a>(&self, fields: impl IntoIterator<Item = &'a FieldId>) {
        self.set_state(|prev| {
            let mut next = prev.clone();
            for field in fields {
                next.entry(field.clone()).or_insert(0);
            }
            for version in next.values_mut() {
                *version += 1;
            }
            next
        });
    }

    /// Register a listener for one field. It fires after any bump that changed that field's
    /// version, at most once per bump.
    pub fn subscribe_field(&self, field: FieldId, on_change: impl Fn() + 'static) -> Subscription {
        self.subscribe(move |state, prev| {
            if state.get(&field) != prev.get(&field) {
                on_change();
            }
        })
    }

    /// Register a listener receiving the full state and the state before the bump
    pub fn subscribe(&self, listener: impl Fn(&Versions, &Versions) + 'static) -> Subscription {
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.listeners.push(Rc::new(ListenerEntry {
            id,
            active: Cell::new(true),
            callback: Box::new(listener),
        }));
        tracing::trace!("version store listener {id} added");

        Subscription {
            id,
            store: Rc::downgrade(&self.inner),
            done: Cell::new(false),
        }
    }

    pub fn listener_count(&self) -> usize {
        self.inner.borrow().listeners.len()
    }

    /// Drop every entry and every listener
    pub fn clear(&self) {
        let released = {
            let mut inner = self.inner.borrow_mut();
            inner.state = Rc::default();
            std::mem::take(&mut inner.listeners)
        };
        // Callbacks are dropped outside the borrow, they may own subscriptions themselves
        for entry in &released {
            entry.active.set(false);
        }
    }

    fn set_state(&self, update: impl FnOnce(&Versions) -> Versions) {
        let (state, prev, listeners) = {
            let mut inner = self.inner.borrow_mut();
            let prev = Rc::clone(&inner.state);
            let state = Rc::new(update(&prev));
            inner.state = Rc::clone(&state);
            (state, prev, inner.listeners.clone())
        };
        tracing::trace!(fields = state.len(), "versions bumped");

        // Listeners may bump or unsubscribe, so nothing stays borrowed while they run
        for entry in listeners {
            if entry.active.get() {
                (entry.callback)(&state, &prev);
            }
        }
    }
}

impl fmt::Debug for VersionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("VersionStore")
            .field("state", &inner.state)
            .field("listeners", &inner.listeners.len())
            .finish()
    }
}

/// Handle of a registered listener.
///
/// Dropping it unsubscribes. `unsubscribe` may be called any number of times, also after the
/// store is gone.
#[must_use = "dropping a Subscription unsubscribes it"]
pub struct Subscription {
    id: u64,
    store: Weak<RefCell<Inner>>,
    done: Cell<bool>,
}

impl Subscription {
    pub fn unsubscribe(&self) {
        if self.done.replace(true) {
            return;
        }
        let Some(store) = self.store.upgrade() else {
            return;
        };
        let removed = {
            let mut inner = store.borrow_mut();
            let pos = inner.listeners.iter().position(|l| l.id == self.id);
            pos.map(|pos| inner.listeners.remove(pos))
        };
        if let Some(entry) = removed {
            entry.active.set(false);
            tracing::trace!("version store listener {} removed", self.id);
        }
    }

    pub fn is_active(&self) -> bool {
        !self.done.get() && self.store.strong_count() > 0
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counter() -> (Rc<Cell<u32>>, impl Fn() + 'static) {
        let count = Rc::new(Cell::new(0));
        let hits = Rc::clone(&count);
        (count, move || hits.set(hits.get() + 1))
    }

    fn ids(names: &[&str]) -> Vec<FieldId> {
        names.iter().map(|n| FieldId::from(*n)).collect()
    }

    mod versions {
        use super::*;

        #[test]
        fn test_unbumped_field_has_no_version() {
            let store = VersionStore::new();
            assert_eq!(store.get_version(&"email".into()), None);
        }

        #[test]
        fn test_version_equals_bump_count() {
            let store = VersionStore::new();
            let email = ids(&["email"]);
            for _ in 0..3 {
                store.bump(&email);
            }
            assert_eq!(store.get_version(&"email".into()), Some(3));
            assert_eq!(store.get_version(&"name".into()), None);
        }

        #[test]
        fn test_bump_only_touches_listed_fields() {
            let store = VersionStore::new();
            store.bump(&ids(&["a", "b"]));
            store.bump(&ids(&["a"]));
            assert_eq!(store.get_version(&"a".into()), Some(2));
            assert_eq!(store.get_version(&"b".into()), Some(1));
        }

        #[test]
        fn test_bump_all_increments_known_and_versioned_once() {
            let store = VersionStore::new();
            store.bump(&ids(&["a", "a2"]));
            store.bump(&ids(&["a"]));
            store.bump_all(&ids(&["a", "b"]));
            assert_eq!(store.get_version(&"a".into()), Some(3));
            assert_eq!(store.get_version(&"b".into()), Some(1));
            assert_eq!(store.get_version(&"a2".into()), Some(2));
        }

        #[test]
        fn test_versions_never_decrease_across_bump_all() {
            let store = VersionStore::new();
            let x = ids(&["x"]);
            store.bump(&x);
            assert_eq!(store.get_version(&"x".into()), Some(1));
            store.bump_all(&ids(&["other"]));
            assert_eq!(store.get_version(&"x".into()), Some(2));
            store.bump(&x);
            assert_eq!(store.get_version(&"x".into()), Some(3));
        }

        #[test]
        fn test_get_version_does_not_subscribe() {
            let store = VersionStore::new();
            let _ = store.get_version(&"a".into());
            assert_eq!(store.listener_count(), 0);
        }
    }

    mod subscriptions {
        use super::*;

        #[test]
        fn test_field_subscription_is_narrow() {
            let store = VersionStore::new();
            let (count, on_change) = counter();
            let _sub = store.subscribe_field("a".into(), on_change);

            store.bump(&ids(&["b"]));
            assert_eq!(count.get(), 0);
            store.bump(&ids(&["a"]));
            assert_eq!(count.get(), 1);
        }

        #[test]
        fn test_one_notification_per_batch() {
            let store = VersionStore::new();
            let batches = Rc::new(Cell::new(0));
            let seen = Rc::clone(&batches);
            let _sub = store.subscribe(move |_, _| seen.set(seen.get() + 1));

            store.bump_all(&ids(&["a", "b", "c"]));
            assert_eq!(batches.get(), 1);
        }

        #[test]
        fn test_multiple_subscriptions_all_fire() {
            let store = VersionStore::new();
            let (first, on_first) = counter();
            let (second, on_second) = counter();
            let _a = store.subscribe_field("a".into(), on_first);
            let _b = store.subscribe_field("a".into(), on_second);
            store.bump(&ids(&["a"]));
            assert_eq!((first.get(), second.get()), (1, 1));
        }

        #[test]
        fn test_unsubscribe_then_bump_does_not_fire() {
            let store = VersionStore::new();
            let (count, on_change) = counter();
            let sub = store.subscribe_field("a".into(), on_change);
            sub.unsubscribe();
            sub.unsubscribe();
            store.bump(&ids(&["a"]));
            assert_eq!(count.get(), 0);
            assert!(!sub.is_active());
        }

        #[test]
        fn test_drop_unsubscribes() {
            let store = VersionStore::new();
            let (count, on_change) = counter();
            drop(store.subscribe_field("a".into(), on_change));
            store.bump(&ids(&["a"]));
            assert_eq!(count.get(), 0);
            assert_eq!(store.listener_count(), 0);
        }

        #[test]
        fn test_unsubscribe_after_store_dropped_is_noop() {
            let store = VersionStore::new();
            let (_count, on_change) = counter();
            let sub = store.subscribe_field("a".into(), on_change);
            drop(store);
            sub.unsubscribe();
            assert!(!sub.is_active());
        }

        #[test]
        fn test_bump_all_notifies_fields_not_listed() {
            let store = VersionStore::new();
            store.bump(&ids(&["earlier"]));
            let (count, on_change) = counter();
            let _sub = store.subscribe_field("earlier".into(), on_change);
            store.bump_all(&ids(&["other"]));
            assert_eq!(count.get(), 1);
        }

        #[test]
        fn test_clear_releases_listeners_and_entries() {
            let store = VersionStore::new();
            let (count, on_change) = counter();
            let sub = store.subscribe_field("a".into(), on_change);
            store.bump(&ids(&["a"]));
            store.clear();
            assert_eq!(store.listener_count(), 0);
            assert_eq!(store.get_version(&"a".into()), None);
            store.bump(&ids(&["a"]));
            assert_eq!(count.get(), 1);
            sub.unsubscribe();
        }

        #[test]
        fn test_listener_may_bump_reentrantly() {
            let store = Rc::new(VersionStore::new());
            let inner = Rc::clone(&store);
            let _sub = store.subscribe_field("a".into(), move || {
                inner.bump(&[FieldId::from("b")]);
            });
            store.bump(&ids(&["a"]));
            assert_eq!(store.get_version(&"b".into()), Some(1));
        }

        #[test]
        fn test_listener_removed_mid_batch_is_skipped() {
            let store = VersionStore::new();
            let (count, on_change) = counter();
            let victim: Rc<RefCell<Option<Subscription>>> = Rc::default();
            let killer = Rc::clone(&victim);
            let _first = store.subscribe_field("a".into(), move || {
                if let Some(sub) = killer.borrow_mut().take() {
                    sub.unsubscribe();
                }
            });
            *victim.borrow_mut() = Some(store.subscribe_field("a".into(), on_change));
            store.bump(&ids(&["a"]));
            assert_eq!(count.get(), 0);
        }
    }
}
