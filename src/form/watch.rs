//! Re-render signal for one field

use super::FormCtrl;
use crate::ctrl::FieldId;
use crate::store::Subscription;
use std::cell::Cell;
use std::rc::Rc;

/// Tracks whether a field's version moved since the owner last rendered it.
///
/// The watch holds a subscription for as long as it lives, none when made on a destroyed form.
/// The raw version is only exposed for diagnostics.
#[derive(Debug)]
pub struct FieldWatch {
    field: FieldId,
    stale: Rc<Cell<bool>>,
    rendered_version: Option<u64>,
    subscription: Option<Subscription>,
}

impl FieldWatch {
    pub(super) fn new(form: &FormCtrl, field: FieldId, notify: Option<Rc<dyn Fn()>>) -> Self {
        let stale = Rc::new(Cell::new(false));
        let flag = Rc::clone(&stale);
        let subscription = (!form.is_destroyed()).then(|| {
            form.versions().subscribe_field(field.clone(), move || {
                flag.set(true);
                if let Some(notify) = &notify {
                    notify();
                }
            })
        });

        Self {
            rendered_version: form.get_version(&field),
            field,
            stale,
            subscription,
        }
    }

    /// True when the field changed after the last [`mark_rendered`](Self::mark_rendered)
    pub fn changed_since_render(&self) -> bool {
        self.stale.get()
    }

    /// Record that the owner rendered with the current state of the field
    pub fn mark_rendered(&mut self, form: &FormCtrl) {
        self.stale.set(false);
        self.rendered_version = form.get_version(&self.field);
    }

    pub fn rendered_version(&self) -> Option<u64> {
        self.rendered_version
    }

    /// Stop watching. Also happens on drop.
    pub fn release(&self) {
        if let Some(subscription) = &self.subscription {
            subscription.unsubscribe();
        }
    }
}
