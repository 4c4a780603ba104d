//! Lookup of live forms by id
//!
//! Forms live on the UI thread, so the registry is thread-local.

use super::field::FormId;
use crate::form::FormCtrl;
use std::cell::RefCell;
use std::collections::HashMap;

thread_local! {
    static FORMS: RefCell<HashMap<FormId, FormCtrl>> = RefCell::new(HashMap::new());
}

pub fn get(id: &FormId) -> Option<FormCtrl> {
    FORMS.with(|forms| forms.borrow().get(id).cloned())
}

/// Register a form under its id, replacing whatever was registered there
pub fn register(form: &FormCtrl) {
    let replaced = FORMS.with(|forms| forms.borrow_mut().insert(form.id().clone(), form.clone()));
    if let Some(previous) = replaced {
        if !previous.ptr_eq(form) {
            tracing::debug!("form `{}` replaced in registry", form.id());
        }
    }
}

/// Remove a form, but only if it is the instance registered under its id
pub fn unregister(form: &FormCtrl) -> bool {
    let removed = FORMS.with(|forms| {
        let mut forms = forms.borrow_mut();
        match forms.get(form.id()) {
            Some(current) if current.ptr_eq(form) => forms.remove(form.id()),
            _ => None,
        }
    });
    removed.is_some()
}

pub fn registered_ids() -> Vec<FormId> {
    FORMS.with(|forms| forms.borrow().keys().cloned().collect())
}
