//! Subscription-aware form handle
//!
//! `FormCtrl` wraps a [`FormCore`] together with the [`VersionStore`] of the same form. Every
//! operation is delegated to the core, then the affected fields are bumped so that only their
//! subscribers react. Handles are cheap to clone and all clones share one form.

mod watch;

pub use watch::FieldWatch;

use crate::ctrl::{
    registry, ChangeEvent, FieldData, FieldId, FieldMessage, FieldValidation, FormCore, FormId,
    FormOptions, FormValues, MessageOptions,
};
use crate::error::{FormError, Result};
use crate::store::{Subscription, VersionStore};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

struct FormInner {
    id: FormId,
    core: RefCell<FormCore>,
    versions: VersionStore,
    destroyed: Cell<bool>,
}

#[derive(Clone)]
pub struct FormCtrl {
    inner: Rc<FormInner>,
}

impl FormCtrl {
    /// Create a form and register it under `id`
    pub fn new(id: impl Into<FormId>, options: FormOptions) -> Self {
        let id = id.into();
        tracing::debug!("creating form `{id}`");
        let form = Self {
            inner: Rc::new(FormInner {
                id,
                core: RefCell::new(FormCore::new(options)),
                versions: VersionStore::new(),
                destroyed: Cell::new(false),
            }),
        };
        registry::register(&form);
        form
    }

    /// Create a form under a generated id
    pub fn anonymous(options: FormOptions) -> Self {
        Self::new(FormId::generate(), options)
    }

    /// Registered form with this id
    pub fn get(id: &FormId) -> Option<Self> {
        registry::get(id)
    }

    pub fn id(&self) -> &FormId {
        &self.inner.id
    }

    /// Whether both handles point at the same form
    pub fn ptr_eq(&self, other: &FormCtrl) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn is_destroyed(&self) -> bool {
        self.inner.destroyed.get()
    }

    /// Unregister the form and release its versions and subscriptions. Calling it again is a no-op.
    pub fn destroy(&self) {
        if self.inner.destroyed.replace(true) {
            return;
        }
        registry::unregister(self);
        self.inner.versions.clear();
        tracing::debug!("form `{}` destroyed", self.inner.id);
    }

    /// Bump the versions of `fields`, or of every known or already versioned field when `None`.
    ///
    /// Either way subscribers see one state transition.
    pub fn rerender_fields(&self, fields: Option<&[FieldId]>) {
        if self.is_destroyed() {
            return;
        }
        match fields {
            Some(fields) => self.inner.versions.bump(fields),
            None => {
                let known = self.inner.core.borrow().field_ids();
                self.inner.versions.bump_all(&known);
            }
        }
    }

    pub fn get_version(&self, field: &FieldId) -> Option<u64> {
        self.inner.versions.get_version(field)
    }

    /// Call `callback` with fresh field data whenever the field's version changes
    pub fn subscribe_to_field(
        &self,
        field: FieldId,
        callback: impl Fn(FieldData) + 'static,
    ) -> Subscription {
        let form = Rc::downgrade(&self.inner);
        let read = field.clone();
        self.inner.versions.subscribe_field(field, move || {
            if let Some(data) = Self::upgrade(&form).and_then(|f| f.field_data(&read)) {
                callback(data);
            }
        })
    }

    /// Watch one field's version for re-render decisions
    pub fn watch_field(&self, field: FieldId) -> FieldWatch {
        FieldWatch::new(self, field, None)
    }

    /// Like [`watch_field`](Self::watch_field), also calling `notify` on every change
    pub fn watch_field_with(&self, field: FieldId, notify: impl Fn() + 'static) -> FieldWatch {
        FieldWatch::new(self, field, Some(Rc::new(notify)))
    }

    /// Current snapshot of a field, `None` once the form is destroyed
    pub fn field_data(&self, field: &FieldId) -> Option<FieldData> {
        if self.is_destroyed() {
            return None;
        }
        Some(self.inner.core.borrow().field_data(field))
    }

    pub fn value(&self, field: &FieldId) -> Option<Value> {
        if self.is_destroyed() {
            return None;
        }
        self.inner.core.borrow().value(field).cloned()
    }

    /// Current values, empty once the form is destroyed
    pub fn values(&self) -> FormValues {
        if self.is_destroyed() {
            return FormValues::default();
        }
        self.inner.core.borrow().values().clone()
    }

    pub fn field_ids(&self) -> Vec<FieldId> {
        if self.is_destroyed() {
            return Vec::new();
        }
        self.inner.core.borrow().field_ids()
    }

    /// Deserialize the current values into `T`
    pub fn values_as<T: DeserializeOwned>(&self) -> Result<T> {
        if self.is_destroyed() {
            return Err(FormError::Destroyed(self.id().clone()));
        }
        let values = serde_json::to_value(self.values())?;
        Ok(serde_json::from_value(values)?)
    }

    /// Parse a JSON object into form values
    pub fn values_from_json(json: &str) -> Result<FormValues> {
        match serde_json::from_str(json)? {
            Value::Object(map) => Ok(map.into_iter().map(|(k, v)| (k.into(), v)).collect()),
            Value::Null => Err(FormError::NotAnObject("null")),
            Value::Bool(_) => Err(FormError::NotAnObject("a boolean")),
            Value::Number(_) => Err(FormError::NotAnObject("a number")),
            Value::String(_) => Err(FormError::NotAnObject("a string")),
            Value::Array(_) => Err(FormError::NotAnObject("an array")),
        }
    }

    /// Replace all values and invalidate every field
    pub fn reset_values(&self, values: FormValues) {
        if self.mutate("reset_values", |core| core.reset_values(values)).is_some() {
            tracing::debug!("form `{}` values reset", self.inner.id);
            self.rerender_fields(None);
        }
    }

    /// Merge values, invalidating only the merged fields
    pub fn set_values(&self, values: FormValues) {
        if let Some(fields) = self.mutate("set_values", |core| core.set_values(values)) {
            self.rerender_fields(Some(&fields));
        }
    }

    pub fn handle_change(&self, field: &FieldId, event: &ChangeEvent) {
        if self
            .mutate("handle_change", |core| core.handle_change(field, event))
            .is_some()
        {
            self.rerender_fields(Some(std::slice::from_ref(field)));
        }
    }

    pub fn handle_blur(&self, field: &FieldId) {
        if self
            .mutate("handle_blur", |core| core.handle_blur(field))
            .is_some()
        {
            self.rerender_fields(Some(std::slice::from_ref(field)));
        }
    }

    pub fn set_field_validation(&self, field: &FieldId, validation: FieldValidation) {
        if self
            .mutate("set_field_validation", |core| {
                core.set_field_validation(field, validation)
            })
            .is_some()
        {
            self.rerender_fields(Some(std::slice::from_ref(field)));
        }
    }

    pub fn reset_field_messages(
        &self,
        field: &FieldId,
        messages: Vec<FieldMessage>,
        options: MessageOptions,
    ) {
        let applied = self.mutate("reset_field_messages", |core| {
            core.reset_field_messages(field, messages)
        });
        if applied.is_some() && !options.skip_rerender {
            self.rerender_fields(Some(std::slice::from_ref(field)));
        }
    }

    pub fn add_field_messages(
        &self,
        field: &FieldId,
        messages: Vec<FieldMessage>,
        options: MessageOptions,
    ) {
        let applied = self.mutate("add_field_messages", |core| {
            core.add_field_messages(field, messages)
        });
        if applied.is_some() && !options.skip_rerender {
            self.rerender_fields(Some(std::slice::from_ref(field)));
        }
    }

    /// Validate one field now, returns true when it has no error
    pub fn validate_field(&self, field: &FieldId) -> bool {
        let valid = self.mutate("validate_field", |core| core.validate_field(field));
        self.rerender_fields(Some(std::slice::from_ref(field)));
        valid.unwrap_or(false)
    }

    /// Validate every field, returns true when the form has no error
    pub fn submit(&self) -> bool {
        let valid = self.mutate("submit", FormCore::validate);
        self.rerender_fields(None);
        valid.unwrap_or(false)
    }

    pub(crate) fn versions(&self) -> &VersionStore {
        &self.inner.versions
    }

    fn upgrade(inner: &Weak<FormInner>) -> Option<FormCtrl> {
        inner.upgrade().map(|inner| FormCtrl { inner })
    }

    /// Run `op` on the core unless the form is destroyed. The borrow ends before any bump.
    fn mutate<R>(&self, op: &str, f: impl FnOnce(&mut FormCore) -> R) -> Option<R> {
        if self.is_destroyed() {
            tracing::debug!("{op} on destroyed form `{}` ignored", self.inner.id);
            return None;
        }
        let mut core = self.inner.core.borrow_mut();
        Some(f(&mut core))
    }
}

impl fmt::Debug for FormCtrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormCtrl")
            .field("id", &self.inner.id)
            .field("destroyed", &self.is_destroyed())
            .field("versions", &self.inner.versions)
            .finish()
    }
}
