//! Form acquisition for a consuming component
//!
//! A component owns one [`UseForm`] for its whole mounted life and calls
//! [`UseForm::use_form`] on every render pass. Dropping it is the unmount.

use crate::change::ChangeDetector;
use crate::ctrl::{FieldId, FieldValidation, FormId, FormOptions, FormValues, ValidationEvent};
use crate::form::FormCtrl;
use std::collections::HashMap;
use std::rc::Rc;

/// Options of [`UseForm::use_form`].
///
/// `values` and `add_values` are compared by reference between passes. Pass the same `Rc` while
/// nothing changed: a new `Rc` resets (`values`) or merges (`add_values`) even with equal contents.
#[derive(Debug, Clone, Default)]
pub struct UseFormOptions {
    pub validation_event: Option<ValidationEvent>,
    pub validation: HashMap<FieldId, FieldValidation>,
    /// Keep the form registered after this consumer unmounts
    pub keep_after_unmount: bool,
    /// Initial values, a new reference resets the whole form
    pub values: Option<Rc<FormValues>>,
    /// Values merged into the form, a new reference merges them again
    pub add_values: Option<Rc<FormValues>>,
}

impl UseFormOptions {
    fn construct_options(&self) -> FormOptions {
        let values = match (&self.values, &self.add_values) {
            (None, None) => None,
            (values, add_values) => {
                let mut merged = values.as_deref().cloned().unwrap_or_default();
                merged.extend(add_values.as_deref().cloned().unwrap_or_default());
                Some(merged)
            }
        };
        FormOptions {
            values,
            validation: self.validation.clone(),
            validation_event: self.validation_event,
        }
    }
}

/// Form that was handed out on the last pass, released on teardown
#[derive(Debug)]
struct Acquired {
    form: FormCtrl,
    keep_after_unmount: bool,
}

impl Acquired {
    fn release(self) {
        if !self.keep_after_unmount {
            self.form.destroy();
        }
    }
}

/// Per-consumer state of form acquisition
#[derive(Debug, Default)]
pub struct UseForm {
    values: ChangeDetector<Option<Rc<FormValues>>>,
    add_values: ChangeDetector<Option<Rc<FormValues>>>,
    acquired: Option<Acquired>,
}

impl UseForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve the form registered under `form_id`, creating it when absent, and reconcile the
    /// caller's values with it. Runs on every pass, the form may be shared with other consumers.
    pub fn use_form(&mut self, form_id: &FormId, options: &UseFormOptions) -> FormCtrl {
        let form = FormCtrl::get(form_id)
            .unwrap_or_else(|| FormCtrl::new(form_id.clone(), options.construct_options()));

        if self.values.changed(&options.values) {
            form.reset_values(options.values.as_deref().cloned().unwrap_or_default());
        }
        if self.add_values.changed(&options.add_values) {
            if let Some(add_values) = options.add_values.as_deref() {
                form.set_values(add_values.clone());
            }
        }

        self.commit(&form, options.keep_after_unmount);
        form
    }

    /// Form handed out on the last pass
    pub fn form(&self) -> Option<&FormCtrl> {
        self.acquired.as_ref().map(|a| &a.form)
    }

    /// Tear down: destroys the form unless it was acquired with `keep_after_unmount`
    pub fn unmount(mut self) {
        self.release();
    }

    /// The previous form is released whenever the form or the keep flag differ from the last pass
    fn commit(&mut self, form: &FormCtrl, keep_after_unmount: bool) {
        let same = self.acquired.as_ref().is_some_and(|a| {
            a.form.ptr_eq(form) && a.keep_after_unmount == keep_after_unmount
        });
        if same {
            return;
        }
        self.release();
        self.acquired = Some(Acquired {
            form: form.clone(),
            keep_after_unmount,
        });
    }

    fn release(&mut self) {
        if let Some(acquired) = self.acquired.take() {
            acquired.release();
        }
    }
}

impl Drop for UseForm {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn values(pairs: &[(&str, serde_json::Value)]) -> Rc<FormValues> {
        Rc::new(
            pairs
                .iter()
                .map(|(k, v)| (FieldId::from(*k), v.clone()))
                .collect(),
        )
    }

    mod acquisition {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn test_creates_form_with_merged_values() {
            let mut hook = UseForm::new();
            let options = UseFormOptions {
                values: Some(values(&[("a", json!(1)), ("b", json!(1))])),
                add_values: Some(values(&[("b", json!(2))])),
                ..Default::default()
            };
            let form = hook.use_form(&"hook-merged".into(), &options);
            assert_eq!(form.value(&"a".into()), Some(json!(1)));
            assert_eq!(form.value(&"b".into()), Some(json!(2)));
            // Nothing re-applied on the first pass
            assert_eq!(form.get_version(&"a".into()), None);
        }

        #[test]
        fn test_reuses_registered_form() {
            let existing = FormCtrl::new("hook-existing", FormOptions::default());
            let mut hook = UseForm::new();
            let form = hook.use_form(&"hook-existing".into(), &UseFormOptions::default());
            assert!(form.ptr_eq(&existing));
            hook.unmount();
            assert!(existing.is_destroyed());
        }

        #[test]
        fn test_same_form_across_passes() {
            let mut hook = UseForm::new();
            let options = UseFormOptions::default();
            let first = hook.use_form(&"hook-passes".into(), &options);
            let second = hook.use_form(&"hook-passes".into(), &options);
            assert!(first.ptr_eq(&second));
            assert!(!first.is_destroyed());
            assert!(hook.form().unwrap().ptr_eq(&first));
        }
    }

    mod reconciliation {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn test_new_values_reference_resets() {
            let mut hook = UseForm::new();
            let id = FormId::from("hook-reset");
            let mut options = UseFormOptions {
                values: Some(values(&[("a", json!(1))])),
                ..Default::default()
            };
            let form = hook.use_form(&id, &options);
            form.handle_change(&"b".into(), &"typed".into());

            options.values = Some(values(&[("a", json!(1))]));
            hook.use_form(&id, &options);
            assert_eq!(form.value(&"b".into()), None);
            assert_eq!(form.value(&"a".into()), Some(json!(1)));
        }

        #[test]
        fn test_same_values_reference_keeps_state() {
            let mut hook = UseForm::new();
            let id = FormId::from("hook-keep-state");
            let options = UseFormOptions {
                values: Some(values(&[("a", json!(1))])),
                ..Default::default()
            };
            let form = hook.use_form(&id, &options);
            form.handle_change(&"a".into(), &json!(5).into());
            hook.use_form(&id, &options.clone());
            assert_eq!(form.value(&"a".into()), Some(json!(5)));
        }

        #[test]
        fn test_dropping_values_resets_to_empty() {
            let mut hook = UseForm::new();
            let id = FormId::from("hook-drop-values");
            let mut options = UseFormOptions {
                values: Some(values(&[("a", json!(1))])),
                ..Default::default()
            };
            let form = hook.use_form(&id, &options);
            options.values = None;
            hook.use_form(&id, &options);
            assert!(form.values().is_empty());
        }

        #[test]
        fn test_new_add_values_reference_merges() {
            let mut hook = UseForm::new();
            let id = FormId::from("hook-merge");
            let mut options = UseFormOptions {
                values: Some(values(&[("a", json!(1)), ("b", json!(1))])),
                ..Default::default()
            };
            let form = hook.use_form(&id, &options);
            form.handle_change(&"a".into(), &json!(7).into());

            options.add_values = Some(values(&[("b", json!(2))]));
            hook.use_form(&id, &options);
            assert_eq!(form.value(&"a".into()), Some(json!(7)));
            assert_eq!(form.value(&"b".into()), Some(json!(2)));

            // Removing add_values never merges anything
            options.add_values = None;
            hook.use_form(&id, &options);
            assert_eq!(form.value(&"b".into()), Some(json!(2)));
        }

        #[test]
        fn test_fresh_references_every_pass_reset_every_pass() {
            let mut hook = UseForm::new();
            let id = FormId::from("hook-churn");
            let form = hook.use_form(
                &id,
                &UseFormOptions {
                    values: Some(values(&[("a", json!(1))])),
                    ..Default::default()
                },
            );
            for _ in 0..3 {
                form.handle_change(&"a".into(), &json!(2).into());
                hook.use_form(
                    &id,
                    &UseFormOptions {
                        values: Some(values(&[("a", json!(1))])),
                        ..Default::default()
                    },
                );
                assert_eq!(form.value(&"a".into()), Some(json!(1)));
            }
        }
    }

    mod teardown {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn test_unmount_destroys_and_next_acquire_is_fresh() {
            let id = FormId::from("hook-shared");
            let options = UseFormOptions::default();
            let mut first = UseForm::new();
            let mut second = UseForm::new();
            let form = first.use_form(&id, &options);
            let shared = second.use_form(&id, &options);
            assert!(form.ptr_eq(&shared));
            form.rerender_fields(Some(&[FieldId::from("email")]));

            first.unmount();
            assert!(form.is_destroyed());
            assert!(FormCtrl::get(&id).is_none());
            assert_eq!(shared.field_data(&"email".into()), None);

            let mut third = UseForm::new();
            let fresh = third.use_form(&id, &options);
            assert!(!fresh.ptr_eq(&form));
            assert_eq!(fresh.get_version(&"email".into()), None);

            // The second consumer moves to the live form on its next pass
            let moved = second.use_form(&id, &options);
            assert!(moved.ptr_eq(&fresh));
            assert!(!fresh.is_destroyed());
        }

        #[test]
        fn test_keep_after_unmount() {
            let id = FormId::from("hook-kept");
            let options = UseFormOptions {
                keep_after_unmount: true,
                ..Default::default()
            };
            let mut hook = UseForm::new();
            let form = hook.use_form(&id, &options);
            drop(hook);
            assert!(!form.is_destroyed());
            assert!(FormCtrl::get(&id).unwrap().ptr_eq(&form));
            form.destroy();
        }

        #[test]
        fn test_drop_is_unmount() {
            let id = FormId::from("hook-dropped");
            let mut hook = UseForm::new();
            let form = hook.use_form(&id, &UseFormOptions::default());
            drop(hook);
            assert!(form.is_destroyed());
        }

        #[test]
        fn test_clearing_keep_flag_releases_with_previous_setting() {
            let id = FormId::from("hook-flag");
            let mut hook = UseForm::new();
            let mut options = UseFormOptions::default();
            let form = hook.use_form(&id, &options);

            options.keep_after_unmount = true;
            hook.use_form(&id, &options);
            // The pass before did not ask to keep the form
            assert!(form.is_destroyed());

            let replacement = hook.use_form(&id, &options);
            assert!(!replacement.ptr_eq(&form));
            drop(hook);
            assert!(!replacement.is_destroyed());
            replacement.destroy();
        }
    }
}
