//! Wrap a view into a form field
//!
//! [`with_form`] and [`with_form_controlled`] bind a presentational view to one field of a form.
//! Mounting the wrapped view gives a per-instance state that resolves the form and field once,
//! registers messages and rules, re-applies changed configuration on later passes and builds the
//! change and blur callbacks. The controlled variant also injects live field data and reports
//! when the field changed since its last render.

use super::props::{
    ControlledChildProps, FieldCallback, FieldChildProps, FieldProps, FormRef, WithFormParams,
};
use crate::change::ChangeDetector;
use crate::ctrl::{
    BlurEvent, ChangeEvent, FieldId, FieldMessage, FieldValidation, FormOptions, MessageOptions,
    Required,
};
use crate::form::{FieldWatch, FormCtrl};
use std::rc::Rc;

/// Id of the placeholder form used by fields bound to no form
pub const UNKNOWN_FORM: &str = "_unknown_";

/// Field id used by fields that name no field
pub const UNKNOWN_FIELD: &str = "_unknown_field_";

const SKIP_RERENDER: MessageOptions = MessageOptions {
    skip_rerender: true,
};

/// View wrapped by [`with_form`]
#[cfg_attr(test, mockall::automock(type Rest = (); type Output = String;))]
pub trait FieldView {
    /// Caller props passed through untouched
    type Rest;
    type Output;

    fn view(&self, props: FieldChildProps<Self::Rest>) -> Self::Output;
}

/// View wrapped by [`with_form_controlled`]
pub trait ControlledFieldView {
    type Rest;
    type Output;

    fn view(&self, props: ControlledChildProps<Self::Rest>) -> Self::Output;
}

/// Wrap `view` so it forwards change and blur events into a form field
pub fn with_form<V: FieldView>(view: V, params: WithFormParams) -> WithForm<V> {
    WithForm {
        view: Rc::new(view),
        params: Rc::new(params),
    }
}

/// Like [`with_form`], additionally injecting live field data and tracking its changes
pub fn with_form_controlled<V: ControlledFieldView>(
    view: V,
    params: WithFormParams,
) -> WithFormControlled<V> {
    WithFormControlled {
        view: Rc::new(view),
        params: Rc::new(params),
    }
}

pub struct WithForm<V> {
    view: Rc<V>,
    params: Rc<WithFormParams>,
}

impl<V> Clone for WithForm<V> {
    fn clone(&self) -> Self {
        Self {
            view: Rc::clone(&self.view),
            params: Rc::clone(&self.params),
        }
    }
}

impl<V: FieldView> WithForm<V> {
    /// Create the state of one mounted instance
    pub fn mount(&self) -> MountedField<V> {
        MountedField {
            view: Rc::clone(&self.view),
            params: Rc::clone(&self.params),
            binding: FieldBinding::default(),
        }
    }
}

pub struct WithFormControlled<V> {
    view: Rc<V>,
    params: Rc<WithFormParams>,
}

impl<V> Clone for WithFormControlled<V> {
    fn clone(&self) -> Self {
        Self {
            view: Rc::clone(&self.view),
            params: Rc::clone(&self.params),
        }
    }
}

impl<V: ControlledFieldView> WithFormControlled<V> {
    pub fn mount(&self) -> MountedControlledField<V> {
        MountedControlledField {
            view: Rc::clone(&self.view),
            params: Rc::clone(&self.params),
            binding: FieldBinding::default(),
            watch: None,
            notify: None,
        }
    }

    /// Mount with a callback the host uses to schedule a render when the field changes
    pub fn mount_with_notify(&self, notify: impl Fn() + 'static) -> MountedControlledField<V> {
        let mut mounted = self.mount();
        mounted.notify = Some(Rc::new(notify));
        mounted
    }
}

/// One mounted uncontrolled field. Dropping it is the unmount.
pub struct MountedField<V> {
    view: Rc<V>,
    params: Rc<WithFormParams>,
    binding: FieldBinding,
}

impl<V: FieldView> MountedField<V> {
    /// One render pass
    pub fn render(&mut self, props: FieldProps<V::Rest>) -> V::Output {
        let child = self.binding.prepare(&self.params, props);
        self.view.view(child)
    }

    /// Form this instance resolved on its first render
    pub fn form(&self) -> Option<&FormCtrl> {
        self.binding.form()
    }

    pub fn field(&self) -> Option<&FieldId> {
        self.binding.field()
    }
}

/// One mounted controlled field. Dropping it is the unmount and ends the subscription.
pub struct MountedControlledField<V> {
    view: Rc<V>,
    params: Rc<WithFormParams>,
    binding: FieldBinding,
    watch: Option<FieldWatch>,
    notify: Option<Rc<dyn Fn()>>,
}

impl<V: ControlledFieldView> MountedControlledField<V> {
    /// One render pass, reading fresh field data
    pub fn render(&mut self, props: FieldProps<V::Rest>) -> V::Output {
        let base = self.binding.prepare(&self.params, props);
        let (form, field) = self.binding.resolved();

        let watch = self.watch.get_or_insert_with(|| match self.notify.clone() {
            Some(notify) => form.watch_field_with(field.clone(), move || notify()),
            None => form.watch_field(field.clone()),
        });
        let data = form.field_data(field);
        watch.mark_rendered(form);

        self.view.view(ControlledChildProps { base, data })
    }

    /// True when the bound field changed since the last render. Always true before the first one.
    pub fn needs_render(&self) -> bool {
        self.watch
            .as_ref()
            .map_or(true, FieldWatch::changed_since_render)
    }

    /// Tear down and end the subscription. Dropping does the same.
    pub fn unmount(mut self) {
        if let Some(watch) = self.watch.take() {
            watch.release();
        }
    }

    pub fn form(&self) -> Option<&FormCtrl> {
        self.binding.form()
    }

    pub fn field(&self) -> Option<&FieldId> {
        self.binding.field()
    }
}

/// State shared by both variants for one mounted instance
#[derive(Default)]
struct FieldBinding {
    resolved: Option<(FormCtrl, FieldId)>,
    messages: ChangeDetector<Option<Rc<Vec<FieldMessage>>>>,
    validation: ChangeDetector<Option<Rc<FieldValidation>>>,
    required: ChangeDetector<Option<Required>>,
}

impl FieldBinding {
    fn form(&self) -> Option<&FormCtrl> {
        self.resolved.as_ref().map(|(form, _)| form)
    }

    fn field(&self) -> Option<&FieldId> {
        self.resolved.as_ref().map(|(_, field)| field)
    }

    /// Only valid after `prepare`
    fn resolved(&self) -> (&FormCtrl, &FieldId) {
        match &self.resolved {
            Some((form, field)) => (form, field),
            None => unreachable!("field binding used before its first render"),
        }
    }

    fn prepare<R>(&mut self, params: &WithFormParams, props: FieldProps<R>) -> FieldChildProps<R> {
        let FieldProps {
            form: form_ref,
            field: field_id,
            validation,
            messages,
            name,
            required,
            on_change,
            on_blur,
            rest,
        } = props;
        let validation = validation.or_else(|| params.validation.clone());
        let messages = messages.or_else(|| params.messages.clone());
        let required = required.or_else(|| params.required.clone());
        let name = name.or_else(|| params.name.clone());

        // Form and field are pinned by the first pass
        let (form, field) = &*self.resolved.get_or_insert_with(|| {
            let form = resolve_form(form_ref.or_else(|| params.form.clone()));
            let field = field_id
                .or_else(|| params.field.clone())
                .unwrap_or_else(|| FieldId::from(UNKNOWN_FIELD));
            register_field(&form, &field, params, &messages, &validation, &required);
            (form, field)
        });

        // Checked on every pass so each detector sees every value
        if self.messages.changed(&messages) {
            if let Some(messages) = &messages {
                form.reset_field_messages(field, messages.to_vec(), SKIP_RERENDER);
            }
        }
        if self.validation.changed(&validation) {
            if let Some(validation) = &validation {
                form.set_field_validation(field, FieldValidation::clone(validation));
            }
        }
        if self.required.changed(&required) {
            form.set_field_validation(
                field,
                FieldValidation::required(required.clone().unwrap_or_default()),
            );
        }

        let change_form = form.clone();
        let change_field = field.clone();
        let blur_form = form.clone();
        let blur_field = field.clone();

        FieldChildProps {
            rest,
            name: name
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| field.to_string()),
            required: required.as_ref().is_some_and(Required::is_required),
            on_change: FieldCallback::new(on_change, move |event: &ChangeEvent| {
                change_form.handle_change(&change_field, event)
            }),
            on_blur: FieldCallback::new(on_blur, move |_: &BlurEvent| {
                blur_form.handle_blur(&blur_field)
            }),
        }
    }
}

/// Explicit form, then registry lookup by id, then the shared placeholder form.
///
/// The placeholder only exists so a field can be rendered before it is wired to a real form.
fn resolve_form(form: Option<FormRef>) -> FormCtrl {
    let found = match form {
        Some(FormRef::Ctrl(form)) => return form,
        Some(FormRef::Id(id)) => FormCtrl::get(&id),
        None => None,
    };
    found
        .or_else(|| FormCtrl::get(&UNKNOWN_FORM.into()))
        .unwrap_or_else(|| {
            tracing::debug!("field bound to no form, using placeholder `{UNKNOWN_FORM}`");
            FormCtrl::new(UNKNOWN_FORM, FormOptions::default())
        })
}

/// First-render registration of messages and rules
fn register_field(
    form: &FormCtrl,
    field: &FieldId,
    params: &WithFormParams,
    messages: &Option<Rc<Vec<FieldMessage>>>,
    validation: &Option<Rc<FieldValidation>>,
    required: &Option<Required>,
) {
    if let Some(messages) = messages {
        form.reset_field_messages(field, messages.to_vec(), SKIP_RERENDER);
    }
    let mut rules = FieldValidation {
        required_validate: params.required_validate.clone(),
        ..Default::default()
    };
    if let Some(validation) = validation {
        rules.merge(FieldValidation::clone(validation));
    }
    rules.required = Some(required.clone().unwrap_or_default());
    form.set_field_validation(field, rules);
}
