//! Props accepted by wrapped fields and props handed to the wrapped view

use crate::ctrl::{
    BlurEvent, ChangeEvent, FieldData, FieldId, FieldMessage, FieldValidation, FormId, Required,
    RequiredValidate,
};
use crate::form::FormCtrl;
use std::fmt;
use std::rc::Rc;

/// Caller-supplied event handler. An error is returned to whoever fired the event, unchanged.
pub type Handler<E> = Rc<dyn Fn(&E) -> anyhow::Result<()>>;

/// A form given directly or by registry id
#[derive(Debug, Clone)]
pub enum FormRef {
    Ctrl(FormCtrl),
    Id(FormId),
}

impl From<FormCtrl> for FormRef {
    fn from(form: FormCtrl) -> Self {
        FormRef::Ctrl(form)
    }
}

impl From<&FormCtrl> for FormRef {
    fn from(form: &FormCtrl) -> Self {
        FormRef::Ctrl(form.clone())
    }
}

impl From<FormId> for FormRef {
    fn from(id: FormId) -> Self {
        FormRef::Id(id)
    }
}

impl From<&str> for FormRef {
    fn from(id: &str) -> Self {
        FormRef::Id(id.into())
    }
}

/// Static defaults given when a view is wrapped. Props of a mounted field take precedence.
#[derive(Clone, Default)]
pub struct WithFormParams {
    pub form: Option<FormRef>,
    pub field: Option<FieldId>,
    pub validation: Option<Rc<FieldValidation>>,
    pub messages: Option<Rc<Vec<FieldMessage>>>,
    pub name: Option<String>,
    pub required: Option<Required>,
    /// Emptiness check used when the field is required
    pub required_validate: Option<RequiredValidate>,
}

impl WithFormParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn form(mut self, form: impl Into<FormRef>) -> Self {
        self.form = Some(form.into());
        self
    }

    pub fn field(mut self, field: impl Into<FieldId>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn validation(mut self, validation: Rc<FieldValidation>) -> Self {
        self.validation = Some(validation);
        self
    }

    pub fn messages(mut self, messages: Rc<Vec<FieldMessage>>) -> Self {
        self.messages = Some(messages);
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn required(mut self, required: impl Into<Required>) -> Self {
        self.required = Some(required.into());
        self
    }

    pub fn required_validate(mut self, check: RequiredValidate) -> Self {
        self.required_validate = Some(check);
        self
    }
}

impl fmt::Debug for WithFormParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WithFormParams")
            .field("form", &self.form)
            .field("field", &self.field)
            .field("validation", &self.validation)
            .field("messages", &self.messages)
            .field("name", &self.name)
            .field("required", &self.required)
            .field("required_validate", &self.required_validate.is_some())
            .finish()
    }
}

/// Props of a mounted field. `rest` is handed to the view untouched.
///
/// `form` and `field` are read on the first render only. `validation`, `messages` and `required`
/// are re-applied whenever a pass brings a different value (by reference for the `Rc` ones).
pub struct FieldProps<R> {
    pub form: Option<FormRef>,
    pub field: Option<FieldId>,
    pub validation: Option<Rc<FieldValidation>>,
    pub messages: Option<Rc<Vec<FieldMessage>>>,
    pub name: Option<String>,
    pub required: Option<Required>,
    pub on_change: Option<Handler<ChangeEvent>>,
    pub on_blur: Option<Handler<BlurEvent>>,
    pub rest: R,
}

impl<R> FieldProps<R> {
    pub fn new(rest: R) -> Self {
        Self {
            form: None,
            field: None,
            validation: None,
            messages: None,
            name: None,
            required: None,
            on_change: None,
            on_blur: None,
            rest,
        }
    }

    pub fn form(mut self, form: impl Into<FormRef>) -> Self {
        self.form = Some(form.into());
        self
    }

    pub fn field(mut self, field: impl Into<FieldId>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn validation(mut self, validation: Rc<FieldValidation>) -> Self {
        self.validation = Some(validation);
        self
    }

    pub fn messages(mut self, messages: Rc<Vec<FieldMessage>>) -> Self {
        self.messages = Some(messages);
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn required(mut self, required: impl Into<Required>) -> Self {
        self.required = Some(required.into());
        self
    }

    pub fn on_change(
        mut self,
        handler: impl Fn(&ChangeEvent) -> anyhow::Result<()> + 'static,
    ) -> Self {
        self.on_change = Some(Rc::new(handler));
        self
    }

    pub fn on_blur(
        mut self,
        handler: impl Fn(&BlurEvent) -> anyhow::Result<()> + 'static,
    ) -> Self {
        self.on_blur = Some(Rc::new(handler));
        self
    }
}

impl<R: Default> Default for FieldProps<R> {
    fn default() -> Self {
        Self::new(R::default())
    }
}

/// Event handler injected into the view.
///
/// Calls the caller's handler first, then forwards the event into the form. If the caller's
/// handler fails, its error is returned as is and the form never sees the event.
pub struct FieldCallback<E> {
    handler: Option<Handler<E>>,
    forward: Rc<dyn Fn(&E)>,
}

impl<E> FieldCallback<E> {
    pub(crate) fn new(handler: Option<Handler<E>>, forward: impl Fn(&E) + 'static) -> Self {
        Self {
            handler,
            forward: Rc::new(forward),
        }
    }

    pub fn call(&self, event: &E) -> anyhow::Result<()> {
        if let Some(handler) = &self.handler {
            handler(event)?;
        }
        (self.forward)(event);
        Ok(())
    }
}

impl<E> Clone for FieldCallback<E> {
    fn clone(&self) -> Self {
        Self {
            handler: self.handler.clone(),
            forward: Rc::clone(&self.forward),
        }
    }
}

impl<E> fmt::Debug for FieldCallback<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldCallback")
            .field("handler", &self.handler.is_some())
            .finish()
    }
}

/// Props an uncontrolled view receives
#[derive(Debug, Clone)]
pub struct FieldChildProps<R> {
    pub rest: R,
    /// Explicit `name` prop, otherwise the field id
    pub name: String,
    pub required: bool,
    pub on_change: FieldCallback<ChangeEvent>,
    pub on_blur: FieldCallback<BlurEvent>,
}

/// Props a controlled view receives
#[derive(Debug, Clone)]
pub struct ControlledChildProps<R> {
    pub base: FieldChildProps<R>,
    /// Live field data, `None` when the form was destroyed
    pub data: Option<FieldData>,
}

impl<R> ControlledChildProps<R> {
    /// Live data wins over the `required` prop
    pub fn required(&self) -> bool {
        self.data.as_ref().map_or(self.base.required, |d| d.required)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn test_callback_runs_handler_then_forwards() {
        let order: Rc<RefCell<Vec<&str>>> = Rc::default();
        let handler_log = Rc::clone(&order);
        let forward_log = Rc::clone(&order);
        let handler: Handler<BlurEvent> = Rc::new(move |_: &BlurEvent| {
            handler_log.borrow_mut().push("handler");
            Ok(())
        });
        let callback = FieldCallback::new(Some(handler), move |_: &BlurEvent| {
            forward_log.borrow_mut().push("forward")
        });
        callback.call(&BlurEvent).unwrap();
        assert_eq!(*order.borrow(), vec!["handler", "forward"]);
    }

    #[test]
    fn test_failing_handler_skips_forward() {
        let forwarded = Rc::new(RefCell::new(false));
        let flag = Rc::clone(&forwarded);
        let handler: Handler<BlurEvent> = Rc::new(|_: &BlurEvent| Err(anyhow::anyhow!("nope")));
        let callback = FieldCallback::new(Some(handler), move |_: &BlurEvent| {
            *flag.borrow_mut() = true
        });
        let err = callback.call(&BlurEvent).unwrap_err();
        assert_eq!(err.to_string(), "nope");
        assert!(!*forwarded.borrow());
    }

    #[test]
    fn test_callback_without_handler_forwards() {
        let forwarded = Rc::new(RefCell::new(0));
        let count = Rc::clone(&forwarded);
        let callback: FieldCallback<ChangeEvent> =
            FieldCallback::new(None, move |_: &ChangeEvent| *count.borrow_mut() += 1);
        callback.call(&"x".into()).unwrap();
        callback.clone().call(&"y".into()).unwrap();
        assert_eq!(*forwarded.borrow(), 2);
    }

    #[test]
    fn test_controlled_required_prefers_live_data() {
        let base = FieldChildProps {
            rest: (),
            name: "email".into(),
            required: true,
            on_change: FieldCallback::new(None, |_: &ChangeEvent| {}),
            on_blur: FieldCallback::new(None, |_: &BlurEvent| {}),
        };
        let props = ControlledChildProps {
            base: base.clone(),
            data: Some(FieldData::default()),
        };
        assert!(!props.required());
        let detached = ControlledChildProps { base, data: None };
        assert!(detached.required());
    }
}
