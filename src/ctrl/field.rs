//! Field value objects shared by the controller and the bindings

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::borrow::Borrow;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::rc::Rc;

/// Key naming a field within one form
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldId(String);

impl FieldId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FieldId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for FieldId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl Borrow<str> for FieldId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Registry key of a form
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormId(String);

impl FormId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Random id for forms nobody looks up by name
    pub fn generate() -> Self {
        Self(format!("form-{}", uuid::Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FormId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FormId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for FormId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Field values of a whole form
pub type FormValues = BTreeMap<FieldId, Value>;

/// Severity of a field message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Error,
    Warning,
    Info,
}

/// A message attached to a field, either supplied from outside or produced by validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMessage {
    pub kind: MessageKind,
    pub text: String,
}

impl FieldMessage {
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::Error,
            text: text.into(),
        }
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::Warning,
            text: text.into(),
        }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::Info,
            text: text.into(),
        }
    }
}

/// Options for message operations
#[derive(Debug, Clone, Copy, Default)]
pub struct MessageOptions {
    /// Do not invalidate the field after changing its messages
    pub skip_rerender: bool,
}

/// Whether a field must be filled in
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Required {
    #[default]
    No,
    Yes,
    /// Required, reporting this text instead of the default message
    WithMessage(String),
}

impl Required {
    pub fn is_required(&self) -> bool {
        !matches!(self, Required::No)
    }

    pub(crate) fn message(&self) -> Option<FieldMessage> {
        match self {
            Required::No => None,
            Required::Yes => Some(FieldMessage::error("This field is required")),
            Required::WithMessage(text) => Some(FieldMessage::error(text.clone())),
        }
    }
}

impl From<bool> for Required {
    fn from(required: bool) -> Self {
        if required {
            Required::Yes
        } else {
            Required::No
        }
    }
}

/// Decides whether a value counts as "not filled in"
pub type RequiredValidate = Rc<dyn Fn(&Value) -> bool>;

/// Custom rule producing a message for an invalid value
pub type Validator = Rc<dyn Fn(&Value, &FormValues) -> Option<FieldMessage>>;

/// Default emptiness check used by required fields
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

/// Validation rules of one field.
///
/// Applying a `FieldValidation` on top of an existing one is a partial update: `None` parts keep
/// the previous setting and an empty `validators` list keeps the previous validators.
#[derive(Clone, Default)]
pub struct FieldValidation {
    pub required: Option<Required>,
    pub required_validate: Option<RequiredValidate>,
    pub validators: Vec<Validator>,
}

impl FieldValidation {
    pub fn required(required: impl Into<Required>) -> Self {
        Self {
            required: Some(required.into()),
            ..Default::default()
        }
    }

    pub fn with_validator(
        mut self,
        validator: impl Fn(&Value, &FormValues) -> Option<FieldMessage> + 'static,
    ) -> Self {
        self.validators.push(Rc::new(validator));
        self
    }

    pub fn with_required_validate(mut self, check: impl Fn(&Value) -> bool + 'static) -> Self {
        self.required_validate = Some(Rc::new(check));
        self
    }

    pub(crate) fn merge(&mut self, update: FieldValidation) {
        if let Some(required) = update.required {
            self.required = Some(required);
        }
        if let Some(check) = update.required_validate {
            self.required_validate = Some(check);
        }
        if !update.validators.is_empty() {
            self.validators = update.validators;
        }
    }

    pub(crate) fn is_required(&self) -> bool {
        self.required.as_ref().is_some_and(Required::is_required)
    }
}

impl fmt::Debug for FieldValidation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldValidation")
            .field("required", &self.required)
            .field("required_validate", &self.required_validate.is_some())
            .field("validators", &self.validators.len())
            .finish()
    }
}

/// When field validation runs on its own
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationEvent {
    #[default]
    Change,
    Blur,
    /// Only an explicit `validate` call runs the rules
    Submit,
}

/// Construction options of a form
#[derive(Debug, Clone, Default)]
pub struct FormOptions {
    pub values: Option<FormValues>,
    pub validation: HashMap<FieldId, FieldValidation>,
    pub validation_event: Option<ValidationEvent>,
}

/// Point-in-time read of one field
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FieldData {
    pub value: Value,
    pub messages: Vec<FieldMessage>,
    pub error: bool,
    pub warning: bool,
    pub required: bool,
    pub touched: bool,
    pub dirty: bool,
}

impl FieldData {
    /// Value rendered as plain text
    pub fn display_value(&self) -> String {
        match &self.value {
            Value::Null => String::new(),
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// Change event forwarded into a form
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    pub value: Value,
}

impl ChangeEvent {
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
        }
    }
}

impl From<Value> for ChangeEvent {
    fn from(value: Value) -> Self {
        Self { value }
    }
}

impl From<&str> for ChangeEvent {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ChangeEvent {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<bool> for ChangeEvent {
    fn from(value: bool) -> Self {
        Self::new(value)
    }
}

/// Focus left a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BlurEvent;
