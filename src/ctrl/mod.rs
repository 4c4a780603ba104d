//! Form controller: field storage, validation and the form registry

mod engine;
mod field;
pub mod registry;

pub use engine::FormCore;
pub use field::{
    is_empty_value, BlurEvent, ChangeEvent, FieldData, FieldId, FieldMessage, FieldValidation,
    FormId, FormOptions, FormValues, MessageKind, MessageOptions, Required, RequiredValidate,
    ValidationEvent, Validator,
};
