//! Field binding for presentational views

mod props;
mod with_form;

pub use props::{
    ControlledChildProps, FieldCallback, FieldChildProps, FieldProps, FormRef, Handler,
    WithFormParams,
};
pub use with_form::{
    with_form, with_form_controlled, ControlledFieldView, FieldView, MountedControlledField,
    MountedField, WithForm, WithFormControlled, UNKNOWN_FIELD, UNKNOWN_FORM,
};
