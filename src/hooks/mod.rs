//! Component-side hooks

mod use_form;

pub use use_form::{UseForm, UseFormOptions};
