//! form-ctrl - field-granular change signalling for form controllers
//!
//! A form keeps a version counter per field. Operations on the form bump only the fields they
//! touched, so views bound to other fields are never asked to re-render. On top of that sit form
//! acquisition for consuming components ([`hooks::UseForm`]) and wrappers binding a view to one
//! field ([`binding::with_form`], [`binding::with_form_controlled`]).

pub mod binding;
pub mod change;
pub mod config;
pub mod ctrl;
pub mod error;
pub mod form;
pub mod hooks;
pub mod store;

pub use binding::{with_form, with_form_controlled, FieldProps, WithFormParams};
pub use error::{FormError, Result};
pub use form::{FieldWatch, FormCtrl};
pub use hooks::{UseForm, UseFormOptions};
pub use store::{Subscription, VersionStore};
