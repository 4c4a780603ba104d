//! Error types

use crate::ctrl::FormId;
use thiserror::Error;

/// Errors raised when form values are converted to or from other representations.
///
/// Benign conditions (unknown field, destroyed form, repeated unsubscribe) are never errors.
#[derive(Debug, Error)]
pub enum FormError {
    #[error("form values must be a JSON object, got {0}")]
    NotAnObject(&'static str),

    #[error("form `{0}` was destroyed")]
    Destroyed(FormId),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, FormError>;
