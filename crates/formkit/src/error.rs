#![forbid(unsafe_code)]

//! Controller errors.
//!
//! Expected user-input problems (empty required fields, failed validations)
//! are never errors: they are recorded in the form state and reported through
//! `on_submit_error`. [`FormError`] covers programming mistakes only.

use std::fmt;

use crate::field::FieldKind;

/// Errors returned by [`FormController`](crate::FormController) operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    /// No field with this name is declared.
    UnknownField(String),
    /// No submit, reset or button element with this id is declared.
    UnknownElement(String),
    /// The operation does not apply to the field's kind.
    KindMismatch {
        field: String,
        expected: FieldKind,
        found: FieldKind,
    },
    /// Two fields or controls share a name.
    DuplicateName(String),
}

impl fmt::Display for FormError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormError::UnknownField(name) => write!(f, "unknown field: {name}"),
            FormError::UnknownElement(id) => write!(f, "unknown element: {id}"),
            FormError::KindMismatch {
                field,
                expected,
                found,
            } => write!(f, "field {field} is a {found} field, expected {expected}"),
            FormError::DuplicateName(name) => write!(f, "duplicate name: {name}"),
        }
    }
}

impl std::error::Error for FormError {}

/// Result alias for controller operations.
pub type FormResult<T> = Result<T, FormError>;
