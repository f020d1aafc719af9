#![forbid(unsafe_code)]

//! Per-field validity accumulator.

use crate::validators::ValidationResult;

/// Accumulated outcome of validating one field.
///
/// A field validator starts from [`FieldValidity::valid`] and records problems
/// with [`push_error`](Self::push_error). Messages keep insertion order.
///
/// # Invariants
///
/// - `is_valid() == false` implies at least one error message.
/// - Messages are never reordered or deduplicated.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct FieldValidity {
    error_messages: Vec<String>,
    is_valid: bool,
}

impl Default for FieldValidity {
    fn default() -> Self {
        Self::valid()
    }
}

impl FieldValidity {
    /// A passing result with no messages.
    #[must_use]
    pub const fn valid() -> Self {
        Self {
            error_messages: Vec::new(),
            is_valid: true,
        }
    }

    /// A failing result with a single message.
    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        let mut validity = Self::valid();
        validity.push_error(message);
        validity
    }

    /// Record an error message and mark the field invalid.
    pub fn push_error(&mut self, message: impl Into<String>) {
        self.error_messages.push(message.into());
        self.is_valid = false;
    }

    /// Builder form of [`push_error`](Self::push_error).
    #[must_use]
    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.push_error(message);
        self
    }

    /// Append the messages of `other`, failing if either failed.
    pub fn merge(&mut self, other: FieldValidity) {
        self.error_messages.extend(other.error_messages);
        self.is_valid &= other.is_valid;
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    #[must_use]
    pub fn error_messages(&self) -> &[String] {
        &self.error_messages
    }
}

impl From<ValidationResult> for FieldValidity {
    fn from(result: ValidationResult) -> Self {
        match result {
            ValidationResult::Valid => Self::valid(),
            ValidationResult::Invalid(err) => Self::invalid(err.format_message()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validators::{MinLength, Validator};

    #[test]
    fn starts_valid() {
        let v = FieldValidity::default();
        assert!(v.is_valid());
        assert!(v.error_messages().is_empty());
    }

    #[test]
    fn push_error_marks_invalid_in_order() {
        let mut v = FieldValidity::valid();
        v.push_error("first");
        v.push_error("second");
        assert!(!v.is_valid());
        assert_eq!(v.error_messages(), ["first", "second"]);
    }

    #[test]
    fn merge_keeps_failure() {
        let mut v = FieldValidity::valid();
        v.merge(FieldValidity::valid());
        assert!(v.is_valid());
        v.merge(FieldValidity::invalid("taken"));
        v.merge(FieldValidity::valid());
        assert!(!v.is_valid());
        assert_eq!(v.error_messages(), ["taken"]);
    }

    #[test]
    fn from_validation_result() {
        let v: FieldValidity = MinLength::new(4).validate("abc").into();
        assert_eq!(v.error_messages(), ["Must be at least 4 characters"]);
        assert!(FieldValidity::from(ValidationResult::Valid).is_valid());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serializes_camel_case() {
        let json = serde_json::to_string(&FieldValidity::invalid("bad")).unwrap();
        assert_eq!(json, r#"{"errorMessages":["bad"],"isValid":false}"#);
    }
}
