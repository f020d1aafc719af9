//! Validation primitives for formkit.
//!
//! # Role in formkit
//! `formkit-validation` holds everything about *judging* a value that does not
//! depend on the form itself: composable synchronous validators, the
//! [`FieldValidity`] accumulator that field validators fill in, and the
//! [`AsyncValidationCoordinator`] that keeps late async results from
//! overwriting newer ones.
//!
//! # Example
//!
//! ```rust
//! use formkit_validation::{And, FieldValidity, MinLength, Required, Validator};
//!
//! let username = And::new(Required::new(), MinLength::new(3));
//! assert!(username.validate("alice").is_valid());
//!
//! let validity: FieldValidity = username.validate("ab").into();
//! assert_eq!(validity.error_messages(), ["Must be at least 3 characters"]);
//! ```
//!
//! # Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `serde` | `Serialize` for [`FieldValidity`] |

#![forbid(unsafe_code)]

pub mod async_validation;
pub mod validators;
pub mod validity;

pub use async_validation::{
    AsyncValidationCoordinator, InFlightValidation, ValidationEvent, ValidationToken,
    ValidationTrace,
};
pub use validators::{
    // Composition
    All,
    And,
    // Error codes
    ERROR_CODE_EMAIL,
    ERROR_CODE_INTEGER,
    ERROR_CODE_MAX_LENGTH,
    ERROR_CODE_MIN_LENGTH,
    ERROR_CODE_NOT,
    ERROR_CODE_REQUIRED,
    ERROR_CODE_RESOURCE_NAME,
    ERROR_CODE_URL,
    // Built-in validators
    Email,
    Integer,
    LengthBetween,
    MaxLength,
    MinLength,
    Not,
    Or,
    Required,
    ResourceName,
    Url,
    // Core types
    ValidationError,
    ValidationResult,
    Validator,
};
pub use validity::FieldValidity;
