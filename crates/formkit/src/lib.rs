//! Form state and submission control.
//!
//! # Role in formkit
//! `formkit` manages one mounted form: it seeds field values from their
//! descriptors, tracks which fields were touched or are mid-edit, re-checks
//! required fields and runs field validators on blur, and only calls the
//! submit callback once every check has settled and passed.
//!
//! # How it fits in the system
//! Rendering is the host's job. The host declares the form as a tree of
//! [`FormElement`]s, forwards user input to a [`FormController`] (directly or
//! as [`FormEvent`]s), and reads back values and [`check_error`] results to
//! draw the fields. Validators come from `formkit-validation`, re-exported
//! here.
//!
//! [`check_error`]: FormController::check_error
//!
//! # Example
//!
//! ```rust
//! use formkit::{FieldDescriptor, FieldValidity, FormController, FormElement, SubmitStatus};
//!
//! let mut form = FormController::new([
//!     FieldDescriptor::text("name")
//!         .required("Name is required")
//!         .validation(|value, _| async move {
//!             let mut validity = FieldValidity::valid();
//!             if value.as_text() == Some("admin") {
//!                 validity.push_error("This name is reserved");
//!             }
//!             validity
//!         })
//!         .into(),
//!     FormElement::submit("save"),
//! ])
//! .unwrap();
//!
//! form.handle_change("name", "admin").unwrap();
//! let applied = pollster::block_on(form.blur("name")).unwrap();
//! assert!(applied);
//! assert_eq!(form.field_errors("name").unwrap(), ["This name is reserved"]);
//! assert_eq!(form.submit(), SubmitStatus::Blocked);
//! ```
//!
//! # Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `serde` | `Serialize`/`Deserialize` for [`FieldValue`] and [`FormValues`] |

#![forbid(unsafe_code)]

pub mod config;
pub mod controller;
pub mod error;
pub mod event;
pub mod field;
pub mod state;
pub mod value;

pub use config::{DEFAULT_TRACE_CAPACITY, FormConfig};
pub use controller::{CompletedValidation, FormController, PendingValidation};
pub use error::{FormError, FormResult};
pub use event::FormEvent;
pub use field::{
    AsyncFieldValidator, ClickFn, DisplayErrorOn, FieldDescriptor, FieldKind, FormElement,
    ListenFn, ValidationFuture,
};
pub use state::{FormState, RequiredMap, SubmitStatus, SyncReason, ValidityMap};
pub use value::{FieldValue, FormValues, TOGGLE_OFF, TOGGLE_ON};

pub use formkit_validation as validation;
pub use formkit_validation::{FieldValidity, ValidationToken, Validator};
