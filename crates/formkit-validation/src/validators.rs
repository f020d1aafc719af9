#![forbid(unsafe_code)]

//! Core validation types and the built-in validators used by console forms.

use std::collections::BTreeMap;
use std::fmt;

// ---------------------------------------------------------------------------
// Error codes
// ---------------------------------------------------------------------------
//
// Codes are stable keys for translated messages; the English message carried
// by each `ValidationError` is only the fallback.

/// Empty value in a [`Required`] field.
pub const ERROR_CODE_REQUIRED: &str = "required";
/// Fewer characters than [`MinLength`] allows.
pub const ERROR_CODE_MIN_LENGTH: &str = "too_short";
/// More characters than [`MaxLength`] allows.
pub const ERROR_CODE_MAX_LENGTH: &str = "too_long";
/// Malformed address rejected by [`Email`].
pub const ERROR_CODE_EMAIL: &str = "email";
/// Malformed or non-HTTPS address rejected by [`Url`].
pub const ERROR_CODE_URL: &str = "url";
/// Non-numeric or out-of-range value rejected by [`Integer`].
pub const ERROR_CODE_INTEGER: &str = "integer";
/// Disallowed characters rejected by [`ResourceName`].
pub const ERROR_CODE_RESOURCE_NAME: &str = "resource_name";
/// Value accepted by the inner validator of a [`Not`].
pub const ERROR_CODE_NOT: &str = "not";

// ---------------------------------------------------------------------------
// ValidationError
// ---------------------------------------------------------------------------

/// A validation error with a stable code, a message template and parameters.
///
/// ```rust
/// use formkit_validation::ValidationError;
///
/// let error = ValidationError::new("token_lifetime", "Lifetime must be {min}s to {max}s")
///     .with_param("min", 60)
///     .with_param("max", 86400);
///
/// assert_eq!(error.to_string(), "Lifetime must be 60s to 86400s");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// One of the `ERROR_CODE_*` constants, or a caller-defined code.
    pub code: &'static str,
    /// Human-readable message template.
    pub message: String,
    /// Parameters substituted into `{key}` placeholders.
    pub params: BTreeMap<String, String>,
}

impl ValidationError {
    #[must_use]
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            params: BTreeMap::new(),
        }
    }

    /// Attach a `{key}` substitution.
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.insert(key.into(), value.to_string());
        self
    }

    /// Format the message, replacing `{key}` with parameter values.
    #[must_use]
    pub fn format_message(&self) -> String {
        self.params
            .iter()
            .fold(self.message.clone(), |acc, (key, value)| {
                acc.replace(&format!("{{{key}}}"), value)
            })
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_message())
    }
}

impl std::error::Error for ValidationError {}

// ---------------------------------------------------------------------------
// ValidationResult
// ---------------------------------------------------------------------------

/// The result of a synchronous validation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ValidationResult {
    #[default]
    Valid,
    Invalid(ValidationError),
}

impl ValidationResult {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    #[must_use]
    pub fn is_invalid(&self) -> bool {
        matches!(self, Self::Invalid(_))
    }

    #[must_use]
    pub fn error(&self) -> Option<&ValidationError> {
        match self {
            Self::Valid => None,
            Self::Invalid(e) => Some(e),
        }
    }

    /// Interpolated message of the failure, if any.
    #[must_use]
    pub fn error_message(&self) -> Option<String> {
        self.error().map(ValidationError::format_message)
    }

    /// Short-circuiting conjunction: the first failure wins.
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        match self {
            Self::Valid => other,
            Self::Invalid(_) => self,
        }
    }

    /// Disjunction: the second result is used only when the first failed.
    #[must_use]
    pub fn or(self, other: Self) -> Self {
        match self {
            Self::Valid => Self::Valid,
            Self::Invalid(_) => other,
        }
    }
}

// ---------------------------------------------------------------------------
// Validator
// ---------------------------------------------------------------------------

/// A synchronous validator for values of type `T`.
///
/// Form fields run validators through
/// `FieldDescriptor::validate_with`, which adapts them to the async field
/// validation contract.
///
/// ```rust
/// use formkit_validation::{ValidationError, ValidationResult, Validator};
///
/// /// Rejects names the identity server reserves for itself.
/// struct NotReserved(&'static [&'static str]);
///
/// impl Validator<str> for NotReserved {
///     fn validate(&self, value: &str) -> ValidationResult {
///         match self.0.iter().find(|r| r.eq_ignore_ascii_case(value)) {
///             Some(_) => ValidationResult::Invalid(
///                 ValidationError::new("reserved", self.error_message()).with_param("name", value),
///             ),
///             None => ValidationResult::Valid,
///         }
///     }
///
///     fn error_message(&self) -> &str {
///         "{name} is reserved"
///     }
/// }
///
/// let reserved = NotReserved(&["admin", "system"]);
/// assert!(reserved.validate("portal").is_valid());
/// assert_eq!(reserved.validate("Admin").error_message().as_deref(), Some("Admin is reserved"));
/// ```
pub trait Validator<T: ?Sized>: Send + Sync {
    fn validate(&self, value: &T) -> ValidationResult;

    /// Message template used when the validator fails; may contain `{key}`
    /// placeholders filled from the error's parameters.
    fn error_message(&self) -> &str;
}

// ---------------------------------------------------------------------------
// Built-in Validators
// ---------------------------------------------------------------------------

/// Validates that a string is not empty. Whitespace-only counts as empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct Required {
    /// If `true`, whitespace-only strings pass.
    pub allow_whitespace: bool,
}

impl Required {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow whitespace-only strings to pass validation.
    #[must_use]
    pub fn allow_whitespace(mut self) -> Self {
        self.allow_whitespace = true;
        self
    }
}

impl Validator<str> for Required {
    fn validate(&self, value: &str) -> ValidationResult {
        let checked = if self.allow_whitespace { value } else { value.trim() };
        match checked {
            "" => ValidationResult::Invalid(ValidationError::new(
                ERROR_CODE_REQUIRED,
                self.error_message(),
            )),
            _ => ValidationResult::Valid,
        }
    }

    fn error_message(&self) -> &str {
        "This field is required"
    }
}

/// Rejects text shorter than `min` characters.
#[derive(Debug, Clone, Copy)]
pub struct MinLength {
    pub min: usize,
}

impl MinLength {
    #[must_use]
    pub fn new(min: usize) -> Self {
        Self { min }
    }
}

/// Length in characters, not bytes.
fn char_len(value: &str) -> usize {
    value.chars().count()
}

impl Validator<str> for MinLength {
    fn validate(&self, value: &str) -> ValidationResult {
        match char_len(value) {
            len if len >= self.min => ValidationResult::Valid,
            len => ValidationResult::Invalid(
                ValidationError::new(ERROR_CODE_MIN_LENGTH, self.error_message())
                    .with_param("min", self.min)
                    .with_param("actual", len),
            ),
        }
    }

    fn error_message(&self) -> &str {
        "Must be at least {min} characters"
    }
}

/// Rejects text longer than `max` characters.
#[derive(Debug, Clone, Copy)]
pub struct MaxLength {
    pub max: usize,
}

impl MaxLength {
    #[must_use]
    pub fn new(max: usize) -> Self {
        Self { max }
    }
}

impl Validator<str> for MaxLength {
    fn validate(&self, value: &str) -> ValidationResult {
        match char_len(value) {
            len if len <= self.max => ValidationResult::Valid,
            len => ValidationResult::Invalid(
                ValidationError::new(ERROR_CODE_MAX_LENGTH, self.error_message())
                    .with_param("max", self.max)
                    .with_param("actual", len),
            ),
        }
    }

    fn error_message(&self) -> &str {
        "Must be at most {max} characters"
    }
}

/// Validates that a string length lies within `min..=max` characters.
#[derive(Debug, Clone, Copy)]
pub struct LengthBetween {
    pub min: usize,
    pub max: usize,
}

impl LengthBetween {
    #[must_use]
    pub fn new(min: usize, max: usize) -> Self {
        Self { min, max }
    }
}

impl Validator<str> for LengthBetween {
    fn validate(&self, value: &str) -> ValidationResult {
        MinLength::new(self.min)
            .validate(value)
            .and(MaxLength::new(self.max).validate(value))
    }

    fn error_message(&self) -> &str {
        "Must be between {min} and {max} characters"
    }
}

/// Heuristic email check: `local@domain.tld` with a TLD of two or more chars.
///
/// Empty input is valid; pair with [`Required`] for mandatory fields.
#[derive(Debug, Clone, Copy, Default)]
pub struct Email;

impl Email {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn well_formed(value: &str) -> bool {
        let Some((local, domain)) = value.split_once('@') else {
            return false;
        };
        if local.is_empty() || domain.is_empty() || domain.contains('@') {
            return false;
        }
        if value.chars().any(char::is_whitespace) {
            return false;
        }
        let labels: Vec<&str> = domain.split('.').collect();
        labels.len() >= 2
            && labels.iter().all(|label| !label.is_empty())
            && labels.last().is_some_and(|tld| tld.chars().count() >= 2)
    }
}

impl Validator<str> for Email {
    fn validate(&self, value: &str) -> ValidationResult {
        let trimmed = value.trim();
        if trimmed.is_empty() || Self::well_formed(trimmed) {
            ValidationResult::Valid
        } else {
            ValidationResult::Invalid(ValidationError::new(
                ERROR_CODE_EMAIL,
                self.error_message(),
            ))
        }
    }

    fn error_message(&self) -> &str {
        "Invalid email address"
    }
}

/// Validates callback and endpoint URLs by scheme prefix.
#[derive(Debug, Clone, Copy, Default)]
pub struct Url {
    /// Accept only `https://` URLs.
    pub require_https: bool,
}

impl Url {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Require HTTPS URLs only.
    #[must_use]
    pub fn require_https(mut self) -> Self {
        self.require_https = true;
        self
    }

    fn host_part<'a>(value: &'a str, scheme: &str) -> Option<&'a str> {
        value
            .strip_prefix(scheme)
            .map(|rest| rest.split(['/', '?', '#']).next().unwrap_or(""))
    }
}

impl Validator<str> for Url {
    fn validate(&self, value: &str) -> ValidationResult {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return ValidationResult::Valid;
        }

        let host = if self.require_https {
            Self::host_part(trimmed, "https://")
        } else {
            Self::host_part(trimmed, "https://").or_else(|| Self::host_part(trimmed, "http://"))
        };

        let ok = host.is_some_and(|h| !h.is_empty() && !h.chars().any(char::is_whitespace));
        if ok {
            ValidationResult::Valid
        } else {
            let message = if self.require_https {
                "Invalid URL (must use HTTPS)"
            } else {
                "Invalid URL"
            };
            ValidationResult::Invalid(ValidationError::new(ERROR_CODE_URL, message))
        }
    }

    fn error_message(&self) -> &str {
        "Invalid URL"
    }
}

/// Validates that a string parses as an integer, optionally within bounds.
///
/// Used for numeric console settings such as token lifetimes and retry counts.
#[derive(Debug, Clone, Copy, Default)]
pub struct Integer {
    pub min: Option<i64>,
    pub max: Option<i64>,
}

impl Integer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Require the value to be within `min..=max`.
    #[must_use]
    pub fn between(min: i64, max: i64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    /// Require the value to be at least `min`.
    #[must_use]
    pub fn at_least(min: i64) -> Self {
        Self {
            min: Some(min),
            max: None,
        }
    }
}

impl Validator<str> for Integer {
    fn validate(&self, value: &str) -> ValidationResult {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return ValidationResult::Valid;
        }
        let Ok(parsed) = trimmed.parse::<i64>() else {
            return ValidationResult::Invalid(ValidationError::new(
                ERROR_CODE_INTEGER,
                self.error_message(),
            ));
        };

        let below = self.min.is_some_and(|min| parsed < min);
        let above = self.max.is_some_and(|max| parsed > max);
        if !below && !above {
            return ValidationResult::Valid;
        }

        let mut error = match (self.min, self.max) {
            (Some(_), Some(_)) => {
                ValidationError::new(ERROR_CODE_INTEGER, "Must be between {min} and {max}")
            }
            (Some(_), None) => ValidationError::new(ERROR_CODE_INTEGER, "Must be at least {min}"),
            _ => ValidationError::new(ERROR_CODE_INTEGER, "Must be at most {max}"),
        };
        if let Some(min) = self.min {
            error = error.with_param("min", min);
        }
        if let Some(max) = self.max {
            error = error.with_param("max", max);
        }
        ValidationResult::Invalid(error.with_param("actual", parsed))
    }

    fn error_message(&self) -> &str {
        "Must be a whole number"
    }
}

/// Validates display names of applications, connections and connectors.
///
/// Allowed: ASCII letters and digits, space, `_`, `-` and `.`; the name must
/// not start with whitespace.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResourceName;

impl ResourceName {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Validator<str> for ResourceName {
    fn validate(&self, value: &str) -> ValidationResult {
        if value.is_empty() {
            return ValidationResult::Valid;
        }
        let starts_blank = value.chars().next().is_some_and(char::is_whitespace);
        let allowed = value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, ' ' | '_' | '-' | '.'));
        if allowed && !starts_blank {
            ValidationResult::Valid
        } else {
            ValidationResult::Invalid(ValidationError::new(
                ERROR_CODE_RESOURCE_NAME,
                self.error_message(),
            ))
        }
    }

    fn error_message(&self) -> &str {
        "Name may only contain letters, digits, spaces, '_', '-' and '.'"
    }
}

// ---------------------------------------------------------------------------
// Composition Validators
// ---------------------------------------------------------------------------

/// Both validators must pass.
#[derive(Debug, Clone)]
pub struct And<A, B> {
    pub first: A,
    pub second: B,
}

impl<A, B> And<A, B> {
    #[must_use]
    pub fn new(first: A, second: B) -> Self {
        Self { first, second }
    }
}

impl<T: ?Sized, A, B> Validator<T> for And<A, B>
where
    A: Validator<T>,
    B: Validator<T>,
{
    fn validate(&self, value: &T) -> ValidationResult {
        match self.first.validate(value) {
            ValidationResult::Valid => self.second.validate(value),
            err => err,
        }
    }

    fn error_message(&self) -> &str {
        self.first.error_message()
    }
}

/// At least one validator must pass.
#[derive(Debug, Clone)]
pub struct Or<A, B> {
    pub first: A,
    pub second: B,
}

impl<A, B> Or<A, B> {
    #[must_use]
    pub fn new(first: A, second: B) -> Self {
        Self { first, second }
    }
}

impl<T: ?Sized, A, B> Validator<T> for Or<A, B>
where
    A: Validator<T>,
    B: Validator<T>,
{
    fn validate(&self, value: &T) -> ValidationResult {
        self.first.validate(value).or(self.second.validate(value))
    }

    fn error_message(&self) -> &str {
        self.second.error_message()
    }
}

/// Valid when the inner validator fails.
#[derive(Debug, Clone)]
pub struct Not<V> {
    pub inner: V,
    /// Message used when the inner validator passes.
    pub message: String,
}

impl<V> Not<V> {
    #[must_use]
    pub fn new(inner: V, message: impl Into<String>) -> Self {
        Self {
            inner,
            message: message.into(),
        }
    }
}

impl<T: ?Sized, V> Validator<T> for Not<V>
where
    V: Validator<T>,
{
    fn validate(&self, value: &T) -> ValidationResult {
        match self.inner.validate(value) {
            ValidationResult::Valid => {
                ValidationResult::Invalid(ValidationError::new(ERROR_CODE_NOT, &self.message))
            }
            ValidationResult::Invalid(_) => ValidationResult::Valid,
        }
    }

    fn error_message(&self) -> &str {
        &self.message
    }
}

/// Runs every validator in order; the first failure wins.
pub struct All<T: ?Sized> {
    validators: Vec<Box<dyn Validator<T>>>,
}

impl<T: ?Sized> All<T> {
    #[must_use]
    pub fn new(validators: Vec<Box<dyn Validator<T>>>) -> Self {
        Self { validators }
    }

    /// Append another validator.
    #[must_use]
    pub fn with(mut self, validator: impl Validator<T> + 'static) -> Self {
        self.validators.push(Box::new(validator));
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.validators.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }
}

impl<T: ?Sized> Default for All<T> {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl<T: ?Sized> Validator<T> for All<T> {
    fn validate(&self, value: &T) -> ValidationResult {
        self.validators
            .iter()
            .map(|v| v.validate(value))
            .find(ValidationResult::is_invalid)
            .unwrap_or_default()
    }

    fn error_message(&self) -> &str {
        self.validators
            .first()
            .map_or("Validation failed", |v| v.error_message())
    }
}

impl<T: ?Sized> fmt::Debug for All<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("All")
            .field("validators", &self.validators.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_interpolates_params() {
        let err = ValidationError::new(ERROR_CODE_MIN_LENGTH, "at least {min}, got {actual}")
            .with_param("min", 3)
            .with_param("actual", 1);
        assert_eq!(err.format_message(), "at least 3, got 1");
        assert_eq!(err.to_string(), "at least 3, got 1");
    }

    #[test]
    fn required_rejects_blank() {
        assert!(Required::new().validate("").is_invalid());
        assert!(Required::new().validate("   ").is_invalid());
        assert!(Required::new().validate("x").is_valid());
        assert!(Required::new().allow_whitespace().validate("  ").is_valid());
    }

    #[test]
    fn length_bounds_count_chars() {
        assert!(MinLength::new(3).validate("日本語").is_valid());
        assert!(MinLength::new(4).validate("日本語").is_invalid());
        assert!(MaxLength::new(2).validate("abc").is_invalid());
        let between = LengthBetween::new(2, 4);
        assert!(between.validate("a").is_invalid());
        assert!(between.validate("abcd").is_valid());
        assert!(between.validate("abcde").is_invalid());
    }

    #[test]
    fn email_heuristics() {
        let email = Email::new();
        assert!(email.validate("").is_valid());
        assert!(email.validate("admin@wso2.com").is_valid());
        assert!(email.validate("admin@localhost").is_invalid());
        assert!(email.validate("@wso2.com").is_invalid());
        assert!(email.validate("admin@wso2.c").is_invalid());
        assert!(email.validate("ad min@wso2.com").is_invalid());
        assert!(email.validate("a@b@c.com").is_invalid());
    }

    #[test]
    fn url_scheme_and_host() {
        let url = Url::new();
        assert!(url.validate("https://localhost:9443/callback").is_valid());
        assert!(url.validate("http://example.com").is_valid());
        assert!(url.validate("https://").is_invalid());
        assert!(url.validate("ftp://example.com").is_invalid());
        let https = Url::new().require_https();
        assert!(https.validate("http://example.com").is_invalid());
        assert_eq!(
            https.validate("http://example.com").error_message().as_deref(),
            Some("Invalid URL (must use HTTPS)")
        );
    }

    #[test]
    fn integer_bounds() {
        assert!(Integer::new().validate("42").is_valid());
        assert!(Integer::new().validate("4.2").is_invalid());
        let bounded = Integer::between(1, 10);
        assert!(bounded.validate("0").is_invalid());
        assert_eq!(
            bounded.validate("11").error_message().as_deref(),
            Some("Must be between 1 and 10")
        );
        assert_eq!(
            Integer::at_least(5).validate("1").error_message().as_deref(),
            Some("Must be at least 5")
        );
    }

    #[test]
    fn resource_name_charset() {
        let name = ResourceName::new();
        assert!(name.validate("My App-1.0_beta").is_valid());
        assert!(name.validate(" leading").is_invalid());
        assert!(name.validate("bad/name").is_invalid());
    }

    #[test]
    fn composition() {
        let v = And::new(Required::new(), MinLength::new(3));
        assert_eq!(v.validate("").error().map(|e| e.code), Some(ERROR_CODE_REQUIRED));
        assert_eq!(v.validate("ab").error().map(|e| e.code), Some(ERROR_CODE_MIN_LENGTH));

        let either = Or::new(Email::new(), Url::new());
        assert!(either.validate("https://example.com").is_valid());
        assert!(either.validate("nope").is_invalid());

        let not_admin = Not::new(
            Or::new(MaxLength::new(0), ResourceName::new()),
            "must not be a plain name",
        );
        assert!(not_admin.validate("admin").is_invalid());
    }

    #[test]
    fn all_reports_first_failure() {
        let all: All<str> = All::default()
            .with(Required::new())
            .with(ResourceName::new())
            .with(MaxLength::new(5));
        assert_eq!(all.len(), 3);
        assert!(all.validate("app").is_valid());
        assert_eq!(
            all.validate("bad/name").error().map(|e| e.code),
            Some(ERROR_CODE_RESOURCE_NAME)
        );
        assert!(All::<str>::default().validate("").is_valid());
    }
}
