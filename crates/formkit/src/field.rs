#![forbid(unsafe_code)]

//! Field descriptors and the form element tree.
//!
//! A form is declared as an ordered list of [`FormElement`]s. Fields carry a
//! [`FieldDescriptor`]; groups nest further elements; submit, reset and plain
//! buttons are value-less controls addressed by id.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use formkit_validation::{FieldValidity, Validator};

use crate::value::{FieldValue, FormValues};

// ---------------------------------------------------------------------------
// FieldKind
// ---------------------------------------------------------------------------

/// The closed set of field kinds the controller knows how to seed and check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// Single-line text input.
    Text,
    /// Masked text input. Never trimmed.
    Password,
    /// Multi-line text input.
    TextArea,
    /// Numeric text input.
    Number,
    /// Single choice from a list; seeded from the default value.
    Dropdown,
    /// Single choice from a radio group; never subject to the required check.
    Radio,
    /// Multiple choice; the value is a selection list.
    Checkbox,
    /// On/off switch stored as `"true"` / `"false"`.
    Toggle,
    /// Space separated OAuth scopes.
    Scopes,
}

impl FieldKind {
    /// Value a field of this kind takes when nothing seeds it.
    #[must_use]
    pub fn empty_value(self) -> FieldValue {
        match self {
            Self::Checkbox => FieldValue::List(Vec::new()),
            Self::Toggle => FieldValue::toggle(false),
            _ => FieldValue::default(),
        }
    }

    /// Whether a declared `validation` function runs for this kind.
    #[must_use]
    pub fn runs_custom_validation(self) -> bool {
        matches!(
            self,
            Self::Text | Self::Password | Self::TextArea | Self::Number | Self::Dropdown | Self::Scopes
        )
    }

    /// Whether blur trims the stored value before checking it.
    #[must_use]
    pub fn trims_on_blur(self) -> bool {
        matches!(
            self,
            Self::Text | Self::TextArea | Self::Number | Self::Dropdown | Self::Scopes
        )
    }

    /// Whether the required constraint applies at all.
    #[must_use]
    pub fn checks_required(self) -> bool {
        self != Self::Radio
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Password => "password",
            Self::TextArea => "textarea",
            Self::Number => "number",
            Self::Dropdown => "dropdown",
            Self::Radio => "radio",
            Self::Checkbox => "checkbox",
            Self::Toggle => "toggle",
            Self::Scopes => "scopes",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// When a field's accumulated errors become visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DisplayErrorOn {
    /// After the user leaves the field (or after a submit attempt).
    #[default]
    Blur,
    /// Only after a submit attempt.
    Submit,
}

// ---------------------------------------------------------------------------
// Async field validation
// ---------------------------------------------------------------------------

/// The future returned by a field validator.
pub type ValidationFuture = Pin<Box<dyn Future<Output = FieldValidity> + Send + 'static>>;

/// A per-field validation that may suspend (e.g. a uniqueness lookup).
///
/// The validator receives the field's current value and a snapshot of the
/// whole form, and resolves to the accumulated [`FieldValidity`]. Failures
/// are recorded in the validity, not raised.
pub trait AsyncFieldValidator: Send + Sync {
    fn validate(&self, value: FieldValue, snapshot: FormValues) -> ValidationFuture;
}

struct FnValidator<F>(F);

impl<F, Fut> AsyncFieldValidator for FnValidator<F>
where
    F: Fn(FieldValue, FormValues) -> Fut + Send + Sync,
    Fut: Future<Output = FieldValidity> + Send + 'static,
{
    fn validate(&self, value: FieldValue, snapshot: FormValues) -> ValidationFuture {
        Box::pin((self.0)(value, snapshot))
    }
}

/// Runs a synchronous [`Validator`] over the text of a field, or over each
/// selected entry of a list value.
struct SyncValidator<V>(V);

impl<V> AsyncFieldValidator for SyncValidator<V>
where
    V: Validator<str>,
{
    fn validate(&self, value: FieldValue, _snapshot: FormValues) -> ValidationFuture {
        let mut validity = FieldValidity::valid();
        match &value {
            FieldValue::Text(text) => validity.merge(self.0.validate(text).into()),
            FieldValue::List(items) => {
                for item in items {
                    validity.merge(self.0.validate(item).into());
                }
            }
        }
        Box::pin(std::future::ready(validity))
    }
}

/// Callback fired with the value snapshot when a watched field changes.
pub type ListenFn = Arc<dyn Fn(&FormValues) + Send + Sync>;

/// Callback fired when a [`FormElement::Button`] is pressed.
pub type ClickFn = Arc<dyn Fn() + Send + Sync>;

#[derive(Clone)]
pub(crate) struct Listener {
    /// Field whose changes trigger the callback; `None` means the owner.
    pub(crate) target: Option<String>,
    pub(crate) callback: ListenFn,
}

// ---------------------------------------------------------------------------
// FieldDescriptor
// ---------------------------------------------------------------------------

/// Static declaration of one field.
///
/// ```rust
/// use formkit::{FieldDescriptor, FieldValidity};
///
/// let name = FieldDescriptor::text("name")
///     .required("Application name is required")
///     .initial_value("My App")
///     .validation(|value, _snapshot| async move {
///         let mut validity = FieldValidity::valid();
///         if value.as_text() == Some("admin") {
///             validity.push_error("Name is reserved");
///         }
///         validity
///     });
/// assert!(name.is_required());
/// ```
#[derive(Clone)]
pub struct FieldDescriptor {
    pub(crate) name: String,
    pub(crate) kind: FieldKind,
    pub(crate) required: bool,
    pub(crate) required_error_message: String,
    pub(crate) initial_value: Option<FieldValue>,
    pub(crate) default_value: Option<FieldValue>,
    pub(crate) validation: Option<Arc<dyn AsyncFieldValidator>>,
    pub(crate) enable_reinitialize: bool,
    pub(crate) display_error_on: Option<DisplayErrorOn>,
    pub(crate) listener: Option<Listener>,
}

impl fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("required", &self.required)
            .field("initial_value", &self.initial_value)
            .field("default_value", &self.default_value)
            .field("has_validation", &self.validation.is_some())
            .field("enable_reinitialize", &self.enable_reinitialize)
            .field("display_error_on", &self.display_error_on)
            .field(
                "listens_to",
                &self
                    .listener
                    .as_ref()
                    .map(|l| l.target.as_deref().unwrap_or(&self.name)),
            )
            .finish()
    }
}

impl FieldDescriptor {
    /// A field of the given kind.
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
            required_error_message: String::new(),
            initial_value: None,
            default_value: None,
            validation: None,
            enable_reinitialize: false,
            display_error_on: None,
            listener: None,
        }
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Text)
    }

    pub fn password(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Password)
    }

    pub fn text_area(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::TextArea)
    }

    pub fn number(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Number)
    }

    pub fn dropdown(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Dropdown)
    }

    pub fn radio(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Radio)
    }

    pub fn checkbox(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Checkbox)
    }

    pub fn toggle(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Toggle)
    }

    pub fn scopes(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Scopes)
    }

    /// Mark the field required, with the message shown while it is empty.
    #[must_use]
    pub fn required(mut self, message: impl Into<String>) -> Self {
        self.required = true;
        self.required_error_message = message.into();
        self
    }

    /// Value the field is seeded with (outside of resets).
    #[must_use]
    pub fn initial_value(mut self, value: impl Into<FieldValue>) -> Self {
        self.initial_value = Some(value.into());
        self
    }

    /// Fallback for radios and dropdowns when no initial value applies.
    #[must_use]
    pub fn default_value(mut self, value: impl Into<FieldValue>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    /// Attach an async validation closure.
    #[must_use]
    pub fn validation<F, Fut>(self, f: F) -> Self
    where
        F: Fn(FieldValue, FormValues) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = FieldValidity> + Send + 'static,
    {
        self.validator(FnValidator(f))
    }

    /// Attach any [`AsyncFieldValidator`].
    #[must_use]
    pub fn validator(mut self, validator: impl AsyncFieldValidator + 'static) -> Self {
        self.validation = Some(Arc::new(validator));
        self
    }

    /// Attach a synchronous [`Validator`], e.g. `Url::new()`.
    #[must_use]
    pub fn validate_with(self, validator: impl Validator<str> + 'static) -> Self {
        self.validator(SyncValidator(validator))
    }

    /// Reseed from `initial_value` whenever it changes, even after edits.
    #[must_use]
    pub fn enable_reinitialize(mut self) -> Self {
        self.enable_reinitialize = true;
        self
    }

    #[must_use]
    pub fn display_error_on(mut self, on: DisplayErrorOn) -> Self {
        self.display_error_on = Some(on);
        self
    }

    /// Call `f` with the value snapshot whenever this field changes.
    #[must_use]
    pub fn listen(mut self, f: impl Fn(&FormValues) + Send + Sync + 'static) -> Self {
        self.listener = Some(Listener {
            target: None,
            callback: Arc::new(f),
        });
        self
    }

    /// Call `f` with the value snapshot whenever the field `target` changes.
    #[must_use]
    pub fn listen_on(
        mut self,
        target: impl Into<String>,
        f: impl Fn(&FormValues) + Send + Sync + 'static,
    ) -> Self {
        self.listener = Some(Listener {
            target: Some(target.into()),
            callback: Arc::new(f),
        });
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    #[must_use]
    pub fn is_required(&self) -> bool {
        self.required
    }

    #[must_use]
    pub fn required_error_message(&self) -> &str {
        &self.required_error_message
    }

    #[must_use]
    pub fn has_validation(&self) -> bool {
        self.validation.is_some()
    }

    /// Name of the field this descriptor's listener watches.
    #[must_use]
    pub fn listens_to(&self) -> Option<&str> {
        self.listener
            .as_ref()
            .map(|l| l.target.as_deref().unwrap_or(&self.name))
    }

    /// Whether the required constraint is enforced for this field.
    pub(crate) fn enforces_required(&self) -> bool {
        self.required && self.kind.checks_required()
    }

    /// The value used when seeding without an initial value.
    pub(crate) fn empty_value(&self) -> FieldValue {
        match (self.kind, &self.default_value) {
            (FieldKind::Radio | FieldKind::Dropdown, Some(default)) => default.clone(),
            _ => self.kind.empty_value(),
        }
    }
}

// ---------------------------------------------------------------------------
// FormElement
// ---------------------------------------------------------------------------

/// One node of the declared form tree.
#[derive(Clone)]
pub enum FormElement {
    /// A value-bearing field.
    Field(FieldDescriptor),
    /// A visual group of elements; fields inside behave as top-level fields.
    Group(Vec<FormElement>),
    /// Pressing it starts a submission.
    Submit { id: String },
    /// Pressing it resets the form.
    Reset { id: String },
    /// Pressing it calls `on_click`.
    Button { id: String, on_click: ClickFn },
}

impl fmt::Debug for FormElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(field) => f.debug_tuple("Field").field(field).finish(),
            Self::Group(children) => f.debug_tuple("Group").field(children).finish(),
            Self::Submit { id } => f.debug_struct("Submit").field("id", id).finish(),
            Self::Reset { id } => f.debug_struct("Reset").field("id", id).finish(),
            Self::Button { id, .. } => f.debug_struct("Button").field("id", id).finish(),
        }
    }
}

impl From<FieldDescriptor> for FormElement {
    fn from(field: FieldDescriptor) -> Self {
        Self::Field(field)
    }
}

impl FormElement {
    pub fn group(children: impl IntoIterator<Item = FormElement>) -> Self {
        Self::Group(children.into_iter().collect())
    }

    pub fn submit(id: impl Into<String>) -> Self {
        Self::Submit { id: id.into() }
    }

    pub fn reset(id: impl Into<String>) -> Self {
        Self::Reset { id: id.into() }
    }

    pub fn button(id: impl Into<String>, on_click: impl Fn() + Send + Sync + 'static) -> Self {
        Self::Button {
            id: id.into(),
            on_click: Arc::new(on_click),
        }
    }

    /// Control id, for submit/reset/button elements.
    #[must_use]
    pub fn control_id(&self) -> Option<&str> {
        match self {
            Self::Submit { id } | Self::Reset { id } | Self::Button { id, .. } => Some(id),
            Self::Field(_) | Self::Group(_) => None,
        }
    }
}

/// Fields of the tree in declaration order, depth first.
pub(crate) fn collect_fields<'a>(elements: &'a [FormElement], out: &mut Vec<&'a FieldDescriptor>) {
    for element in elements {
        match element {
            FormElement::Field(field) => out.push(field),
            FormElement::Group(children) => collect_fields(children, out),
            _ => {}
        }
    }
}

/// Control elements of the tree in declaration order, depth first.
pub(crate) fn collect_controls<'a>(elements: &'a [FormElement], out: &mut Vec<&'a FormElement>) {
    for element in elements {
        match element {
            FormElement::Group(children) => collect_controls(children, out),
            FormElement::Field(_) => {}
            control => out.push(control),
        }
    }
}
