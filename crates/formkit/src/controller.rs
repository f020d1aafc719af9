#![forbid(unsafe_code)]

//! The form controller.
//!
//! [`FormController`] owns a [`FormState`], the installed element tree and the
//! caller's callbacks. Field operations mutate the state synchronously; blur
//! hands back a [`PendingValidation`] when an async validator has to run, and
//! the caller feeds the settled result back through
//! [`complete_validation`](FormController::complete_validation).
//!
//! # Submit protocol
//!
//! `submit()` only *requests* a submission. The request settles as soon as no
//! validation is in flight: `on_submit` receives the values when every check
//! passes, `on_submit_error` receives the required and validity maps
//! otherwise. A request made while a validation is pending is held until that
//! validation settles, so the decision always reflects settled results.
//!
//! # Example
//!
//! ```rust
//! use std::sync::{Arc, Mutex};
//! use formkit::{FieldDescriptor, FormController, FormElement};
//!
//! let submitted = Arc::new(Mutex::new(None));
//! let sink = Arc::clone(&submitted);
//!
//! let mut form = FormController::new([
//!     FieldDescriptor::text("name").required("Name is required").into(),
//!     FormElement::submit("save"),
//! ])
//! .unwrap()
//! .on_submit(move |values| *sink.lock().unwrap() = Some(values));
//!
//! form.handle_change("name", "console").unwrap();
//! form.handle_blur("name").unwrap();
//! form.press("save").unwrap();
//!
//! let values = submitted.lock().unwrap().take().unwrap();
//! assert_eq!(values.text("name"), Some("console"));
//! ```

use std::collections::BTreeSet;
use std::fmt;
use std::time::{Duration, Instant};

use formkit_validation::{
    AsyncValidationCoordinator, FieldValidity, ValidationToken, ValidationTrace,
};

use crate::config::FormConfig;
use crate::error::{FormError, FormResult};
use crate::field::{
    ClickFn, FieldDescriptor, FieldKind, FormElement, ValidationFuture, collect_controls,
    collect_fields,
};
use crate::state::{FormState, RequiredMap, SubmitStatus, SyncReason, ValidityMap};
use crate::value::{FieldValue, FormValues};

type SubmitFn = Box<dyn FnMut(FormValues)>;
type ChangeFn = Box<dyn FnMut(bool, &FormValues)>;
type SubmitErrorFn = Box<dyn FnMut(&RequiredMap, &ValidityMap)>;

// ---------------------------------------------------------------------------
// Pending / completed validations
// ---------------------------------------------------------------------------

/// An async field validation started by blur, not yet awaited.
pub struct PendingValidation {
    field: String,
    token: ValidationToken,
    started_at: Instant,
    future: ValidationFuture,
}

impl fmt::Debug for PendingValidation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingValidation")
            .field("field", &self.field)
            .field("token", &self.token)
            .finish_non_exhaustive()
    }
}

impl PendingValidation {
    #[must_use]
    pub fn field(&self) -> &str {
        &self.field
    }

    #[must_use]
    pub fn token(&self) -> ValidationToken {
        self.token
    }

    /// Run the validator to completion.
    pub async fn settle(self) -> CompletedValidation {
        let validity = self.future.await;
        CompletedValidation {
            field: self.field,
            token: self.token,
            validity,
            duration: self.started_at.elapsed(),
        }
    }
}

/// The settled result of a [`PendingValidation`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedValidation {
    pub field: String,
    pub token: ValidationToken,
    pub validity: FieldValidity,
    pub duration: Duration,
}

enum ControlAction {
    Submit,
    Reset,
    Click(ClickFn),
}

// ---------------------------------------------------------------------------
// FormController
// ---------------------------------------------------------------------------

/// Manages the values, checks and submission of one form.
pub struct FormController {
    elements: Vec<FormElement>,
    fields: Vec<FieldDescriptor>,
    state: FormState,
    config: FormConfig,
    coordinator: AsyncValidationCoordinator,
    on_submit: Option<SubmitFn>,
    on_change: Option<ChangeFn>,
    on_submit_error: Option<SubmitErrorFn>,
    submit_trigger: bool,
    reset_trigger: bool,
}

impl fmt::Debug for FormController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormController")
            .field("elements", &self.elements)
            .field("state", &self.state)
            .field("config", &self.config)
            .field("coordinator", &self.coordinator)
            .field("submit_trigger", &self.submit_trigger)
            .field("reset_trigger", &self.reset_trigger)
            .finish_non_exhaustive()
    }
}

impl FormController {
    /// Install `elements` with the default configuration.
    pub fn new(elements: impl IntoIterator<Item = FormElement>) -> FormResult<Self> {
        Self::with_config(elements, FormConfig::default())
    }

    pub fn with_config(
        elements: impl IntoIterator<Item = FormElement>,
        config: FormConfig,
    ) -> FormResult<Self> {
        let elements: Vec<FormElement> = elements.into_iter().collect();
        let fields = flatten(&elements)?;
        let trace = match config.trace_capacity {
            Some(capacity) => ValidationTrace::with_capacity_limit(capacity),
            None => ValidationTrace::new(),
        };
        let mut state = FormState::new();
        state.sync(&fields, SyncReason::Normal);
        Ok(Self {
            elements,
            fields,
            state,
            config,
            coordinator: AsyncValidationCoordinator::with_trace(trace),
            on_submit: None,
            on_change: None,
            on_submit_error: None,
            submit_trigger: false,
            reset_trigger: false,
        })
    }

    /// Called with the values when a submission passes every check.
    #[must_use]
    pub fn on_submit(mut self, f: impl FnMut(FormValues) + 'static) -> Self {
        self.on_submit = Some(Box::new(f));
        self
    }

    /// Called after every value mutation with `is_pure = false`, and once
    /// after a reset with `is_pure = true`.
    #[must_use]
    pub fn on_change(mut self, f: impl FnMut(bool, &FormValues) + 'static) -> Self {
        self.on_change = Some(Box::new(f));
        self
    }

    /// Called with the required and validity maps when a submission is blocked.
    #[must_use]
    pub fn on_submit_error(mut self, f: impl FnMut(&RequiredMap, &ValidityMap) + 'static) -> Self {
        self.on_submit_error = Some(Box::new(f));
        self
    }

    /// Install a new element tree, keeping state for fields that remain.
    pub fn set_elements(&mut self, elements: impl IntoIterator<Item = FormElement>) -> FormResult<()> {
        let elements: Vec<FormElement> = elements.into_iter().collect();
        self.fields = flatten(&elements)?;
        self.elements = elements;
        self.state.sync(&self.fields, SyncReason::Normal);

        let declared: BTreeSet<&str> = self.fields.iter().map(|f| f.name.as_str()).collect();
        self.coordinator
            .retain_fields(|name| declared.contains(name));
        self.settle();
        Ok(())
    }

    // -- field operations ---------------------------------------------------

    /// Store a new value for `name` while the user edits it.
    pub fn handle_change(&mut self, name: &str, value: impl Into<FieldValue>) -> FormResult<()> {
        self.field(name)?;
        let value = value.into();
        tracing::debug!(field = %name, value = %value, "field changed");
        self.state.set_value(name, value);
        self.after_mutation(name);
        Ok(())
    }

    /// Flip a toggle field.
    pub fn handle_toggle(&mut self, name: &str) -> FormResult<()> {
        self.expect_kind(name, FieldKind::Toggle)?;
        let value = self.state.toggle(name);
        tracing::debug!(field = %name, value = %value, "field toggled");
        self.after_mutation(name);
        Ok(())
    }

    /// Add or remove `option` from a checkbox selection.
    pub fn handle_change_checkbox(&mut self, name: &str, option: &str) -> FormResult<()> {
        self.expect_kind(name, FieldKind::Checkbox)?;
        let selected = self.state.toggle_checkbox(name, option);
        tracing::debug!(field = %name, option, selected, "checkbox changed");
        self.after_mutation(name);
        Ok(())
    }

    /// The user left `name`.
    ///
    /// Re-checks the required constraint immediately. If the field declares a
    /// validation that applies to its kind and it holds a value, the returned
    /// [`PendingValidation`] must be settled and passed to
    /// [`complete_validation`](Self::complete_validation); otherwise the field
    /// is marked valid right away and `None` is returned.
    ///
    /// A newer blur of the same field supersedes any validation still pending
    /// for it.
    pub fn handle_blur(&mut self, name: &str) -> FormResult<Option<PendingValidation>> {
        let field = self.field(name)?.clone();
        self.state.begin_blur(name);
        self.state
            .check_required(&field, self.config.trim_on_validate);

        let token = self.coordinator.start_validation(name);
        let value = self.state.value(name).cloned().unwrap_or_default();
        match &field.validation {
            Some(validator) if field.kind.runs_custom_validation() && !value.is_empty() => {
                tracing::debug!(field = %name, token = token.raw(), "validation started");
                let future = validator.validate(value, self.state.values().clone());
                Ok(Some(PendingValidation {
                    field: name.to_owned(),
                    token,
                    started_at: Instant::now(),
                    future,
                }))
            }
            _ => {
                self.commit_validation(name, token, FieldValidity::valid(), Duration::ZERO);
                Ok(None)
            }
        }
    }

    /// Record a settled validation.
    ///
    /// Returns `false` when the result was superseded by a newer blur or
    /// cancelled by a reset or by the field being removed; such results are
    /// dropped.
    pub fn complete_validation(&mut self, completed: CompletedValidation) -> bool {
        let CompletedValidation {
            field,
            token,
            validity,
            duration,
        } = completed;
        self.commit_validation(&field, token, validity, duration)
    }

    /// Blur `name` and await its validation in place.
    ///
    /// Returns whether a validation result was applied.
    pub async fn blur(&mut self, name: &str) -> FormResult<bool> {
        match self.handle_blur(name)? {
            Some(pending) => {
                let completed = pending.settle().await;
                Ok(self.complete_validation(completed))
            }
            None => Ok(true),
        }
    }

    fn commit_validation(
        &mut self,
        name: &str,
        token: ValidationToken,
        validity: FieldValidity,
        duration: Duration,
    ) -> bool {
        let applied = self
            .coordinator
            .try_apply_result(name, token, validity.is_valid(), duration);
        if !applied {
            return false;
        }
        tracing::debug!(
            field = %name,
            token = token.raw(),
            is_valid = validity.is_valid(),
            "validation applied"
        );
        self.state.apply_validation(name, validity);
        self.settle();
        true
    }

    // -- submit / reset -----------------------------------------------------

    /// Request a submission and settle it if nothing is pending.
    pub fn submit(&mut self) -> SubmitStatus {
        self.state.request_submission();
        self.settle()
    }

    fn settle(&mut self) -> SubmitStatus {
        let status = self.state.settle_submission();
        match status {
            SubmitStatus::Idle => {}
            SubmitStatus::Pending => {
                tracing::debug!(
                    in_flight = self.coordinator.in_flight_count(),
                    "submission waiting for validation"
                );
            }
            SubmitStatus::Submitted => {
                tracing::info!(fields = self.state.values().len(), "form submitted");
                if let Some(on_submit) = self.on_submit.as_mut() {
                    on_submit(self.state.values().clone());
                }
            }
            SubmitStatus::Blocked => {
                let failing: Vec<&str> = self
                    .fields
                    .iter()
                    .map(|f| f.name.as_str())
                    .filter(|name| {
                        !self.state.is_required_satisfied(name)
                            || self
                                .state
                                .validity(name)
                                .is_some_and(|v| !v.is_valid())
                    })
                    .collect();
                tracing::info!(failing = ?failing, "submission blocked");
                if let Some(on_submit_error) = self.on_submit_error.as_mut() {
                    on_submit_error(self.state.required_map(), self.state.validity_map());
                }
            }
        }
        status
    }

    /// Restore every field to its empty value and clear interaction state.
    ///
    /// Pending validations are cancelled; their results will be discarded.
    pub fn reset(&mut self) {
        let cancelled = self.coordinator.cancel_all();
        self.state.sync(&self.fields, SyncReason::Reset);
        tracing::debug!(cancelled, "form reset");
        if let Some(on_change) = self.on_change.as_mut() {
            on_change(true, self.state.values());
        }
    }

    /// Externally driven submit flag. Any flip requests a submission.
    pub fn set_submit_trigger(&mut self, flag: bool) -> Option<SubmitStatus> {
        if flag == self.submit_trigger {
            return None;
        }
        self.submit_trigger = flag;
        Some(self.submit())
    }

    /// Externally driven reset flag. Any flip resets the form.
    pub fn set_reset_trigger(&mut self, flag: bool) -> bool {
        if flag == self.reset_trigger {
            return false;
        }
        self.reset_trigger = flag;
        self.reset();
        true
    }

    /// Activate the submit, reset or button element with this id.
    pub fn press(&mut self, id: &str) -> FormResult<()> {
        let action = {
            let mut controls = Vec::new();
            collect_controls(&self.elements, &mut controls);
            let control = controls
                .into_iter()
                .find(|c| c.control_id() == Some(id))
                .ok_or_else(|| FormError::UnknownElement(id.to_owned()))?;
            match control {
                FormElement::Submit { .. } => ControlAction::Submit,
                FormElement::Reset { .. } => ControlAction::Reset,
                FormElement::Button { on_click, .. } => ControlAction::Click(on_click.clone()),
                FormElement::Field(_) | FormElement::Group(_) => {
                    return Err(FormError::UnknownElement(id.to_owned()));
                }
            }
        };
        match action {
            ControlAction::Submit => {
                self.submit();
            }
            ControlAction::Reset => self.reset(),
            ControlAction::Click(on_click) => on_click(),
        }
        Ok(())
    }

    // -- queries ------------------------------------------------------------

    /// Whether the errors of `name` should currently be displayed.
    pub fn check_error(&self, name: &str) -> FormResult<bool> {
        let field = self.field(name)?;
        Ok(self
            .state
            .check_error(field, self.config.default_display_error_on))
    }

    /// Messages to display for `name`; empty while errors are hidden.
    pub fn field_errors(&self, name: &str) -> FormResult<Vec<String>> {
        let field = self.field(name)?;
        Ok(self
            .state
            .visible_errors(field, self.config.default_display_error_on))
    }

    /// The descriptor declared for `name`.
    pub fn field(&self, name: &str) -> FormResult<&FieldDescriptor> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .ok_or_else(|| FormError::UnknownField(name.to_owned()))
    }

    /// Declared fields in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter()
    }

    #[must_use]
    pub fn elements(&self) -> &[FormElement] {
        &self.elements
    }

    #[must_use]
    pub fn values(&self) -> &FormValues {
        self.state.values()
    }

    #[must_use]
    pub fn value(&self, name: &str) -> Option<&FieldValue> {
        self.state.value(name)
    }

    #[must_use]
    pub fn state(&self) -> &FormState {
        &self.state
    }

    #[must_use]
    pub fn config(&self) -> &FormConfig {
        &self.config
    }

    #[must_use]
    pub fn is_submitting(&self) -> bool {
        self.state.is_submitting()
    }

    #[must_use]
    pub fn is_validating(&self) -> bool {
        self.state.is_validating()
    }

    /// The validation coordinator, for trace inspection.
    #[must_use]
    pub fn coordinator(&self) -> &AsyncValidationCoordinator {
        &self.coordinator
    }

    // -- internals ----------------------------------------------------------

    fn expect_kind(&self, name: &str, expected: FieldKind) -> FormResult<()> {
        let found = self.field(name)?.kind;
        if found == expected {
            Ok(())
        } else {
            Err(FormError::KindMismatch {
                field: name.to_owned(),
                expected,
                found,
            })
        }
    }

    fn after_mutation(&mut self, name: &str) {
        let values = self.state.values();
        for field in &self.fields {
            if field.listens_to() == Some(name) {
                if let Some(listener) = &field.listener {
                    tracing::trace!(listener = %field.name, changed = %name, "notifying listener");
                    (listener.callback)(values);
                }
            }
        }
        if let Some(on_change) = self.on_change.as_mut() {
            on_change(false, self.state.values());
        }
    }
}

/// Flatten the tree into field descriptors, rejecting duplicate names.
fn flatten(elements: &[FormElement]) -> FormResult<Vec<FieldDescriptor>> {
    let mut fields = Vec::new();
    collect_fields(elements, &mut fields);
    let mut controls = Vec::new();
    collect_controls(elements, &mut controls);

    let mut seen = BTreeSet::new();
    let names = fields
        .iter()
        .map(|f| f.name.as_str())
        .chain(controls.iter().filter_map(|c| c.control_id()));
    for name in names {
        if !seen.insert(name) {
            return Err(FormError::DuplicateName(name.to_owned()));
        }
    }
    Ok(fields.into_iter().cloned().collect())
}
