#![forbid(unsafe_code)]

//! Owned form state and its transitions.
//!
//! [`FormState`] is plain data: every user interaction is a method that
//! mutates it in place, with no callbacks and no async. The
//! [`FormController`](crate::FormController) layers descriptors, callbacks and
//! validation dispatch on top.
//!
//! # Invariants
//!
//! After every [`sync`](FormState::sync) the key sets of values, touched,
//! modifying, required, validity and recorded initial values are exactly the
//! declared field names.

use std::collections::{BTreeMap, BTreeSet};

use formkit_validation::FieldValidity;

use crate::field::{DisplayErrorOn, FieldDescriptor, FieldKind};
use crate::value::{FieldValue, FormValues, TOGGLE_OFF};

/// Field name to "required constraint currently satisfied".
pub type RequiredMap = BTreeMap<String, bool>;

/// Field name to accumulated validity.
pub type ValidityMap = BTreeMap<String, FieldValidity>;

/// Why a synchronization pass runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncReason {
    /// The descriptor tree was (re)installed.
    Normal,
    /// The form is being reset to its empty values.
    Reset,
}

/// Outcome of settling a submission request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubmitStatus {
    /// No submission was requested.
    Idle,
    /// A submission is waiting for in-flight validations.
    Pending,
    /// Every constraint passed; the values should be submitted.
    Submitted,
    /// Some field failed; the submission was rejected.
    Blocked,
}

/// Whether `value` fills a required field of `kind`.
pub(crate) fn is_filled(kind: FieldKind, value: &FieldValue) -> bool {
    match kind {
        FieldKind::Toggle => !value.is_blank() && value.as_text() != Some(TOGGLE_OFF),
        FieldKind::Checkbox => !value.clone().into_list().is_empty(),
        _ => !value.is_blank(),
    }
}

/// Values, interaction flags and check results of one mounted form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormState {
    values: FormValues,
    touched: BTreeMap<String, bool>,
    modifying: BTreeMap<String, bool>,
    required: RequiredMap,
    valid: ValidityMap,
    initials: BTreeMap<String, Option<FieldValue>>,
    validating: BTreeSet<String>,
    is_submitting: bool,
    start_submission: bool,
}

impl FormState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bring the state in line with the declared fields.
    ///
    /// Fields are seeded when untouched, on reset, or when they opt into
    /// reinitialization and their initial value changed. Everything recorded
    /// for undeclared names is dropped.
    pub fn sync(&mut self, fields: &[FieldDescriptor], reason: SyncReason) {
        let is_reset = reason == SyncReason::Reset;
        if is_reset {
            self.is_submitting = false;
            self.start_submission = false;
            self.validating.clear();
        }

        let mut reseeded = 0usize;
        for field in fields {
            let name = field.name.as_str();
            let touched = self.touched.get(name).copied().unwrap_or(false);
            let initial_changed = self
                .initials
                .get(name)
                .is_none_or(|recorded| *recorded != field.initial_value);
            let reseed = !touched
                || is_reset
                || (field.enable_reinitialize && initial_changed)
                || !self.values.contains(name);

            if reseed {
                let seed = match (&field.initial_value, is_reset) {
                    (Some(initial), false) => initial.clone(),
                    _ => field.empty_value(),
                };
                self.values.insert(name, seed);
                reseeded += 1;
            }
            self.initials
                .insert(name.to_owned(), field.initial_value.clone());

            let satisfied = !field.enforces_required()
                || (!is_reset
                    && self
                        .values
                        .get(name)
                        .is_some_and(|value| is_filled(field.kind, value)));
            self.required.insert(name.to_owned(), satisfied);

            if is_reset || !self.valid.contains_key(name) {
                self.valid.insert(name.to_owned(), FieldValidity::valid());
                self.touched.insert(name.to_owned(), false);
            }
            self.touched.entry(name.to_owned()).or_insert(false);
            if is_reset {
                self.modifying.insert(name.to_owned(), false);
            } else {
                self.modifying.entry(name.to_owned()).or_insert(false);
            }
        }

        let declared: BTreeSet<&str> = fields.iter().map(|f| f.name.as_str()).collect();
        self.values.retain(|name| declared.contains(name));
        self.values.reorder(fields.iter().map(|f| f.name.as_str()));
        self.touched.retain(|name, _| declared.contains(name.as_str()));
        self.modifying.retain(|name, _| declared.contains(name.as_str()));
        self.required.retain(|name, _| declared.contains(name.as_str()));
        self.valid.retain(|name, _| declared.contains(name.as_str()));
        self.initials.retain(|name, _| declared.contains(name.as_str()));
        self.validating.retain(|name| declared.contains(name.as_str()));

        tracing::trace!(
            reason = ?reason,
            fields = fields.len(),
            reseeded,
            "form state synced"
        );
    }

    /// Store a new value for an edit in progress.
    pub fn set_value(&mut self, name: &str, value: FieldValue) {
        self.values.insert(name, value);
        self.touched.insert(name.to_owned(), true);
        self.modifying.insert(name.to_owned(), true);
    }

    /// Flip a toggle between `"true"` and `"false"`. Returns the new value.
    pub fn toggle(&mut self, name: &str) -> FieldValue {
        let on = self
            .values
            .get(name)
            .is_some_and(FieldValue::is_toggled_on);
        let value = FieldValue::toggle(!on);
        self.values.insert(name, value.clone());
        self.touched.insert(name.to_owned(), true);
        value
    }

    /// Add `option` to a checkbox selection, or remove its first occurrence.
    ///
    /// Returns `true` if the option is selected afterwards.
    pub fn toggle_checkbox(&mut self, name: &str, option: &str) -> bool {
        let mut selected = self
            .values
            .get(name)
            .cloned()
            .unwrap_or_default()
            .into_list();
        let now_selected = match selected.iter().position(|s| s == option) {
            Some(idx) => {
                selected.remove(idx);
                false
            }
            None => {
                selected.push(option.to_owned());
                true
            }
        };
        self.values.insert(name, FieldValue::List(selected));
        self.touched.insert(name.to_owned(), true);
        now_selected
    }

    /// The user left the field: stop suppressing errors and mark it validating.
    pub fn begin_blur(&mut self, name: &str) {
        self.modifying.insert(name.to_owned(), false);
        self.touched.insert(name.to_owned(), true);
        self.validating.insert(name.to_owned());
    }

    /// Re-evaluate the required constraint of `field` against its stored value.
    ///
    /// With `trim` set, text-like values are trimmed and written back first.
    pub fn check_required(&mut self, field: &FieldDescriptor, trim: bool) {
        if !field.enforces_required() {
            return;
        }
        let name = field.name.as_str();
        if trim && field.kind.trims_on_blur() {
            if let Some(FieldValue::Text(text)) = self.values.get_mut(name) {
                let trimmed = text.trim();
                if trimmed.len() != text.len() {
                    *text = trimmed.to_owned();
                }
            }
        }
        let satisfied = self
            .values
            .get(name)
            .is_some_and(|value| is_filled(field.kind, value));
        self.required.insert(name.to_owned(), satisfied);
    }

    /// Record a settled validation for `name`.
    pub fn apply_validation(&mut self, name: &str, validity: FieldValidity) {
        self.valid.insert(name.to_owned(), validity);
        self.validating.remove(name);
    }

    /// Stop waiting on a validation for `name` without recording a result.
    pub fn abandon_validation(&mut self, name: &str) {
        self.validating.remove(name);
    }

    /// Ask for a submission on the next settle.
    pub fn request_submission(&mut self) {
        self.start_submission = true;
    }

    /// What settling would do right now, without changing anything.
    #[must_use]
    pub fn submission_decision(&self) -> SubmitStatus {
        if !self.start_submission {
            SubmitStatus::Idle
        } else if self.is_validating() {
            SubmitStatus::Pending
        } else if self.all_passing() {
            SubmitStatus::Submitted
        } else {
            SubmitStatus::Blocked
        }
    }

    /// Resolve a requested submission if no validation is in flight.
    pub fn settle_submission(&mut self) -> SubmitStatus {
        let status = self.submission_decision();
        match status {
            SubmitStatus::Idle => {}
            SubmitStatus::Pending => self.is_submitting = true,
            SubmitStatus::Submitted => {
                self.start_submission = false;
                self.is_submitting = false;
            }
            SubmitStatus::Blocked => {
                self.start_submission = false;
                self.is_submitting = true;
            }
        }
        status
    }

    /// Every required field satisfied and every field valid.
    #[must_use]
    pub fn all_passing(&self) -> bool {
        self.required.values().all(|ok| *ok) && self.valid.values().all(FieldValidity::is_valid)
    }

    /// Whether the errors of `field` should be shown.
    ///
    /// Never while the field is mid-edit. Otherwise only for a failing
    /// required check or failing declared validation, and only after a
    /// submission attempt or, for blur-time display, once touched.
    #[must_use]
    pub fn check_error(&self, field: &FieldDescriptor, default_on: DisplayErrorOn) -> bool {
        let name = field.name.as_str();
        if self.is_modifying(name) {
            return false;
        }
        if !self.required_failed(field) && !self.validation_failed(field) {
            return false;
        }
        let display_on = field.display_error_on.unwrap_or(default_on);
        self.is_submitting || (self.is_touched(name) && display_on == DisplayErrorOn::Blur)
    }

    /// Messages to display for `field`, empty when [`check_error`](Self::check_error) is false.
    #[must_use]
    pub fn visible_errors(&self, field: &FieldDescriptor, default_on: DisplayErrorOn) -> Vec<String> {
        if !self.check_error(field, default_on) {
            return Vec::new();
        }
        if self.required_failed(field) {
            return vec![field.required_error_message.clone()];
        }
        self.valid
            .get(field.name.as_str())
            .map(|validity| validity.error_messages().to_vec())
            .unwrap_or_default()
    }

    fn required_failed(&self, field: &FieldDescriptor) -> bool {
        field.enforces_required() && self.required.get(field.name.as_str()) == Some(&false)
    }

    fn validation_failed(&self, field: &FieldDescriptor) -> bool {
        field.has_validation()
            && self
                .valid
                .get(field.name.as_str())
                .is_some_and(|validity| !validity.is_valid())
    }

    #[must_use]
    pub fn values(&self) -> &FormValues {
        &self.values
    }

    #[must_use]
    pub fn value(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(name)
    }

    #[must_use]
    pub fn is_touched(&self, name: &str) -> bool {
        self.touched.get(name).copied().unwrap_or(false)
    }

    #[must_use]
    pub fn is_modifying(&self, name: &str) -> bool {
        self.modifying.get(name).copied().unwrap_or(false)
    }

    /// Whether the required constraint of `name` is satisfied.
    /// Undeclared names pass.
    #[must_use]
    pub fn is_required_satisfied(&self, name: &str) -> bool {
        self.required.get(name).copied().unwrap_or(true)
    }

    #[must_use]
    pub fn validity(&self, name: &str) -> Option<&FieldValidity> {
        self.valid.get(name)
    }

    #[must_use]
    pub fn touched_map(&self) -> &BTreeMap<String, bool> {
        &self.touched
    }

    #[must_use]
    pub fn modifying_map(&self) -> &BTreeMap<String, bool> {
        &self.modifying
    }

    #[must_use]
    pub fn required_map(&self) -> &RequiredMap {
        &self.required
    }

    #[must_use]
    pub fn validity_map(&self) -> &ValidityMap {
        &self.valid
    }

    /// The initial value recorded for `name` on the last sync.
    #[must_use]
    pub fn recorded_initial(&self, name: &str) -> Option<&FieldValue> {
        self.initials.get(name).and_then(Option::as_ref)
    }

    /// Names with a recorded initial value slot, i.e. the declared fields.
    pub fn recorded_names(&self) -> impl Iterator<Item = &str> {
        self.initials.keys().map(String::as_str)
    }

    #[must_use]
    pub fn is_validating(&self) -> bool {
        !self.validating.is_empty()
    }

    pub fn validating_fields(&self) -> impl Iterator<Item = &str> {
        self.validating.iter().map(String::as_str)
    }

    #[must_use]
    pub fn is_submitting(&self) -> bool {
        self.is_submitting
    }

    #[must_use]
    pub fn start_submission(&self) -> bool {
        self.start_submission
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn synced(fields: &[FieldDescriptor]) -> FormState {
        let mut state = FormState::new();
        state.sync(fields, SyncReason::Normal);
        state
    }

    #[test]
    fn seeds_by_kind() {
        let fields = vec![
            FieldDescriptor::text("name").initial_value("app"),
            FieldDescriptor::dropdown("grant").default_value("code"),
            FieldDescriptor::radio("mode").default_value("a"),
            FieldDescriptor::checkbox("scopes"),
            FieldDescriptor::toggle("enabled"),
            FieldDescriptor::text("description"),
        ];
        let state = synced(&fields);
        assert_eq!(state.values().text("name"), Some("app"));
        assert_eq!(state.values().text("grant"), Some("code"));
        assert_eq!(state.values().text("mode"), Some("a"));
        assert_eq!(state.value("scopes"), Some(&FieldValue::List(vec![])));
        assert_eq!(state.values().text("enabled"), Some("false"));
        assert_eq!(state.values().text("description"), Some(""));
        assert_eq!(
            state.values().names().collect::<Vec<_>>(),
            ["name", "grant", "mode", "scopes", "enabled", "description"]
        );
    }

    #[test]
    fn required_satisfaction_on_sync() {
        let fields = vec![
            FieldDescriptor::text("empty").required("x"),
            FieldDescriptor::text("blank").required("x").initial_value("   "),
            FieldDescriptor::text("filled").required("x").initial_value("x"),
            FieldDescriptor::toggle("off").required("x"),
            FieldDescriptor::radio("radio").required("x"),
            FieldDescriptor::text("optional"),
        ];
        let state = synced(&fields);
        assert!(!state.is_required_satisfied("empty"));
        assert!(!state.is_required_satisfied("blank"));
        assert!(state.is_required_satisfied("filled"));
        assert!(!state.is_required_satisfied("off"));
        assert!(state.is_required_satisfied("radio"));
        assert!(state.is_required_satisfied("optional"));
        assert!(state.is_required_satisfied("undeclared"));
    }

    #[test]
    fn touched_values_survive_normal_sync() {
        let mut fields = vec![FieldDescriptor::text("name").initial_value("a")];
        let mut state = synced(&fields);
        state.set_value("name", "edited".into());

        fields[0] = FieldDescriptor::text("name").initial_value("b");
        state.sync(&fields, SyncReason::Normal);
        assert_eq!(state.values().text("name"), Some("edited"));
        assert_eq!(state.recorded_initial("name"), Some(&FieldValue::text("b")));
    }

    #[test]
    fn reinitialize_reseeds_touched_field() {
        let mut fields = vec![
            FieldDescriptor::text("name")
                .initial_value("a")
                .enable_reinitialize(),
        ];
        let mut state = synced(&fields);
        state.set_value("name", "edited".into());

        state.sync(&fields, SyncReason::Normal);
        assert_eq!(state.values().text("name"), Some("edited"));

        fields[0] = FieldDescriptor::text("name")
            .initial_value("b")
            .enable_reinitialize();
        state.sync(&fields, SyncReason::Normal);
        assert_eq!(state.values().text("name"), Some("b"));
        assert!(state.is_touched("name"));
    }

    #[test]
    fn sync_prunes_removed_fields() {
        let mut fields = vec![FieldDescriptor::text("a"), FieldDescriptor::text("b")];
        let mut state = synced(&fields);
        state.begin_blur("b");
        fields.pop();
        state.sync(&fields, SyncReason::Normal);

        let names = |m: &BTreeMap<String, _>| m.keys().cloned().collect::<Vec<_>>();
        assert_eq!(state.values().names().collect::<Vec<_>>(), ["a"]);
        assert_eq!(names(state.touched_map()), ["a"]);
        assert_eq!(names(state.modifying_map()), ["a"]);
        assert_eq!(names(state.required_map()), ["a"]);
        assert_eq!(state.validity_map().keys().collect::<Vec<_>>(), ["a"]);
        assert!(!state.is_validating());
    }

    #[test]
    fn reset_ignores_initial_values_and_clears_flags() {
        let fields = vec![
            FieldDescriptor::text("name").initial_value("app").required("x"),
            FieldDescriptor::checkbox("scopes"),
        ];
        let mut state = synced(&fields);
        state.set_value("name", "other".into());
        state.toggle_checkbox("scopes", "openid");
        state.begin_blur("name");
        state.request_submission();
        state.settle_submission();

        state.sync(&fields, SyncReason::Reset);
        assert_eq!(state.values().text("name"), Some(""));
        assert_eq!(state.value("scopes"), Some(&FieldValue::List(vec![])));
        assert!(!state.is_touched("name"));
        assert!(!state.is_modifying("name"));
        assert!(!state.is_required_satisfied("name"));
        assert!(!state.is_submitting());
        assert!(!state.start_submission());
        assert!(!state.is_validating());
    }

    #[test]
    fn toggle_flips() {
        let fields = vec![FieldDescriptor::toggle("enabled")];
        let mut state = synced(&fields);
        assert_eq!(state.toggle("enabled"), FieldValue::text("true"));
        assert_eq!(state.toggle("enabled"), FieldValue::text("false"));
        assert!(state.is_touched("enabled"));
        assert!(!state.is_modifying("enabled"));
    }

    #[test]
    fn checkbox_removes_first_occurrence() {
        let fields = vec![FieldDescriptor::checkbox("c").initial_value(vec![
            "a".to_owned(),
            "b".to_owned(),
            "a".to_owned(),
        ])];
        let mut state = synced(&fields);
        assert!(!state.toggle_checkbox("c", "a"));
        assert_eq!(state.value("c"), Some(&FieldValue::list(["b", "a"])));
        assert!(state.toggle_checkbox("c", "z"));
        assert_eq!(state.value("c"), Some(&FieldValue::list(["b", "a", "z"])));
    }

    #[test]
    fn blur_trims_required_text_but_not_passwords() {
        let name = FieldDescriptor::text("name").required("x");
        let secret = FieldDescriptor::password("secret").required("x");
        let fields = vec![name.clone(), secret.clone()];
        let mut state = synced(&fields);
        state.set_value("name", "  app  ".into());
        state.set_value("secret", " pw ".into());

        state.check_required(&name, true);
        state.check_required(&secret, true);
        assert_eq!(state.values().text("name"), Some("app"));
        assert_eq!(state.values().text("secret"), Some(" pw "));
        assert!(state.is_required_satisfied("name"));
        assert!(state.is_required_satisfied("secret"));
    }

    #[test]
    fn submission_waits_for_validation() {
        let fields = vec![FieldDescriptor::text("name")];
        let mut state = synced(&fields);
        assert_eq!(state.settle_submission(), SubmitStatus::Idle);

        state.begin_blur("name");
        state.request_submission();
        assert_eq!(state.settle_submission(), SubmitStatus::Pending);
        assert!(state.is_submitting());
        assert!(state.start_submission());

        state.apply_validation("name", FieldValidity::invalid("taken"));
        assert_eq!(state.settle_submission(), SubmitStatus::Blocked);
        assert!(state.is_submitting());
        assert!(!state.start_submission());
    }

    #[test]
    fn check_error_rules() {
        let field = FieldDescriptor::text("name").required("Name is required");
        let on_submit = FieldDescriptor::text("late")
            .required("Late")
            .display_error_on(DisplayErrorOn::Submit);
        let fields = vec![field.clone(), on_submit.clone()];
        let mut state = synced(&fields);

        // Untouched: hidden.
        assert!(!state.check_error(&field, DisplayErrorOn::Blur));

        // Mid-edit: hidden.
        state.set_value("name", "".into());
        assert!(!state.check_error(&field, DisplayErrorOn::Blur));

        state.begin_blur("name");
        state.check_required(&field, true);
        assert!(state.check_error(&field, DisplayErrorOn::Blur));
        assert_eq!(
            state.visible_errors(&field, DisplayErrorOn::Blur),
            ["Name is required"]
        );

        state.begin_blur("late");
        assert!(!state.check_error(&on_submit, DisplayErrorOn::Blur));
        state.request_submission();
        state.apply_validation("name", FieldValidity::valid());
        state.apply_validation("late", FieldValidity::valid());
        assert_eq!(state.settle_submission(), SubmitStatus::Blocked);
        assert!(state.check_error(&on_submit, DisplayErrorOn::Blur));
    }

    #[test]
    fn validation_errors_hidden_without_declared_validation() {
        let plain = FieldDescriptor::text("plain");
        let mut state = synced(std::slice::from_ref(&plain));
        state.begin_blur("plain");
        state.apply_validation("plain", FieldValidity::invalid("ignored"));
        assert!(!state.check_error(&plain, DisplayErrorOn::Blur));
    }
}
