#![forbid(unsafe_code)]

//! Form events as data.
//!
//! Every mutation of a [`FormController`] can be expressed as a [`FormEvent`]
//! and applied through [`FormController::dispatch`]. Hosts that queue UI
//! input replay it with [`FormController::dispatch_all`].

use crate::controller::{FormController, PendingValidation};
use crate::error::FormResult;
use crate::value::FieldValue;

/// One user or host interaction with a form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormEvent {
    /// New value typed or selected.
    Change { field: String, value: FieldValue },
    /// Toggle flipped.
    Toggle { field: String },
    /// Checkbox option clicked.
    CheckBox { field: String, option: String },
    /// Focus left the field.
    Blur { field: String },
    /// Submission requested.
    Submit,
    /// Reset requested.
    Reset,
    /// External submit flag set to this value.
    SubmitTrigger(bool),
    /// External reset flag set to this value.
    ResetTrigger(bool),
    /// Control element activated.
    Press { id: String },
}

impl FormEvent {
    pub fn change(field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self::Change {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn toggle(field: impl Into<String>) -> Self {
        Self::Toggle {
            field: field.into(),
        }
    }

    pub fn check_box(field: impl Into<String>, option: impl Into<String>) -> Self {
        Self::CheckBox {
            field: field.into(),
            option: option.into(),
        }
    }

    pub fn blur(field: impl Into<String>) -> Self {
        Self::Blur {
            field: field.into(),
        }
    }

    pub fn press(id: impl Into<String>) -> Self {
        Self::Press { id: id.into() }
    }

    /// The field this event targets, if any.
    #[must_use]
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::Change { field, .. }
            | Self::Toggle { field }
            | Self::CheckBox { field, .. }
            | Self::Blur { field } => Some(field),
            _ => None,
        }
    }
}

impl FormController {
    /// Apply one event. Only [`FormEvent::Blur`] can yield a pending validation.
    pub fn dispatch(&mut self, event: FormEvent) -> FormResult<Option<PendingValidation>> {
        match event {
            FormEvent::Change { field, value } => self.handle_change(&field, value)?,
            FormEvent::Toggle { field } => self.handle_toggle(&field)?,
            FormEvent::CheckBox { field, option } => self.handle_change_checkbox(&field, &option)?,
            FormEvent::Blur { field } => return self.handle_blur(&field),
            FormEvent::Submit => {
                self.submit();
            }
            FormEvent::Reset => self.reset(),
            FormEvent::SubmitTrigger(flag) => {
                self.set_submit_trigger(flag);
            }
            FormEvent::ResetTrigger(flag) => {
                self.set_reset_trigger(flag);
            }
            FormEvent::Press { id } => self.press(&id)?,
        }
        Ok(None)
    }

    /// Apply events in order, stopping at the first error.
    ///
    /// Returns the validations started along the way, in blur order.
    pub fn dispatch_all(
        &mut self,
        events: impl IntoIterator<Item = FormEvent>,
    ) -> FormResult<Vec<PendingValidation>> {
        let mut pending = Vec::new();
        for event in events {
            if let Some(validation) = self.dispatch(event)? {
                pending.push(validation);
            }
        }
        Ok(pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FormError;
    use crate::field::{FieldDescriptor, FormElement};

    fn form() -> FormController {
        FormController::new([
            FieldDescriptor::text("name").required("Name is required").into(),
            FieldDescriptor::toggle("public").into(),
            FieldDescriptor::checkbox("grants").into(),
            FormElement::submit("save"),
        ])
        .unwrap()
    }

    #[test]
    fn dispatch_all_applies_in_order() {
        let mut form = form();
        let pending = form
            .dispatch_all([
                FormEvent::change("name", "portal"),
                FormEvent::blur("name"),
                FormEvent::toggle("public"),
                FormEvent::check_box("grants", "code"),
                FormEvent::check_box("grants", "implicit"),
                FormEvent::check_box("grants", "code"),
            ])
            .unwrap();
        assert!(pending.is_empty());
        assert_eq!(form.values().text("name"), Some("portal"));
        assert_eq!(form.values().text("public"), Some("true"));
        assert_eq!(form.value("grants"), Some(&FieldValue::list(["implicit"])));
    }

    #[test]
    fn dispatch_all_stops_at_first_error() {
        let mut form = form();
        let err = form
            .dispatch_all([
                FormEvent::change("name", "a"),
                FormEvent::toggle("name"),
                FormEvent::change("name", "b"),
            ])
            .unwrap_err();
        assert!(matches!(err, FormError::KindMismatch { .. }));
        assert_eq!(form.values().text("name"), Some("a"));
    }

    #[test]
    fn event_field() {
        assert_eq!(FormEvent::blur("x").field(), Some("x"));
        assert_eq!(FormEvent::Submit.field(), None);
        assert_eq!(FormEvent::press("save").field(), None);
    }
}
