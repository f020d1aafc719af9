#![forbid(unsafe_code)]

//! Controller configuration.

use crate::field::DisplayErrorOn;

/// Default cap on recorded validation events.
pub const DEFAULT_TRACE_CAPACITY: usize = 256;

/// Form-wide settings applied by [`FormController`](crate::FormController).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormConfig {
    /// Error display timing for fields that do not set their own.
    pub default_display_error_on: DisplayErrorOn,
    /// Trim text values (and write them back) when checking required fields.
    pub trim_on_validate: bool,
    /// Maximum validation trace length; `None` keeps every event.
    pub trace_capacity: Option<usize>,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            default_display_error_on: DisplayErrorOn::Blur,
            trim_on_validate: true,
            trace_capacity: Some(DEFAULT_TRACE_CAPACITY),
        }
    }
}

impl FormConfig {
    /// Set the fallback error display timing.
    #[must_use]
    pub fn with_default_display_error_on(mut self, on: DisplayErrorOn) -> Self {
        self.default_display_error_on = on;
        self
    }

    /// Enable or disable trimming on blur.
    #[must_use]
    pub fn with_trim_on_validate(mut self, trim: bool) -> Self {
        self.trim_on_validate = trim;
        self
    }

    /// Cap the validation trace, or pass `None` for an unbounded trace.
    #[must_use]
    pub fn with_trace_capacity(mut self, capacity: Option<usize>) -> Self {
        self.trace_capacity = capacity;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = FormConfig::default();
        assert_eq!(config.default_display_error_on, DisplayErrorOn::Blur);
        assert!(config.trim_on_validate);
        assert_eq!(config.trace_capacity, Some(DEFAULT_TRACE_CAPACITY));
    }

    #[test]
    fn builders() {
        let config = FormConfig::default()
            .with_default_display_error_on(DisplayErrorOn::Submit)
            .with_trim_on_validate(false)
            .with_trace_capacity(None);
        assert_eq!(config.default_display_error_on, DisplayErrorOn::Submit);
        assert!(!config.trim_on_validate);
        assert!(config.trace_capacity.is_none());
    }
}
