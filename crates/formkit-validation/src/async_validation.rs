#![forbid(unsafe_code)]

//! Per-field async validation with token-based staleness prevention.
//!
//! Every blur that starts a validation gets a fresh [`ValidationToken`]. A
//! result is applied only if its token is still the *current* token for that
//! field; anything older was superseded by a later blur, or cancelled by a
//! reset or by the field disappearing from the form, and is discarded.
//!
//! # Design Principles
//!
//! 1. **Monotonic Tokens**: tokens are issued from a single counter shared by
//!    all fields, so ordering across fields is observable in the trace.
//! 2. **Per-field Staleness**: a new validation for field `a` never affects
//!    in-flight work for field `b`.
//! 3. **Event Tracing**: every lifecycle step is recorded in a
//!    [`ValidationTrace`] that can be checksummed for golden comparison.
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use formkit_validation::AsyncValidationCoordinator;
//!
//! let mut coordinator = AsyncValidationCoordinator::new();
//! let first = coordinator.start_validation("username");
//! let second = coordinator.start_validation("username");
//!
//! // The first lookup finishes late and is ignored.
//! assert!(!coordinator.try_apply_result("username", first, true, Duration::ZERO));
//! assert!(coordinator.try_apply_result("username", second, false, Duration::ZERO));
//! assert!(!coordinator.has_in_flight());
//! ```

use std::collections::{BTreeMap, VecDeque};
use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

// ---------------------------------------------------------------------------
// ValidationToken
// ---------------------------------------------------------------------------

/// A monotonically increasing token identifying one validation request.
///
/// # Invariants
///
/// - Tokens are strictly monotonic: `token_n < token_{n+1}`
/// - Token 0 is reserved for "no validation"
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ValidationToken(u64);

impl ValidationToken {
    /// The null token representing no validation.
    pub const NONE: Self = Self(0);

    /// Create a token from a raw value (for testing).
    #[must_use]
    pub const fn from_raw(value: u64) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }

    #[must_use]
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }
}

impl std::fmt::Display for ValidationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Token({})", self.0)
    }
}

// ---------------------------------------------------------------------------
// ValidationEvent
// ---------------------------------------------------------------------------

/// A step in the lifecycle of one field validation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValidationEvent {
    /// Validation started for a field.
    Started {
        field: String,
        token: ValidationToken,
        elapsed_ns: u64,
    },
    /// An in-flight validation was cancelled.
    ///
    /// `superseded_by` is [`ValidationToken::NONE`] when the cancellation came
    /// from a reset or from the field being removed.
    Cancelled {
        field: String,
        token: ValidationToken,
        superseded_by: ValidationToken,
        elapsed_ns: u64,
    },
    /// A validation result arrived (it may still be discarded).
    Completed {
        field: String,
        token: ValidationToken,
        is_valid: bool,
        duration_ns: u64,
        elapsed_ns: u64,
    },
    /// The result was applied to the form state.
    Applied {
        field: String,
        token: ValidationToken,
        is_valid: bool,
        elapsed_ns: u64,
    },
    /// The result was discarded as stale.
    StaleDiscarded {
        field: String,
        token: ValidationToken,
        /// The field's current token when the result arrived.
        current_token: ValidationToken,
        elapsed_ns: u64,
    },
}

impl ValidationEvent {
    #[must_use]
    pub fn token(&self) -> ValidationToken {
        match self {
            Self::Started { token, .. }
            | Self::Cancelled { token, .. }
            | Self::Completed { token, .. }
            | Self::Applied { token, .. }
            | Self::StaleDiscarded { token, .. } => *token,
        }
    }

    #[must_use]
    pub fn field(&self) -> &str {
        match self {
            Self::Started { field, .. }
            | Self::Cancelled { field, .. }
            | Self::Completed { field, .. }
            | Self::Applied { field, .. }
            | Self::StaleDiscarded { field, .. } => field,
        }
    }

    /// Event type name for logging.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Started { .. } => "started",
            Self::Cancelled { .. } => "cancelled",
            Self::Completed { .. } => "completed",
            Self::Applied { .. } => "applied",
            Self::StaleDiscarded { .. } => "stale_discarded",
        }
    }
}

// ---------------------------------------------------------------------------
// ValidationTrace
// ---------------------------------------------------------------------------

/// An ordered log of validation events.
///
/// With a capacity set, the oldest events are dropped first.
#[derive(Debug, Clone, Default)]
pub struct ValidationTrace {
    events: VecDeque<ValidationEvent>,
    capacity: Option<usize>,
    dropped: u64,
}

impl ValidationTrace {
    /// Create an unbounded trace.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a trace that keeps at most `capacity` events.
    #[must_use]
    pub fn with_capacity_limit(capacity: usize) -> Self {
        Self {
            capacity: Some(capacity),
            ..Self::default()
        }
    }

    pub fn push(&mut self, event: ValidationEvent) {
        if let Some(cap) = self.capacity {
            if cap == 0 {
                self.dropped += 1;
                return;
            }
            while self.events.len() >= cap {
                self.events.pop_front();
                self.dropped += 1;
            }
        }
        self.events.push_back(event);
    }

    pub fn events(&self) -> impl Iterator<Item = &ValidationEvent> {
        self.events.iter()
    }

    /// Check if the trace contains a specific event type for a token.
    #[must_use]
    pub fn contains_event_type(&self, token: ValidationToken, event_type: &str) -> bool {
        self.events
            .iter()
            .any(|e| e.token() == token && e.event_type() == event_type)
    }

    #[must_use]
    pub fn events_for_token(&self, token: ValidationToken) -> Vec<&ValidationEvent> {
        self.events.iter().filter(|e| e.token() == token).collect()
    }

    #[must_use]
    pub fn events_for_field(&self, field: &str) -> Vec<&ValidationEvent> {
        self.events.iter().filter(|e| e.field() == field).collect()
    }

    /// Checksum over all retained events and their order.
    #[must_use]
    pub fn checksum(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        for event in &self.events {
            event.hash(&mut hasher);
        }
        hasher.finish()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Number of events dropped because of the capacity limit.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Verify trace invariants, returning a description of each violation.
    #[must_use]
    pub fn verify_invariants(&self) -> Vec<String> {
        let mut violations = Vec::new();

        let mut last_started = ValidationToken::NONE;
        for event in &self.events {
            if let ValidationEvent::Started { token, .. } = event {
                if *token <= last_started {
                    violations.push(format!(
                        "Non-monotonic start token: {token} after {last_started}"
                    ));
                }
                last_started = *token;
            }
        }

        for event in &self.events {
            if let ValidationEvent::StaleDiscarded {
                token,
                current_token,
                ..
            } = event
                && !current_token.is_none()
                && token > current_token
            {
                violations.push(format!(
                    "StaleDiscarded with token newer than current: {token} > {current_token}"
                ));
            }
        }

        violations
    }
}

// ---------------------------------------------------------------------------
// AsyncValidationCoordinator
// ---------------------------------------------------------------------------

/// The in-flight validation of a single field.
#[derive(Debug, Clone)]
pub struct InFlightValidation {
    pub token: ValidationToken,
    pub started_at: Instant,
}

#[derive(Debug, Clone, Default)]
struct FieldSlot {
    current: ValidationToken,
    in_flight: Option<InFlightValidation>,
}

/// Coordinates async validations for every field of one form.
///
/// Single-threaded: the form's owner starts validations and applies their
/// results; only the validation futures themselves run elsewhere.
pub struct AsyncValidationCoordinator {
    next_token: u64,
    fields: BTreeMap<String, FieldSlot>,
    trace: ValidationTrace,
    created_at: Instant,
    fixed_clock: Option<Arc<AtomicU64>>,
}

impl std::fmt::Debug for AsyncValidationCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncValidationCoordinator")
            .field("next_token", &self.next_token)
            .field("in_flight_count", &self.in_flight_count())
            .field("trace_events", &self.trace.len())
            .finish()
    }
}

impl Default for AsyncValidationCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl AsyncValidationCoordinator {
    /// Create a coordinator with an unbounded trace.
    #[must_use]
    pub fn new() -> Self {
        Self::with_trace(ValidationTrace::new())
    }

    /// Create a coordinator recording into the given trace.
    #[must_use]
    pub fn with_trace(trace: ValidationTrace) -> Self {
        Self {
            next_token: 1,
            fields: BTreeMap::new(),
            trace,
            created_at: Instant::now(),
            fixed_clock: None,
        }
    }

    /// Create a coordinator with a fixed clock for deterministic traces.
    ///
    /// The clock value is nanoseconds since coordinator creation.
    #[must_use]
    pub fn with_fixed_clock(clock: Arc<AtomicU64>) -> Self {
        Self {
            fixed_clock: Some(clock),
            ..Self::new()
        }
    }

    fn elapsed_ns(&self) -> u64 {
        self.fixed_clock.as_ref().map_or_else(
            || self.created_at.elapsed().as_nanos() as u64,
            |clock| clock.load(Ordering::SeqCst),
        )
    }

    /// Start a validation for `field`, superseding any in-flight one.
    pub fn start_validation(&mut self, field: &str) -> ValidationToken {
        let token = ValidationToken(self.next_token);
        self.next_token += 1;
        let elapsed_ns = self.elapsed_ns();

        let slot = self.fields.entry(field.to_owned()).or_default();
        if let Some(previous) = slot.in_flight.take() {
            tracing::trace!(field, token = previous.token.raw(), "validation superseded");
            self.trace.push(ValidationEvent::Cancelled {
                field: field.to_owned(),
                token: previous.token,
                superseded_by: token,
                elapsed_ns,
            });
        }
        slot.current = token;
        slot.in_flight = Some(InFlightValidation {
            token,
            started_at: Instant::now(),
        });

        self.trace.push(ValidationEvent::Started {
            field: field.to_owned(),
            token,
            elapsed_ns,
        });
        token
    }

    /// The current token for `field`, or `NONE`.
    #[must_use]
    pub fn current_token(&self, field: &str) -> ValidationToken {
        self.fields
            .get(field)
            .map_or(ValidationToken::NONE, |slot| slot.current)
    }

    /// Try to apply a result for `field`.
    ///
    /// Returns `true` if `token` is the field's current token and the result
    /// should be committed, `false` if it was discarded as stale.
    pub fn try_apply_result(
        &mut self,
        field: &str,
        token: ValidationToken,
        is_valid: bool,
        duration: Duration,
    ) -> bool {
        let elapsed_ns = self.elapsed_ns();
        self.trace.push(ValidationEvent::Completed {
            field: field.to_owned(),
            token,
            is_valid,
            duration_ns: duration.as_nanos() as u64,
            elapsed_ns,
        });

        let current = self.current_token(field);
        let live = self
            .fields
            .get(field)
            .and_then(|slot| slot.in_flight.as_ref())
            .is_some_and(|in_flight| in_flight.token == token);

        if token.is_none() || token != current || !live {
            tracing::debug!(
                field,
                token = token.raw(),
                current = current.raw(),
                "stale validation result discarded"
            );
            self.trace.push(ValidationEvent::StaleDiscarded {
                field: field.to_owned(),
                token,
                current_token: current,
                elapsed_ns,
            });
            return false;
        }

        if let Some(slot) = self.fields.get_mut(field) {
            slot.in_flight = None;
        }
        self.trace.push(ValidationEvent::Applied {
            field: field.to_owned(),
            token,
            is_valid,
            elapsed_ns,
        });
        true
    }

    /// Cancel the in-flight validation of `field`, if any.
    ///
    /// Returns `true` if something was cancelled.
    pub fn cancel(&mut self, field: &str) -> bool {
        let elapsed_ns = self.elapsed_ns();
        let Some(slot) = self.fields.get_mut(field) else {
            return false;
        };
        slot.current = ValidationToken::NONE;
        let Some(previous) = slot.in_flight.take() else {
            return false;
        };
        self.trace.push(ValidationEvent::Cancelled {
            field: field.to_owned(),
            token: previous.token,
            superseded_by: ValidationToken::NONE,
            elapsed_ns,
        });
        true
    }

    /// Cancel every in-flight validation. Returns how many were cancelled.
    pub fn cancel_all(&mut self) -> usize {
        let fields: Vec<String> = self.fields.keys().cloned().collect();
        fields.iter().filter(|field| self.cancel(field)).count()
    }

    /// Drop all bookkeeping for fields not in `keep`, cancelling their work.
    pub fn retain_fields<F>(&mut self, mut keep: F)
    where
        F: FnMut(&str) -> bool,
    {
        let removed: Vec<String> = self
            .fields
            .keys()
            .filter(|name| !keep(name.as_str()))
            .cloned()
            .collect();
        for field in removed {
            self.cancel(&field);
            self.fields.remove(&field);
        }
    }

    #[must_use]
    pub fn is_in_flight(&self, field: &str) -> bool {
        self.fields
            .get(field)
            .is_some_and(|slot| slot.in_flight.is_some())
    }

    #[must_use]
    pub fn in_flight_count(&self) -> usize {
        self.fields
            .values()
            .filter(|slot| slot.in_flight.is_some())
            .count()
    }

    #[must_use]
    pub fn has_in_flight(&self) -> bool {
        self.in_flight_count() > 0
    }

    /// Names of fields with a validation in flight, in name order.
    pub fn in_flight_fields(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .filter(|(_, slot)| slot.in_flight.is_some())
            .map(|(name, _)| name.as_str())
    }

    #[must_use]
    pub fn trace(&self) -> &ValidationTrace {
        &self.trace
    }

    pub fn clear_trace(&mut self) {
        self.trace.clear();
    }

    /// Verify trace invariants.
    pub fn verify_trace(&self) -> Result<(), Vec<String>> {
        let violations = self.trace.verify_invariants();
        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
