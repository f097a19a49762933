//! Type-state builder for `Stepper`.
//!
//! The builder enforces at compile time that bounds are provided before
//! `build()` is available. `try_build()` is always available for dynamic checks.

use std::cmp::Ordering;
use std::marker::PhantomData;
use std::rc::Rc;

use crossbeam_channel::Sender;
use stepper_traits::{Quantity, ValueOperation};

use crate::clamp::Validator;
use crate::config::{Bounds, LongPressCfg, PolicyCfg, StepperCfg, TimingCfg};
use crate::coordinator::Stepper;
use crate::error::{BuildError, Result};
use crate::events::{EventRecord, Sinks};
use crate::ledger::ErrorRecord;

// ── Type-state markers ───────────────────────────────────────────────────────

pub struct Missing;
pub struct Set;

/// Builder for `Stepper`. All fields are validated on `build()`.
pub struct StepperBuilder<T: Quantity, B> {
    bounds: Option<Bounds<T>>,
    committed: Option<T>,
    timing: Option<TimingCfg>,
    policy: Option<PolicyCfg>,
    long_press: Option<LongPressCfg>,
    operation: Option<Rc<dyn ValueOperation<T>>>,
    validator: Option<Validator<T>>,
    sinks: Sinks<T>,
    _b: PhantomData<B>,
}

impl<T: Quantity> StepperBuilder<T, Missing> {
    pub fn new() -> Self {
        Self {
            bounds: None,
            committed: None,
            timing: None,
            policy: None,
            long_press: None,
            operation: None,
            validator: None,
            sinks: Sinks::default(),
            _b: PhantomData,
        }
    }
}

impl<T: Quantity> Default for StepperBuilder<T, Missing> {
    fn default() -> Self {
        Self::new()
    }
}

/// Validate configuration and construct the coordinator.
fn validate_and_build<T: Quantity>(
    cfg: StepperCfg<T>,
    committed: Option<T>,
    operation: Option<Rc<dyn ValueOperation<T>>>,
    validator: Option<Validator<T>>,
    sinks: Sinks<T>,
) -> Result<Stepper<T>> {
    let Bounds { min, max, step } = cfg.bounds;
    if !matches!(min.partial_cmp(&max), Some(Ordering::Less | Ordering::Equal)) {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "min must be <= max",
        )));
    }
    if !step.is_positive() {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "step must be > 0",
        )));
    }
    if cfg.long_press.interval.is_zero() {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "long press interval must be > 0",
        )));
    }
    if cfg.timing.debounce_delay.is_some_and(|d| d.is_zero()) {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "debounce delay must be > 0 when set",
        )));
    }

    // One step below min is the "removed" value and may be shown.
    let committed = committed.unwrap_or(min);
    let floor = Quantity::checked_sub(min, step).unwrap_or(min);
    if committed < floor || committed > max || committed.partial_cmp(&committed).is_none() {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "committed value out of range",
        )));
    }

    tracing::debug!(
        %min,
        %max,
        %step,
        %committed,
        has_operation = operation.is_some(),
        debounce = ?cfg.timing.debounce_delay,
        "stepper built"
    );
    Ok(Stepper::from_parts(cfg, committed, operation, validator, sinks))
}

impl<T: Quantity, B> StepperBuilder<T, B> {
    /// Fallible build available in any type-state; returns detailed error for missing pieces.
    pub fn try_build(self) -> Result<Stepper<T>> {
        let bounds = self
            .bounds
            .ok_or_else(|| eyre::Report::new(BuildError::MissingBounds))?;
        let cfg = StepperCfg {
            bounds,
            timing: self.timing.unwrap_or_default(),
            policy: self.policy.unwrap_or_default(),
            long_press: self.long_press.unwrap_or_default(),
        };
        validate_and_build(cfg, self.committed, self.operation, self.validator, self.sinks)
    }
}

/// Chainable setters that do not affect type-state.
impl<T: Quantity, B> StepperBuilder<T, B> {
    pub fn with_committed(mut self, value: T) -> Self {
        self.committed = Some(value);
        self
    }
    pub fn with_timing(mut self, timing: TimingCfg) -> Self {
        self.timing = Some(timing);
        self
    }
    pub fn with_policy(mut self, policy: PolicyCfg) -> Self {
        self.policy = Some(policy);
        self
    }
    pub fn with_long_press(mut self, long_press: LongPressCfg) -> Self {
        self.long_press = Some(long_press);
        self
    }
    pub fn with_operation(mut self, operation: impl ValueOperation<T> + 'static) -> Self {
        self.operation = Some(Rc::new(operation));
        self
    }
    /// Sync predicate `(current, next) -> accepted`.
    pub fn with_validator<F>(mut self, f: F) -> Self
    where
        F: Fn(T, T) -> bool + 'static,
    {
        self.validator = Some(Box::new(f));
        self
    }
    /// Bounded feed of every event; a full channel drops events.
    pub fn with_event_feed(mut self, tx: Sender<EventRecord<T>>) -> Self {
        self.sinks.feed = Some(tx);
        self
    }
    pub fn on_commit(mut self, f: impl Fn(T) + 'static) -> Self {
        self.sinks.on_commit = Some(Box::new(f));
        self
    }
    pub fn on_removal(mut self, f: impl Fn(T) + 'static) -> Self {
        self.sinks.on_removal = Some(Box::new(f));
        self
    }
    pub fn on_validation_rejected(mut self, f: impl Fn(T, T) + 'static) -> Self {
        self.sinks.on_validation_rejected = Some(Box::new(f));
        self
    }
    pub fn on_operation_cancelled(mut self, f: impl Fn(T) + 'static) -> Self {
        self.sinks.on_operation_cancelled = Some(Box::new(f));
        self
    }
    pub fn on_error(mut self, f: impl Fn(&ErrorRecord<T>) + 'static) -> Self {
        self.sinks.on_error = Some(Box::new(f));
        self
    }
    pub fn on_max_reached(mut self, f: impl Fn() + 'static) -> Self {
        self.sinks.on_max_reached = Some(Box::new(f));
        self
    }
    pub fn on_min_reached(mut self, f: impl Fn() + 'static) -> Self {
        self.sinks.on_min_reached = Some(Box::new(f));
        self
    }
}

// Setters that advance type-state
impl<T: Quantity> StepperBuilder<T, Missing> {
    pub fn with_bounds(self, bounds: Bounds<T>) -> StepperBuilder<T, Set> {
        StepperBuilder {
            bounds: Some(bounds),
            committed: self.committed,
            timing: self.timing,
            policy: self.policy,
            long_press: self.long_press,
            operation: self.operation,
            validator: self.validator,
            sinks: self.sinks,
            _b: PhantomData,
        }
    }

    /// Take bounds and every timing/policy section from one config.
    pub fn with_cfg(self, cfg: StepperCfg<T>) -> StepperBuilder<T, Set> {
        self.with_timing(cfg.timing)
            .with_policy(cfg.policy)
            .with_long_press(cfg.long_press)
            .with_bounds(cfg.bounds)
    }
}

impl<T: Quantity> StepperBuilder<T, Set> {
    /// Validate and build the Stepper. Only available once bounds are set.
    pub fn build(self) -> Result<Stepper<T>> {
        self.try_build()
    }
}
