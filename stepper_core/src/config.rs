//! Configuration types for the coordinator.
//!
//! These are the runtime configuration structs used by `Stepper`.
//! They are separate from the TOML-deserialized config in `stepper_config`.

use std::time::Duration;

/// Value range and increment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds<T> {
    pub min: T,
    pub max: T,
    /// Increment applied per tap or long-press tick. Must be > 0.
    pub step: T,
}

/// Timer configuration for throttle, debounce and the loading gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimingCfg {
    /// At most one throttled invocation per interval. Default: 80 ms.
    pub throttle_interval: Duration,
    /// When set, changes accumulate until this idle period elapses and a
    /// single operation fires. Default: disabled.
    pub debounce_delay: Option<Duration>,
    /// Loading is shown only after the operation has been outstanding this
    /// long. Default: 0 (show immediately).
    pub show_delay: Duration,
    /// Once shown, loading stays visible at least this long. Default: 300 ms.
    pub minimum_duration: Duration,
}

impl Default for TimingCfg {
    fn default() -> Self {
        Self {
            throttle_interval: Duration::from_millis(80),
            debounce_delay: None,
            show_delay: Duration::ZERO,
            minimum_duration: Duration::from_millis(300),
        }
    }
}

/// Display and repetition policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolicyCfg {
    /// Show the requested value before the operation confirms it.
    pub optimistic_update: bool,
    /// Roll back optimistic/debounced values when the operation fails.
    /// When false the unconfirmed value stays on screen until the next change.
    pub revert_on_error: bool,
    /// Let a long press issue more than one throttled async dispatch.
    pub allow_long_press_for_async: bool,
}

impl Default for PolicyCfg {
    fn default() -> Self {
        Self {
            optimistic_update: false,
            revert_on_error: true,
            allow_long_press_for_async: false,
        }
    }
}

/// Auto-repeat cadence for press-and-hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LongPressCfg {
    pub initial_delay: Duration,
    pub interval: Duration,
}

impl Default for LongPressCfg {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(400),
            interval: Duration::from_millis(100),
        }
    }
}

/// Complete, validated configuration of one coordinator instance.
#[derive(Debug, Clone, PartialEq)]
pub struct StepperCfg<T> {
    pub bounds: Bounds<T>,
    pub timing: TimingCfg,
    pub policy: PolicyCfg,
    pub long_press: LongPressCfg,
}
