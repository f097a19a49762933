//! `From` implementations bridging `stepper_config` types to `stepper_core` types.

use std::time::Duration;

use crate::config::{Bounds, LongPressCfg, PolicyCfg, StepperCfg, TimingCfg};
use crate::mocks::SimulatedOperation;

// ── Bounds ───────────────────────────────────────────────────────────────────

impl From<&stepper_config::Bounds> for Bounds<i64> {
    fn from(c: &stepper_config::Bounds) -> Self {
        Self {
            min: c.min,
            max: c.max,
            step: c.step,
        }
    }
}

// ── TimingCfg ────────────────────────────────────────────────────────────────

impl From<&stepper_config::TimingCfg> for TimingCfg {
    fn from(c: &stepper_config::TimingCfg) -> Self {
        Self {
            throttle_interval: Duration::from_millis(c.throttle_interval_ms),
            debounce_delay: c.debounce_ms.map(Duration::from_millis),
            show_delay: Duration::from_millis(c.show_delay_ms),
            minimum_duration: Duration::from_millis(c.minimum_duration_ms),
        }
    }
}

// ── PolicyCfg ────────────────────────────────────────────────────────────────

impl From<&stepper_config::PolicyCfg> for PolicyCfg {
    fn from(c: &stepper_config::PolicyCfg) -> Self {
        Self {
            optimistic_update: c.optimistic_update,
            revert_on_error: c.revert_on_error,
            allow_long_press_for_async: c.allow_long_press_for_async,
        }
    }
}

// ── LongPressCfg ─────────────────────────────────────────────────────────────

impl From<&stepper_config::LongPressCfg> for LongPressCfg {
    fn from(c: &stepper_config::LongPressCfg) -> Self {
        Self {
            initial_delay: Duration::from_millis(c.initial_delay_ms),
            interval: Duration::from_millis(c.interval_ms),
        }
    }
}

// ── Whole config ─────────────────────────────────────────────────────────────

impl From<&stepper_config::Config> for StepperCfg<i64> {
    fn from(c: &stepper_config::Config) -> Self {
        Self {
            bounds: (&c.bounds).into(),
            timing: (&c.timing).into(),
            policy: (&c.policy).into(),
            long_press: (&c.long_press).into(),
        }
    }
}

impl From<&stepper_config::SimulationCfg> for SimulatedOperation<i64> {
    fn from(c: &stepper_config::SimulationCfg) -> Self {
        SimulatedOperation::new(Duration::from_millis(c.latency_ms))
            .with_fail_values(c.fail_values.iter().copied())
            .with_fail_every(c.fail_every.unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_match_core_defaults() {
        let timing: TimingCfg = (&stepper_config::TimingCfg::default()).into();
        assert_eq!(timing, TimingCfg::default());
        let policy: PolicyCfg = (&stepper_config::PolicyCfg::default()).into();
        assert_eq!(policy, PolicyCfg::default());
        let long_press: LongPressCfg = (&stepper_config::LongPressCfg::default()).into();
        assert_eq!(long_press, LongPressCfg::default());
    }

    #[test]
    fn debounce_ms_maps_to_duration() {
        let cfg = stepper_config::TimingCfg {
            debounce_ms: Some(500),
            ..Default::default()
        };
        let timing: TimingCfg = (&cfg).into();
        assert_eq!(timing.debounce_delay, Some(Duration::from_millis(500)));
    }

    #[test]
    fn whole_config_converts() {
        let cfg = stepper_config::Config {
            bounds: stepper_config::Bounds {
                min: 1,
                max: 10,
                step: 2,
                initial: None,
            },
            timing: stepper_config::TimingCfg::default(),
            policy: stepper_config::PolicyCfg::default(),
            long_press: stepper_config::LongPressCfg::default(),
            logging: stepper_config::Logging::default(),
            simulation: stepper_config::SimulationCfg::default(),
        };
        let core: StepperCfg<i64> = (&cfg).into();
        assert_eq!(core.bounds, Bounds { min: 1, max: 10, step: 2 });
        assert_eq!(core.timing.throttle_interval, Duration::from_millis(80));
    }
}
