#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schemas and scenario-script parsing for the stepper coordinator.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - Scenario CSV loader enforces headers and checks that rows are ordered
//!   in time and carry a value where the action needs one.
use serde::Deserialize;

pub mod script;

pub use script::{ScriptAction, ScriptStep, load_script_csv, parse_script_csv};

fn default_step() -> i64 {
    1
}

#[derive(Debug, Deserialize, Clone, Copy)]
pub struct Bounds {
    pub min: i64,
    pub max: i64,
    #[serde(default = "default_step")]
    pub step: i64,
    /// Committed value at start-up; defaults to `min`.
    #[serde(default)]
    pub initial: Option<i64>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct TimingCfg {
    /// Minimum spacing between two throttled invocations (ms).
    pub throttle_interval_ms: u64,
    /// Idle period before a debounced burst fires (ms). Absent disables debounce.
    pub debounce_ms: Option<u64>,
    /// Delay before the loading indicator is shown (ms); 0 shows immediately.
    pub show_delay_ms: u64,
    /// Once shown, loading stays visible at least this long (ms).
    pub minimum_duration_ms: u64,
}

impl Default for TimingCfg {
    fn default() -> Self {
        Self {
            throttle_interval_ms: 80,
            debounce_ms: None,
            show_delay_ms: 0,
            minimum_duration_ms: 300,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct PolicyCfg {
    pub optimistic_update: bool,
    pub revert_on_error: bool,
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

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct LongPressCfg {
    pub initial_delay_ms: u64,
    pub interval_ms: u64,
}

impl Default for LongPressCfg {
    fn default() -> Self {
        Self {
            initial_delay_ms: 400,
            interval_ms: 100,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

/// Simulated backend used by `stepper run`.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SimulationCfg {
    /// Latency of every simulated call (ms).
    pub latency_ms: u64,
    /// Targets the backend refuses.
    pub fail_values: Vec<i64>,
    /// Fail every Nth call (1-based); absent disables.
    pub fail_every: Option<u32>,
    /// Feed every commit straight back as the committed value.
    pub echo_commits: bool,
    /// How long to keep running after the last script row (ms).
    pub drain_ms: u64,
}

impl Default for SimulationCfg {
    fn default() -> Self {
        Self {
            latency_ms: 120,
            fail_values: Vec::new(),
            fail_every: None,
            echo_commits: true,
            drain_ms: 1000,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Config {
    pub bounds: Bounds,
    #[serde(default)]
    pub timing: TimingCfg,
    #[serde(default)]
    pub policy: PolicyCfg,
    #[serde(default)]
    pub long_press: LongPressCfg,
    #[serde(default)]
    pub logging: Logging,
    #[serde(default)]
    pub simulation: SimulationCfg,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

const MAX_INTERVAL_MS: u64 = 60_000;

impl Config {
    /// Committed value at start-up.
    pub fn initial_value(&self) -> i64 {
        self.bounds.initial.unwrap_or(self.bounds.min)
    }

    pub fn validate(&self) -> eyre::Result<()> {
        // Bounds
        if self.bounds.min > self.bounds.max {
            eyre::bail!(
                "bounds.min must be <= bounds.max (got {} > {})",
                self.bounds.min,
                self.bounds.max
            );
        }
        if self.bounds.step <= 0 {
            eyre::bail!("bounds.step must be > 0");
        }
        if let Some(initial) = self.bounds.initial {
            let floor = self.bounds.min.saturating_sub(self.bounds.step);
            if initial < floor || initial > self.bounds.max {
                eyre::bail!("bounds.initial must be in [min - step, max]");
            }
        }

        // Timing
        if self.timing.throttle_interval_ms > MAX_INTERVAL_MS {
            eyre::bail!("timing.throttle_interval_ms is unreasonably large (>60s)");
        }
        if let Some(ms) = self.timing.debounce_ms {
            if ms == 0 {
                eyre::bail!("timing.debounce_ms must be >= 1 (omit it to disable debounce)");
            }
            if ms > MAX_INTERVAL_MS {
                eyre::bail!("timing.debounce_ms is unreasonably large (>60s)");
            }
        }
        if self.timing.show_delay_ms > MAX_INTERVAL_MS {
            eyre::bail!("timing.show_delay_ms is unreasonably large (>60s)");
        }
        if self.timing.minimum_duration_ms > MAX_INTERVAL_MS {
            eyre::bail!("timing.minimum_duration_ms is unreasonably large (>60s)");
        }

        // Long press
        if self.long_press.interval_ms == 0 {
            eyre::bail!("long_press.interval_ms must be >= 1");
        }
        if self.long_press.initial_delay_ms > MAX_INTERVAL_MS {
            eyre::bail!("long_press.initial_delay_ms is unreasonably large (>60s)");
        }

        // Logging
        if let Some(rotation) = self.logging.rotation.as_deref()
            && !matches!(rotation, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly");
        }

        // Simulation
        if self.simulation.fail_every == Some(0) {
            eyre::bail!("simulation.fail_every must be >= 1");
        }
        if self.simulation.latency_ms > MAX_INTERVAL_MS {
            eyre::bail!("simulation.latency_ms is unreasonably large (>60s)");
        }
        if self.simulation.drain_ms > 10 * MAX_INTERVAL_MS {
            eyre::bail!("simulation.drain_ms is unreasonably large (>10min)");
        }

        Ok(())
    }
}
