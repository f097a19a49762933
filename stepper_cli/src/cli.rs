//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "stepper", version, about = "Stepper coordinator simulator")]
pub struct Cli {
    /// Path to config TOML (typed)
    #[arg(long, value_name = "FILE", default_value = "etc/stepper.toml")]
    pub config: PathBuf,

    /// Log as JSON lines instead of pretty
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace). Overrides
    /// `[logging].level`; `RUST_LOG` overrides both. Defaults to info.
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Replay a scripted scenario against the simulated backend and print a
    /// JSON-lines timeline
    Run {
        /// Scenario CSV with header `at_ms,action,value`
        #[arg(long, value_name = "FILE")]
        script: PathBuf,
        /// Override simulation.latency_ms
        #[arg(long, value_name = "MS")]
        latency_ms: Option<u64>,
        /// Make the backend reject this target (repeatable)
        #[arg(long = "fail-value", value_name = "V", allow_negative_numbers = true)]
        fail_value: Vec<i64>,
    },
    /// Validate the config and build a stepper from it
    Check,
}
