#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Value-synchronization coordinator for stepper controls (UI-agnostic).
//!
//! A `Stepper` reconciles a caller-owned committed value with one fallible,
//! latency-bearing operation supplied through `stepper_traits::ValueOperation`.
//! It produces a value to display, a loading flag and an error record.
//!
//! ## Architecture
//!
//! - **Clamp**: pure bounding and predicate checks (`clamp` module)
//! - **Generation**: epoch tokens for cooperative cancellation
//! - **Throttle / debounce**: the two dispatch strategies
//! - **Display**: tagged committed / debouncing / optimistic state
//! - **Loading**: show delay and minimum on-screen duration
//! - **Repeat**: press-and-hold loop
//! - **Ledger**: last failure and retry
//!
//! ## Runtime
//!
//! Single-threaded and cooperative. Drive the stepper from a
//! `tokio::task::LocalSet` on a current-thread runtime:
//!
//! ```no_run
//! use std::time::Duration;
//! use stepper_core::{Bounds, Stepper, mocks::SimulatedOperation};
//!
//! let rt = tokio::runtime::Builder::new_current_thread()
//!     .enable_time()
//!     .build()
//!     .unwrap();
//! let local = tokio::task::LocalSet::new();
//! local.block_on(&rt, async {
//!     let stepper = Stepper::builder()
//!         .with_bounds(Bounds { min: 1, max: 10, step: 1 })
//!         .with_operation(SimulatedOperation::new(Duration::from_millis(50)))
//!         .build()
//!         .unwrap();
//!     stepper.increment().unwrap();
//!     assert_eq!(stepper.display_value(), 1);
//! });
//! ```

pub mod builder;
pub mod clamp;
pub mod config;
pub mod conversions;
pub mod coordinator;
pub mod display;
pub mod error;
pub mod events;
pub mod generation;
pub mod ledger;
pub mod loading;
pub mod mocks;
pub mod repeat;
pub mod throttle;

pub use builder::{Missing, Set, StepperBuilder};
pub use clamp::{Intent, Source, Validator};
pub use config::{Bounds, LongPressCfg, PolicyCfg, StepperCfg, TimingCfg};
pub use coordinator::{Step, Stepper, WeakStepper};
pub use display::DisplayState;
pub use error::{BuildError, CancelReason, ErrorKind, OperationKind, Report, Result, StepperError};
pub use events::{EventRecord, Limit, StepperEvent};
pub use ledger::ErrorRecord;
pub use repeat::Direction;
