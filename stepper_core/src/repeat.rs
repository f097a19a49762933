//! Press-and-hold auto-repeat.
//!
//! A cooperative loop driven by the caller's runtime: wait the initial delay,
//! then tick at a fixed cadence until the tick callback says stop or the
//! session token is cancelled. Both waits race against the token.

use std::ops::ControlFlow;

use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use crate::clamp::Intent;
use crate::config::LongPressCfg;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    pub fn intent<T>(self) -> Intent<T> {
        match self {
            Self::Up => Intent::Increment,
            Self::Down => Intent::Decrement,
        }
    }
}

/// Decides whether a press session may issue another dispatch.
///
/// Repeats are free when there is no async operation or when debouncing
/// (either way at most one network call results). Otherwise a session gets a
/// single dispatch unless `allow_async` is set.
#[derive(Debug, Clone, Copy)]
pub struct RepeatGate {
    has_operation: bool,
    debounced: bool,
    allow_async: bool,
    dispatched: u32,
}

impl RepeatGate {
    pub fn new(has_operation: bool, debounced: bool, allow_async: bool) -> Self {
        Self {
            has_operation,
            debounced,
            allow_async,
            dispatched: 0,
        }
    }

    pub fn permits(&self) -> bool {
        !self.has_operation || self.debounced || self.allow_async || self.dispatched == 0
    }

    pub fn record_dispatch(&mut self) {
        self.dispatched = self.dispatched.saturating_add(1);
    }

    pub fn dispatched(&self) -> u32 {
        self.dispatched
    }
}

/// Run one press session. Returns the number of ticks that asked to continue.
pub async fn run<F>(cfg: LongPressCfg, cancel: CancellationToken, mut tick: F) -> u32
where
    F: FnMut() -> ControlFlow<()>,
{
    tokio::select! {
        biased;
        () = cancel.cancelled() => return 0,
        () = sleep(cfg.initial_delay) => {}
    }

    let mut ticks = 0_u32;
    loop {
        if cancel.is_cancelled() || tick().is_break() {
            break;
        }
        ticks = ticks.saturating_add(1);
        tracing::trace!(ticks, "long press tick");
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            () = sleep(cfg.interval) => {}
        }
    }
    ticks
}
