//! Notification sinks and the optional event feed.
//!
//! The coordinator collects events while its state is borrowed and hands them
//! over here only after the borrow ends, so a sink may call straight back into
//! the `Stepper` (echoing a commit through `set_committed`, for example).

use crossbeam_channel::{Sender, TrySendError};
use tokio::time::Instant;

use crate::error::{CancelReason, OperationKind};
use crate::ledger::ErrorRecord;

/// Which bound stopped a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Limit {
    Max,
    Min,
}

#[derive(Debug, Clone)]
pub enum StepperEvent<T> {
    Dispatched {
        generation: u64,
        operation: OperationKind,
        target: T,
    },
    /// Accepted inside the throttle window; fires at the trailing edge.
    Deferred { target: T },
    /// Accumulated into the current debounce burst.
    Debounced { value: T },
    Settled { generation: u64, target: T },
    Failed(ErrorRecord<T>),
    Reverted { to: T },
    Cancelled { attempted: T, reason: CancelReason },
    LoadingShown,
    LoadingHidden,
    Commit { value: T },
    Removal { attempted: T },
    Rejected { current: T, attempted: T },
    Limit(Limit),
}

impl<T> StepperEvent<T> {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Dispatched { .. } => "dispatched",
            Self::Deferred { .. } => "deferred",
            Self::Debounced { .. } => "debounced",
            Self::Settled { .. } => "settled",
            Self::Failed(_) => "failed",
            Self::Reverted { .. } => "reverted",
            Self::Cancelled { .. } => "cancelled",
            Self::LoadingShown => "loading_shown",
            Self::LoadingHidden => "loading_hidden",
            Self::Commit { .. } => "commit",
            Self::Removal { .. } => "removal",
            Self::Rejected { .. } => "rejected",
            Self::Limit(_) => "limit",
        }
    }
}

/// One event on the feed, stamped with the runtime clock.
#[derive(Debug, Clone)]
pub struct EventRecord<T> {
    pub at: Instant,
    pub event: StepperEvent<T>,
}

type Sink<A> = Option<Box<dyn Fn(A)>>;

pub(crate) struct Sinks<T> {
    pub on_commit: Sink<T>,
    pub on_removal: Sink<T>,
    pub on_validation_rejected: Option<Box<dyn Fn(T, T)>>,
    pub on_operation_cancelled: Sink<T>,
    pub on_error: Option<Box<dyn Fn(&ErrorRecord<T>)>>,
    pub on_max_reached: Option<Box<dyn Fn()>>,
    pub on_min_reached: Option<Box<dyn Fn()>>,
    pub feed: Option<Sender<EventRecord<T>>>,
}

impl<T> Default for Sinks<T> {
    fn default() -> Self {
        Self {
            on_commit: None,
            on_removal: None,
            on_validation_rejected: None,
            on_operation_cancelled: None,
            on_error: None,
            on_max_reached: None,
            on_min_reached: None,
            feed: None,
        }
    }
}

impl<T: stepper_traits::Quantity> Sinks<T> {
    pub fn deliver(&self, event: StepperEvent<T>) {
        match &event {
            StepperEvent::Commit { value } => call(self.on_commit.as_deref(), *value),
            StepperEvent::Removal { attempted } => call(self.on_removal.as_deref(), *attempted),
            StepperEvent::Rejected { current, attempted } => {
                if let Some(f) = &self.on_validation_rejected {
                    f(*current, *attempted);
                }
            }
            StepperEvent::Cancelled { attempted, .. } => {
                call(self.on_operation_cancelled.as_deref(), *attempted);
            }
            StepperEvent::Failed(record) => match &self.on_error {
                Some(f) => f(record),
                None => tracing::warn!(
                    operation = %record.operation,
                    attempted = %record.attempted,
                    cause = %record.cause,
                    "operation failed (no error sink registered)"
                ),
            },
            StepperEvent::Limit(Limit::Max) => {
                if let Some(f) = &self.on_max_reached {
                    f();
                }
            }
            StepperEvent::Limit(Limit::Min) => {
                if let Some(f) = &self.on_min_reached {
                    f();
                }
            }
            _ => {}
        }

        if let Some(tx) = &self.feed {
            let record = EventRecord {
                at: Instant::now(),
                event,
            };
            match tx.try_send(record) {
                Ok(()) => {}
                Err(TrySendError::Full(r)) => {
                    tracing::trace!(event = r.event.name(), "event feed full; dropped");
                }
                Err(TrySendError::Disconnected(_)) => {}
            }
        }
    }
}

#[inline]
fn call<T>(sink: Option<&dyn Fn(T)>, value: T) {
    if let Some(f) = sink {
        f(value);
    }
}
