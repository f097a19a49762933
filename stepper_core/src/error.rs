use std::fmt;
use std::sync::Arc;

use stepper_traits::Quantity;
use thiserror::Error;

/// Which user intent produced an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Increment,
    Decrement,
    Add,
    Set,
    Remove,
}

impl OperationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Increment => "increment",
            Self::Decrement => "decrement",
            Self::Add => "add",
            Self::Set => "set",
            Self::Remove => "remove",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// A newer generation replaced the operation.
    Superseded,
    /// `Stepper::cancel()` was called.
    UserCancelled,
    /// The coordinator was disposed.
    Disposed,
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Superseded => "superseded",
            Self::UserCancelled => "cancelled by caller",
            Self::Disposed => "coordinator disposed",
        })
    }
}

/// Coarse classification of [`StepperError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Operation,
    Cancellation,
    Busy,
}

/// Shared cause of a failed operation.
pub type Cause = Arc<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error, Clone)]
pub enum StepperError<T: Quantity> {
    /// The sync predicate refused a candidate; nothing was dispatched.
    #[error("validation rejected {attempted} (current {current})")]
    Validation { current: T, attempted: T },
    #[error("{operation} to {attempted} failed: {cause}")]
    Operation {
        operation: OperationKind,
        attempted: T,
        cause: Cause,
    },
    /// Informational; not meant for end users.
    #[error("operation cancelled: {0}")]
    Cancelled(CancelReason),
    #[error("busy: operation for {in_flight} still in flight")]
    Busy { in_flight: T },
}

impl<T: Quantity> StepperError<T> {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Operation { .. } => ErrorKind::Operation,
            Self::Cancelled(_) => ErrorKind::Cancellation,
            Self::Busy { .. } => ErrorKind::Busy,
        }
    }
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("missing bounds")]
    MissingBounds,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
