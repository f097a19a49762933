//! Last failure and how to replay it.

use std::fmt;

use stepper_traits::Quantity;

use crate::clamp::Intent;
use crate::error::{Cause, ErrorKind, OperationKind, StepperError};

/// The most recent operation failure of a live generation.
#[derive(Debug, Clone)]
pub struct ErrorRecord<T> {
    pub kind: ErrorKind,
    pub operation: OperationKind,
    pub attempted: T,
    pub cause: Cause,
    /// Value the display fell back to, when the failure was reverted.
    pub reverted_to: Option<T>,
}

impl<T: Quantity> ErrorRecord<T> {
    pub fn new(operation: OperationKind, attempted: T, cause: Cause) -> Self {
        Self {
            kind: ErrorKind::Operation,
            operation,
            attempted,
            cause,
            reverted_to: None,
        }
    }

    pub fn to_error(&self) -> StepperError<T> {
        StepperError::Operation {
            operation: self.operation,
            attempted: self.attempted,
            cause: self.cause.clone(),
        }
    }

    /// Intent that replays this failure against the then-current value.
    /// Relative intents are recomputed; only `set` reuses the attempted value.
    pub fn retry_intent(&self) -> Intent<T> {
        match self.operation {
            OperationKind::Increment => Intent::Increment,
            OperationKind::Decrement => Intent::Decrement,
            OperationKind::Add => Intent::Add,
            OperationKind::Set => Intent::Set(self.attempted),
            OperationKind::Remove => Intent::Remove,
        }
    }
}

impl<T: Quantity> fmt::Display for ErrorRecord<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {} failed: {}", self.operation, self.attempted, self.cause)
    }
}

#[derive(Debug)]
pub struct ErrorLedger<T> {
    last: Option<ErrorRecord<T>>,
}

impl<T> Default for ErrorLedger<T> {
    fn default() -> Self {
        Self { last: None }
    }
}

impl<T: Quantity> ErrorLedger<T> {
    pub fn record(&mut self, record: ErrorRecord<T>) {
        self.last = Some(record);
    }

    pub fn clear(&mut self) {
        self.last = None;
    }

    pub fn last(&self) -> Option<&ErrorRecord<T>> {
        self.last.as_ref()
    }
}
