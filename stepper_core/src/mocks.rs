//! Simulated backend for tests and the CLI.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use stepper_traits::{OperationFailure, OperationFuture, Quantity, ValueOperation};
use thiserror::Error;
use tokio::time::Instant;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SimulatedFailure {
    #[error("backend rejected {0}")]
    Rejected(String),
    #[error("call #{0} failed")]
    Nth(u32),
    #[error("backend unavailable")]
    Outage,
}

/// One recorded invocation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Call<T> {
    pub at: Instant,
    pub target: T,
    pub failed: bool,
}

struct Rules<T> {
    latency: Cell<Duration>,
    fail_values: RefCell<Vec<T>>,
    fail_every: Cell<Option<u32>>,
    fail_next: Cell<u32>,
    calls: RefCell<Vec<Call<T>>>,
}

/// An operation that sleeps `latency` and then fails or succeeds by rule.
///
/// Clones share rules and call history, so a test can keep one clone for
/// inspection while the stepper owns the other. The outcome is decided when
/// the call is made, not when it resolves.
#[derive(Clone)]
pub struct SimulatedOperation<T> {
    rules: Rc<Rules<T>>,
}

impl<T: Quantity> SimulatedOperation<T> {
    pub fn new(latency: Duration) -> Self {
        Self {
            rules: Rc::new(Rules {
                latency: Cell::new(latency),
                fail_values: RefCell::new(Vec::new()),
                fail_every: Cell::new(None),
                fail_next: Cell::new(0),
                calls: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Fail whenever the target equals one of `values`.
    pub fn with_fail_values(self, values: impl IntoIterator<Item = T>) -> Self {
        self.rules.fail_values.borrow_mut().extend(values);
        self
    }

    /// Fail every `n`-th call (1-based). `0` disables the rule.
    pub fn with_fail_every(self, n: u32) -> Self {
        self.rules.fail_every.set((n > 0).then_some(n));
        self
    }

    /// Fail the next `n` calls regardless of target.
    pub fn fail_next(&self, n: u32) {
        self.rules.fail_next.set(n);
    }

    pub fn set_latency(&self, latency: Duration) {
        self.rules.latency.set(latency);
    }

    pub fn calls(&self) -> Vec<Call<T>> {
        self.rules.calls.borrow().clone()
    }

    pub fn targets(&self) -> Vec<T> {
        self.rules.calls.borrow().iter().map(|c| c.target).collect()
    }

    pub fn call_count(&self) -> usize {
        self.rules.calls.borrow().len()
    }

    fn decide(&self, target: T, nth: u32) -> Option<SimulatedFailure> {
        let r = &self.rules;
        if r.fail_next.get() > 0 {
            r.fail_next.set(r.fail_next.get() - 1);
            return Some(SimulatedFailure::Outage);
        }
        if r.fail_values.borrow().iter().any(|v| *v == target) {
            return Some(SimulatedFailure::Rejected(target.to_string()));
        }
        match r.fail_every.get() {
            Some(n) if nth % n == 0 => Some(SimulatedFailure::Nth(nth)),
            _ => None,
        }
    }
}

impl<T: Quantity> ValueOperation<T> for SimulatedOperation<T> {
    fn call(&self, target: T) -> OperationFuture {
        let nth = u32::try_from(self.call_count()).unwrap_or(u32::MAX).saturating_add(1);
        let failure = self.decide(target, nth);
        self.rules.calls.borrow_mut().push(Call {
            at: Instant::now(),
            target,
            failed: failure.is_some(),
        });
        tracing::trace!(%target, nth, failing = failure.is_some(), "simulated call");

        let latency = self.rules.latency.get();
        Box::pin(async move {
            if !latency.is_zero() {
                tokio::time::sleep(latency).await;
            }
            match failure {
                Some(e) => Err(Box::new(e) as OperationFailure),
                None => Ok(()),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn rules_apply_in_order() {
        let op = SimulatedOperation::new(Duration::from_millis(10))
            .with_fail_values([3_i64])
            .with_fail_every(4);
        op.fail_next(1);

        assert!(op.call(1).await.is_err()); // outage
        assert!(op.call(2).await.is_ok());
        assert!(op.call(3).await.is_err()); // rejected value
        assert!(op.call(5).await.is_err()); // 4th call
        assert!(op.call(6).await.is_ok());

        let failed: Vec<bool> = op.calls().iter().map(|c| c.failed).collect();
        assert_eq!(failed, vec![true, false, true, true, false]);
        assert_eq!(op.targets(), vec![1, 2, 3, 5, 6]);
    }

    #[tokio::test(start_paused = true)]
    async fn latency_is_observed() {
        let op = SimulatedOperation::new(Duration::from_millis(120));
        let t0 = Instant::now();
        op.call(4_i64).await.ok();
        assert_eq!(t0.elapsed(), Duration::from_millis(120));
        assert_eq!(op.calls()[0].at, t0);
    }
}
