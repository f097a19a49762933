//! Leading-edge throttle with a single coalesced trailing invocation.
//!
//! A target arriving outside the window fires immediately. Inside the window
//! the latest target overwrites the trailing slot and at most one timer is
//! armed for the window boundary. The timer must present its ticket; `reset()`
//! voids outstanding tickets.

use std::time::Duration;

use tokio::time::Instant;

use crate::error::OperationKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arm {
    pub ticket: u64,
    pub at: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Offer<T> {
    Fire(T),
    /// Stored as the trailing candidate. `arm` is set when the caller must
    /// start the boundary timer.
    Deferred { arm: Option<Arm> },
    /// Same value as the last invocation and nothing newer queued.
    Duplicate,
}

#[derive(Debug)]
pub struct Throttle<T> {
    interval: Duration,
    last_fired: Option<Instant>,
    last_value: Option<T>,
    trailing: Option<(T, OperationKind)>,
    armed: Option<u64>,
    tickets: u64,
}

impl<T: Copy + PartialEq> Throttle<T> {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_fired: None,
            last_value: None,
            trailing: None,
            armed: None,
            tickets: 0,
        }
    }

    fn window_end(&self) -> Option<Instant> {
        self.last_fired.map(|t| t + self.interval)
    }

    pub fn offer(&mut self, now: Instant, value: T, kind: OperationKind) -> Offer<T> {
        let end = match self.window_end() {
            Some(end) if now < end => end,
            _ => {
                // Boundary passed but its timer has not run yet: join the queue.
                if self.armed.is_some() {
                    self.trailing = Some((value, kind));
                    return Offer::Deferred { arm: None };
                }
                return Offer::Fire(value);
            }
        };

        if self.trailing.is_none() && self.last_value == Some(value) {
            return Offer::Duplicate;
        }
        self.trailing = Some((value, kind));
        if self.armed.is_some() {
            return Offer::Deferred { arm: None };
        }
        self.tickets = self.tickets.wrapping_add(1);
        self.armed = Some(self.tickets);
        tracing::trace!(ticket = self.tickets, "throttle trailing armed");
        Offer::Deferred {
            arm: Some(Arm {
                ticket: self.tickets,
                at: end,
            }),
        }
    }

    pub fn mark_fired(&mut self, now: Instant, value: T) {
        self.last_fired = Some(now);
        self.last_value = Some(value);
    }

    /// Take the trailing candidate for a boundary timer. Returns `None` for a
    /// voided ticket, an empty slot, or a repeat of the last invocation.
    pub fn fire_trailing(&mut self, ticket: u64) -> Option<(T, OperationKind)> {
        if self.armed != Some(ticket) {
            return None;
        }
        self.armed = None;
        let (value, kind) = self.trailing.take()?;
        if self.last_value == Some(value) {
            return None;
        }
        Some((value, kind))
    }

    /// Drop the queued candidate and void armed timers. The rate window is kept.
    pub fn reset(&mut self) {
        self.trailing = None;
        self.armed = None;
    }

    #[cfg(test)]
    pub fn trailing(&self) -> Option<T> {
        self.trailing.map(|(v, _)| v)
    }

    #[cfg(test)]
    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }
}
