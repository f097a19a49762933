//! Loading visibility with a show delay and a minimum on-screen duration.

use std::time::Duration;

use tokio::time::Instant;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoadingGate {
    active: bool,
    started_at: Option<Instant>,
}

impl LoadingGate {
    #[inline]
    pub fn is_active(&self) -> bool {
        self.active
    }

    #[inline]
    pub fn started_at(&self) -> Option<Instant> {
        self.started_at
    }

    /// Turn loading on. Already-visible loading keeps its original start so
    /// the minimum duration is measured from when it first appeared.
    /// Returns true when loading became visible.
    pub fn show(&mut self, now: Instant) -> bool {
        if self.active {
            return false;
        }
        self.active = true;
        self.started_at = Some(now);
        true
    }

    /// Time loading must stay visible after the operation settled at `now`.
    /// `None` when loading was never shown.
    pub fn remaining(&self, now: Instant, minimum: Duration) -> Option<Duration> {
        if !self.active {
            return None;
        }
        let elapsed = self
            .started_at
            .map_or(Duration::ZERO, |t| now.saturating_duration_since(t));
        Some(minimum.saturating_sub(elapsed))
    }

    /// Returns true when loading was visible.
    pub fn hide(&mut self) -> bool {
        let was = self.active;
        self.active = false;
        self.started_at = None;
        was
    }
}
