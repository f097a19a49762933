//! Which value is on screen.
//!
//! Exactly one source is authoritative at a time, so the three candidates
//! (debounced, pending, committed) live in one tagged state instead of three
//! nullable fields. The committed value itself is owned by the caller and
//! passed in on every query.

use stepper_traits::Quantity;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DisplayState<T> {
    /// Show the caller's committed value.
    Committed,
    /// A debounce burst is accumulating (or its operation is in flight).
    /// `anchor` is the committed value from before the burst.
    Debouncing { value: T, anchor: T },
    /// An optimistic value waiting for the caller to confirm it.
    Optimistic { pending: T },
}

impl<T: Quantity> Default for DisplayState<T> {
    fn default() -> Self {
        Self::Committed
    }
}

impl<T: Quantity> DisplayState<T> {
    pub fn resolve(&self, committed: T) -> T {
        match *self {
            Self::Committed => committed,
            Self::Debouncing { value, .. } => value,
            Self::Optimistic { pending } => pending,
        }
    }

    pub fn debounced(&self) -> Option<T> {
        match *self {
            Self::Debouncing { value, .. } => Some(value),
            _ => None,
        }
    }

    pub fn anchor(&self) -> Option<T> {
        match *self {
            Self::Debouncing { anchor, .. } => Some(anchor),
            _ => None,
        }
    }

    pub fn pending(&self) -> Option<T> {
        match *self {
            Self::Optimistic { pending } => Some(pending),
            _ => None,
        }
    }

    /// Record one debounce tap. The anchor survives for the whole burst.
    pub fn accumulate(&mut self, value: T, committed: T) {
        let anchor = self.anchor().unwrap_or(committed);
        *self = Self::Debouncing { value, anchor };
    }

    /// Show `pending` until the caller confirms it.
    pub fn expect(&mut self, pending: T) {
        *self = Self::Optimistic { pending };
    }

    /// The caller replaced the committed value. A matching pending value is
    /// confirmed; anything else leaves the state alone.
    pub fn observe_committed(&mut self, committed: T) -> bool {
        if let Self::Optimistic { pending } = *self
            && pending == committed
        {
            *self = Self::Committed;
            return true;
        }
        false
    }

    /// The operation for `target` succeeded.
    pub fn settle_success(&mut self, target: T, committed: T, optimistic: bool) {
        match *self {
            Self::Debouncing { .. } if optimistic && target != committed => {
                *self = Self::Optimistic { pending: target };
            }
            Self::Debouncing { .. } => *self = Self::Committed,
            Self::Optimistic { pending } if pending == committed => *self = Self::Committed,
            _ => {}
        }
    }

    /// The operation failed. Returns the value the display fell back to, if a
    /// revert happened. That is the committed value: it equals the anchor
    /// unless the caller committed something newer during the burst.
    pub fn settle_failure(&mut self, committed: T, revert: bool) -> Option<T> {
        match *self {
            Self::Debouncing { .. } if revert => {
                *self = Self::Committed;
                Some(committed)
            }
            Self::Debouncing { value, .. } => {
                *self = Self::Optimistic { pending: value };
                None
            }
            Self::Optimistic { .. } if revert => {
                *self = Self::Committed;
                Some(committed)
            }
            _ => None,
        }
    }

    pub fn clear(&mut self) {
        *self = Self::Committed;
    }
}
