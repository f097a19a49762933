//! Generation tokens for cooperative cancellation.
//!
//! `Epoch` holds the id of the live operation episode. Every continuation
//! captures an `EpochToken` and calls `is_live()` right after each `.await`;
//! a stale token means "discard silently". The counter only grows.

use std::cell::Cell;
use std::rc::Rc;

#[derive(Debug, Default)]
pub struct Epoch {
    live: Rc<Cell<u64>>,
}

impl Epoch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Supersede everything in flight and mint the token of the new episode.
    pub fn advance(&self) -> EpochToken {
        let id = self.live.get().wrapping_add(1);
        self.live.set(id);
        EpochToken {
            id,
            live: Rc::clone(&self.live),
        }
    }

    /// Token for the current episode without superseding it.
    #[cfg(test)]
    pub fn token(&self) -> EpochToken {
        EpochToken {
            id: self.live.get(),
            live: Rc::clone(&self.live),
        }
    }

    #[inline]
    pub fn current(&self) -> u64 {
        self.live.get()
    }
}

#[derive(Debug, Clone)]
pub struct EpochToken {
    id: u64,
    live: Rc<Cell<u64>>,
}

impl EpochToken {
    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    #[inline]
    pub fn is_live(&self) -> bool {
        self.live.get() == self.id
    }
}
