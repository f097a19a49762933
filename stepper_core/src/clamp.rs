//! Candidate computation: bound a requested change to `[min, max]` by `step`
//! and consult the optional sync predicate.
//!
//! Pure functions over plain values; nothing here touches coordinator state.
//!
//! Feasibility is judged on the *clamped* result: with `max = 10`, `step = 5`
//! and `current = 8`, an increment is feasible and lands on 10.

use stepper_traits::Quantity;

use crate::config::Bounds;
use crate::error::{OperationKind, StepperError};

/// Sync predicate `(current, next) -> accepted`.
pub type Validator<T> = Box<dyn Fn(T, T) -> bool>;

/// A user intent, before clamping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Intent<T> {
    Increment,
    Decrement,
    /// Jump to `min` from below it; otherwise an increment.
    Add,
    Set(T),
    /// Always a removal of `current - step`; replays a failed removal.
    Remove,
}

impl<T> Intent<T> {
    pub fn kind(&self) -> OperationKind {
        match self {
            Self::Increment => OperationKind::Increment,
            Self::Decrement => OperationKind::Decrement,
            Self::Add => OperationKind::Add,
            Self::Set(_) => OperationKind::Set,
            Self::Remove => OperationKind::Remove,
        }
    }
}

/// Where an intent came from. Long presses never remove.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Tap,
    LongPress,
    Retry,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Plan<T> {
    /// In-bounds value to apply.
    Next(T),
    /// Decrement from the floor: the caller should remove the item.
    /// Carries the unclamped attempted value.
    Removal(T),
    AtMax,
    AtMin,
    Unchanged,
}

/// Compute the candidate for `intent` starting at `current`.
pub fn plan<T: Quantity>(intent: Intent<T>, current: T, bounds: &Bounds<T>, source: Source) -> Plan<T> {
    let Bounds { min, max, step } = *bounds;
    match intent {
        Intent::Increment => increment(current, bounds),
        Intent::Add if current < min => Plan::Next(min),
        Intent::Add => increment(current, bounds),
        Intent::Decrement => {
            if current <= min {
                if source == Source::LongPress {
                    Plan::AtMin
                } else {
                    Plan::Removal(below(current, step))
                }
            } else {
                let next = Quantity::checked_sub(current, step)
                    .map_or(min, |v| if v < min { min } else { v })
                    .clamp_to(min, max);
                if next == current {
                    Plan::Unchanged
                } else {
                    Plan::Next(next)
                }
            }
        }
        Intent::Set(v) => {
            let next = v.clamp_to(min, max);
            if next == current {
                Plan::Unchanged
            } else {
                Plan::Next(next)
            }
        }
        Intent::Remove => Plan::Removal(below(current, step)),
    }
}

fn increment<T: Quantity>(current: T, bounds: &Bounds<T>) -> Plan<T> {
    if current >= bounds.max {
        return Plan::AtMax;
    }
    let next = Quantity::checked_add(current, bounds.step)
        .unwrap_or(bounds.max)
        .clamp_to(bounds.min, bounds.max);
    if next == current {
        Plan::Unchanged
    } else {
        Plan::Next(next)
    }
}

#[inline]
fn below<T: Quantity>(current: T, step: T) -> T {
    Quantity::checked_sub(current, step).unwrap_or(current)
}

/// Run the predicate over the candidate. Limits and no-ops pass through.
pub fn validate<T: Quantity>(
    plan: Plan<T>,
    current: T,
    validator: Option<&Validator<T>>,
) -> Result<Plan<T>, StepperError<T>> {
    let attempted = match plan {
        Plan::Next(v) | Plan::Removal(v) => v,
        other => return Ok(other),
    };
    match validator {
        Some(accept) if !accept(current, attempted) => {
            Err(StepperError::Validation { current, attempted })
        }
        _ => Ok(plan),
    }
}

/// Whether a tap on "+" would change the value.
pub fn can_increment<T: Quantity>(current: T, bounds: &Bounds<T>, validator: Option<&Validator<T>>) -> bool {
    matches!(
        validate(plan(Intent::Increment, current, bounds, Source::Tap), current, validator),
        Ok(Plan::Next(_))
    )
}

/// Whether a decrement stays in range (a removal does not count).
pub fn can_decrement<T: Quantity>(current: T, bounds: &Bounds<T>, validator: Option<&Validator<T>>) -> bool {
    matches!(
        validate(plan(Intent::Decrement, current, bounds, Source::LongPress), current, validator),
        Ok(Plan::Next(_))
    )
}

#[inline]
pub fn would_remove<T: Quantity>(current: T, bounds: &Bounds<T>) -> bool {
    current <= bounds.min
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const B: Bounds<i64> = Bounds {
        min: 1,
        max: 10,
        step: 1,
    };

    #[rstest]
    #[case(Intent::Increment, 4, Source::Tap, Plan::Next(5))]
    #[case(Intent::Increment, 10, Source::Tap, Plan::AtMax)]
    #[case(Intent::Decrement, 4, Source::Tap, Plan::Next(3))]
    #[case(Intent::Decrement, 1, Source::Tap, Plan::Removal(0))]
    #[case(Intent::Decrement, 1, Source::LongPress, Plan::AtMin)]
    #[case(Intent::Decrement, 1, Source::Retry, Plan::Removal(0))]
    #[case(Intent::Add, 0, Source::Tap, Plan::Next(1))]
    #[case(Intent::Add, 3, Source::Tap, Plan::Next(4))]
    #[case(Intent::Set(42), 3, Source::Tap, Plan::Next(10))]
    #[case(Intent::Set(3), 3, Source::Tap, Plan::Unchanged)]
    #[case(Intent::Remove, 5, Source::Retry, Plan::Removal(4))]
    fn plans(
        #[case] intent: Intent<i64>,
        #[case] current: i64,
        #[case] source: Source,
        #[case] expected: Plan<i64>,
    ) {
        assert_eq!(plan(intent, current, &B, source), expected);
    }

    #[test]
    fn large_step_clamps_and_stays_feasible() {
        let b = Bounds {
            min: 0,
            max: 10,
            step: 5,
        };
        assert_eq!(plan(Intent::Increment, 8, &b, Source::Tap), Plan::Next(10));
        assert!(can_increment(8, &b, None));
        // floor is reached before removal is offered
        assert_eq!(plan(Intent::Decrement, 3, &b, Source::Tap), Plan::Next(0));
        assert!(can_decrement(3, &b, None));
        assert!(!can_decrement(0, &b, None));
        assert!(would_remove(0, &b));
    }

    #[test]
    fn overflow_saturates_to_max() {
        let b = Bounds {
            min: 0,
            max: i64::MAX,
            step: 10,
        };
        assert_eq!(
            plan(Intent::Increment, i64::MAX - 3, &b, Source::Tap),
            Plan::Next(i64::MAX)
        );
    }

    #[test]
    fn predicate_rejects_without_state() {
        let even_only: Validator<i64> = Box::new(|_, next| next % 2 == 0);
        let err = validate(Plan::Next(5), 4, Some(&even_only)).unwrap_err();
        match err {
            StepperError::Validation { current, attempted } => {
                assert_eq!((current, attempted), (4, 5));
            }
            other => panic!("expected Validation, got {other:?}"),
        }
        assert_eq!(validate(Plan::Next(6), 5, Some(&even_only)).ok(), Some(Plan::Next(6)));
        assert_eq!(validate(Plan::AtMax, 5, Some(&even_only)).ok(), Some(Plan::AtMax));
        assert!(!can_increment(4, &B, Some(&even_only)));
    }
}
