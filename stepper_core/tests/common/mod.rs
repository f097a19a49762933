#![allow(dead_code)]

use std::cell::RefCell;
use std::future::Future;
use std::rc::Rc;
use std::time::Duration;

use stepper_core::{Bounds, Stepper, StepperBuilder, WeakStepper};

pub const BOUNDS: Bounds<i64> = Bounds {
    min: 1,
    max: 10,
    step: 1,
};

pub fn ms(v: u64) -> Duration {
    Duration::from_millis(v)
}

/// Run `f` inside a `LocalSet` so the stepper can spawn its continuations.
pub async fn local<F: Future>(f: F) -> F::Output {
    tokio::task::LocalSet::new().run_until(f).await
}

#[derive(Debug, Clone, PartialEq)]
pub enum Seen {
    Commit(i64),
    Removal(i64),
    Rejected(i64, i64),
    Cancelled(i64),
    Error(i64),
    Max,
    Min,
}

/// Collects every sink notification in order. An echoing recorder also
/// feeds each commit back as the committed value, the way a caller applying
/// server-confirmed values would; call `bind` once the stepper is built.
#[derive(Clone, Default)]
pub struct Recorder {
    log: Rc<RefCell<Vec<Seen>>>,
    echo: Option<Rc<RefCell<WeakStepper<i64>>>>,
}

impl Recorder {
    pub fn echoing() -> Self {
        Self {
            log: Rc::default(),
            echo: Some(Rc::default()),
        }
    }

    pub fn bind(&self, stepper: &Stepper<i64>) {
        if let Some(slot) = &self.echo {
            *slot.borrow_mut() = stepper.downgrade();
        }
    }

    pub fn attach<B>(&self, b: StepperBuilder<i64, B>) -> StepperBuilder<i64, B> {
        let push = |r: &Self| {
            let log = Rc::clone(&r.log);
            move |s: Seen| log.borrow_mut().push(s)
        };
        let (p1, p2, p3, p4, p5, p6, p7) = (
            push(self),
            push(self),
            push(self),
            push(self),
            push(self),
            push(self),
            push(self),
        );
        let echo = self.echo.clone();
        b.on_commit(move |v| {
            p1(Seen::Commit(v));
            let target = echo.as_ref().and_then(|slot| slot.borrow().upgrade());
            if let Some(stepper) = target {
                stepper.set_committed(v);
            }
        })
        .on_removal(move |v| p2(Seen::Removal(v)))
        .on_validation_rejected(move |c, a| p3(Seen::Rejected(c, a)))
        .on_operation_cancelled(move |v| p4(Seen::Cancelled(v)))
        .on_error(move |r| p5(Seen::Error(r.attempted)))
        .on_max_reached(move || p6(Seen::Max))
        .on_min_reached(move || p7(Seen::Min))
    }

    pub fn seen(&self) -> Vec<Seen> {
        self.log.borrow().clone()
    }

    pub fn commits(&self) -> Vec<i64> {
        self.log
            .borrow()
            .iter()
            .filter_map(|s| match s {
                Seen::Commit(v) => Some(*v),
                _ => None,
            })
            .collect()
    }
}
