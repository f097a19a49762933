//! `Stepper`: reconciles user intents with the committed value and one
//! fallible async operation.
//!
//! ## Routing
//!
//! - no operation: the value is applied and committed synchronously
//! - removal: dispatched immediately, bypassing debounce and throttle
//! - debounce configured: accumulate, then one dispatch after the idle delay
//! - otherwise: leading-edge throttle with one trailing invocation
//!
//! ## Cancellation
//!
//! Every continuation holds a `Weak` handle plus an [`EpochToken`] and checks
//! the token right after each suspension point; a stale token discards the
//! continuation without touching state. All continuations also race the
//! instance's shutdown token, which is cancelled by [`Stepper::dispose`] and
//! when the last handle is dropped.
//!
//! ## Runtime
//!
//! State lives in `Rc`/`RefCell`, so `Stepper` is `!Send`. Continuations are
//! started with `tokio::task::spawn_local`.
//!
//! # Panics
//!
//! Any call that starts a timer or an operation panics when invoked outside a
//! `tokio::task::LocalSet`. The synchronous path (no operation, no debounce)
//! never spawns.

use std::cell::RefCell;
use std::future::Future;
use std::ops::ControlFlow;
use std::rc::{Rc, Weak};
use std::sync::Arc;
use std::time::Duration;

use stepper_traits::{OperationFailure, Quantity, ValueOperation};
use tokio::time::{Instant, sleep, sleep_until};
use tokio_util::sync::CancellationToken;

use crate::builder::{Missing, StepperBuilder};
use crate::clamp::{self, Intent, Plan, Source, Validator};
use crate::config::StepperCfg;
use crate::display::DisplayState;
use crate::error::{CancelReason, Cause, OperationKind, StepperError};
use crate::events::{Limit, Sinks, StepperEvent};
use crate::generation::{Epoch, EpochToken};
use crate::ledger::{ErrorLedger, ErrorRecord};
use crate::loading::LoadingGate;
use crate::repeat::{self, Direction, RepeatGate};
use crate::throttle::{Offer, Throttle};

/// What a request did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Step<T> {
    /// Applied synchronously (no operation configured).
    Committed(T),
    /// The operation was invoked under `generation`.
    Dispatched { generation: u64, target: T },
    /// Queued for the trailing edge of the throttle window.
    Deferred(T),
    /// Accumulated into the debounce burst.
    Debounced(T),
    /// Removal signalled (sync) or dispatched.
    Removal(T),
    /// Same target as the in-flight or last invocation; nothing new happened.
    Coalesced(T),
    Limit(Limit),
    Unchanged,
}

impl<T> Step<T> {
    /// A new value was accepted for application.
    pub fn is_accepted(&self) -> bool {
        matches!(
            self,
            Self::Committed(_) | Self::Dispatched { .. } | Self::Deferred(_) | Self::Debounced(_)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route {
    Throttle,
    Debounce,
    Removal,
}

#[derive(Debug, Clone, Copy)]
struct InFlight<T> {
    generation: u64,
    target: T,
}

struct State<T> {
    committed: T,
    display: DisplayState<T>,
    throttle: Throttle<T>,
    loading: LoadingGate,
    ledger: ErrorLedger<T>,
    in_flight: Option<InFlight<T>>,
    press: Option<CancellationToken>,
    disposed: bool,
}

pub(crate) struct Inner<T: Quantity> {
    cfg: StepperCfg<T>,
    operation: Option<Rc<dyn ValueOperation<T>>>,
    validator: Option<Validator<T>>,
    sinks: Sinks<T>,
    epoch: Epoch,
    shutdown: CancellationToken,
    state: RefCell<State<T>>,
}

impl<T: Quantity> Drop for Inner<T> {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

impl<T: Quantity> Inner<T> {
    fn emit(&self, events: Vec<StepperEvent<T>>) {
        for event in events {
            self.sinks.deliver(event);
        }
    }
}

/// Handle to one stepper instance. Clones share the instance.
pub struct Stepper<T: Quantity> {
    inner: Rc<Inner<T>>,
}

impl<T: Quantity> Clone for Stepper<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Quantity> std::fmt::Debug for Stepper<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = self.inner.state.borrow();
        f.debug_struct("Stepper")
            .field("committed", &s.committed)
            .field("display", &s.display)
            .field("loading", &s.loading.is_active())
            .field("generation", &self.inner.epoch.current())
            .finish_non_exhaustive()
    }
}

/// Non-owning handle for callbacks that need to reach back into the stepper.
pub struct WeakStepper<T: Quantity> {
    inner: Weak<Inner<T>>,
}

impl<T: Quantity> Clone for WeakStepper<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Weak::clone(&self.inner),
        }
    }
}

impl<T: Quantity> WeakStepper<T> {
    /// An empty handle; `upgrade()` always fails. Useful to build sinks
    /// before the stepper exists.
    pub fn new() -> Self {
        Self { inner: Weak::new() }
    }

    pub fn upgrade(&self) -> Option<Stepper<T>> {
        self.inner.upgrade().map(|inner| Stepper { inner })
    }
}

impl<T: Quantity> Default for WeakStepper<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Quantity> Stepper<T> {
    pub fn builder() -> StepperBuilder<T, Missing> {
        StepperBuilder::new()
    }

    pub(crate) fn from_parts(
        cfg: StepperCfg<T>,
        committed: T,
        operation: Option<Rc<dyn ValueOperation<T>>>,
        validator: Option<Validator<T>>,
        sinks: Sinks<T>,
    ) -> Self {
        let throttle = Throttle::new(cfg.timing.throttle_interval);
        Self {
            inner: Rc::new(Inner {
                cfg,
                operation,
                validator,
                sinks,
                epoch: Epoch::new(),
                shutdown: CancellationToken::new(),
                state: RefCell::new(State {
                    committed,
                    display: DisplayState::Committed,
                    throttle,
                    loading: LoadingGate::default(),
                    ledger: ErrorLedger::default(),
                    in_flight: None,
                    press: None,
                    disposed: false,
                }),
            }),
        }
    }

    pub fn downgrade(&self) -> WeakStepper<T> {
        WeakStepper {
            inner: Rc::downgrade(&self.inner),
        }
    }

    pub fn config(&self) -> &StepperCfg<T> {
        &self.inner.cfg
    }

    // ── Queries ──────────────────────────────────────────────────────────────

    /// Debounced value, else pending value, else committed value.
    pub fn display_value(&self) -> T {
        let s = self.inner.state.borrow();
        s.display.resolve(s.committed)
    }

    pub fn committed_value(&self) -> T {
        self.inner.state.borrow().committed
    }

    pub fn pending_value(&self) -> Option<T> {
        self.inner.state.borrow().display.pending()
    }

    pub fn display_state(&self) -> DisplayState<T> {
        self.inner.state.borrow().display
    }

    pub fn is_loading(&self) -> bool {
        self.inner.state.borrow().loading.is_active()
    }

    pub fn is_in_flight(&self) -> bool {
        self.inner.state.borrow().in_flight.is_some()
    }

    pub fn last_error(&self) -> Option<ErrorRecord<T>> {
        self.inner.state.borrow().ledger.last().cloned()
    }

    /// Id of the live generation.
    pub fn generation(&self) -> u64 {
        self.inner.epoch.current()
    }

    pub fn can_increment(&self) -> bool {
        clamp::can_increment(self.display_value(), &self.inner.cfg.bounds, self.inner.validator.as_ref())
    }

    pub fn can_decrement(&self) -> bool {
        clamp::can_decrement(self.display_value(), &self.inner.cfg.bounds, self.inner.validator.as_ref())
    }

    /// A tap on "-" would signal removal instead of decrementing.
    pub fn would_remove(&self) -> bool {
        clamp::would_remove(self.display_value(), &self.inner.cfg.bounds)
    }

    // ── Intents ──────────────────────────────────────────────────────────────

    pub fn increment(&self) -> Result<Step<T>, StepperError<T>> {
        self.request(Intent::Increment, Source::Tap)
    }

    pub fn decrement(&self) -> Result<Step<T>, StepperError<T>> {
        self.request(Intent::Decrement, Source::Tap)
    }

    pub fn add(&self) -> Result<Step<T>, StepperError<T>> {
        self.request(Intent::Add, Source::Tap)
    }

    pub fn set_value(&self, value: T) -> Result<Step<T>, StepperError<T>> {
        self.request(Intent::Set(value), Source::Tap)
    }

    /// Like [`request`](Self::request) but refuses with `Busy` while an
    /// operation is outstanding.
    pub fn try_request(&self, intent: Intent<T>, source: Source) -> Result<Step<T>, StepperError<T>> {
        if let Some(f) = self.inner.state.borrow().in_flight {
            return Err(StepperError::Busy { in_flight: f.target });
        }
        self.request(intent, source)
    }

    /// Clamp, validate and route one intent against the displayed value.
    pub fn request(&self, intent: Intent<T>, source: Source) -> Result<Step<T>, StepperError<T>> {
        let (current, disposed) = {
            let s = self.inner.state.borrow();
            (s.display.resolve(s.committed), s.disposed)
        };
        if disposed {
            return Err(StepperError::Cancelled(CancelReason::Disposed));
        }

        let candidate = clamp::plan(intent, current, &self.inner.cfg.bounds, source);
        let plan = match clamp::validate(candidate, current, self.inner.validator.as_ref()) {
            Ok(plan) => plan,
            Err(err) => {
                if let StepperError::Validation { current, attempted } = err {
                    tracing::debug!(%current, %attempted, "validation rejected");
                    self.inner
                        .emit(vec![StepperEvent::Rejected { current, attempted }]);
                }
                return Err(err);
            }
        };

        let step = match plan {
            Plan::Next(target) => self.route(target, intent.kind()),
            Plan::Removal(attempted) => self.remove(attempted),
            Plan::AtMax => {
                self.inner.emit(vec![StepperEvent::Limit(Limit::Max)]);
                Step::Limit(Limit::Max)
            }
            Plan::AtMin => {
                self.inner.emit(vec![StepperEvent::Limit(Limit::Min)]);
                Step::Limit(Limit::Min)
            }
            Plan::Unchanged => Step::Unchanged,
        };
        Ok(step)
    }

    /// Replay the last failed operation against the current displayed value.
    /// `Ok(None)` when nothing failed.
    pub fn retry(&self) -> Result<Option<Step<T>>, StepperError<T>> {
        let intent = self
            .inner
            .state
            .borrow()
            .ledger
            .last()
            .map(ErrorRecord::retry_intent);
        match intent {
            Some(intent) => self.request(intent, Source::Retry).map(Some),
            None => Ok(None),
        }
    }

    /// The caller applied a new authoritative value.
    pub fn set_committed(&self, value: T) {
        let confirmed = {
            let mut s = self.inner.state.borrow_mut();
            s.committed = value;
            s.display.observe_committed(value)
        };
        if confirmed {
            tracing::debug!(%value, "pending value confirmed");
        }
    }

    /// Abandon whatever is outstanding and return the display to the
    /// committed value.
    pub fn cancel(&self) {
        self.abandon(CancelReason::UserCancelled);
    }

    /// Stop every timer and continuation. Further intents fail with
    /// `Cancelled(Disposed)`.
    pub fn dispose(&self) {
        if self.inner.state.borrow().disposed {
            return;
        }
        self.abandon(CancelReason::Disposed);
        self.inner.state.borrow_mut().disposed = true;
        self.inner.shutdown.cancel();
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.state.borrow().disposed
    }

    // ── Long press ───────────────────────────────────────────────────────────

    /// Begin a press-and-hold session, cancelling any earlier one.
    pub fn press_start(&self, direction: Direction) {
        if self.is_disposed() {
            return;
        }
        let session = self.inner.shutdown.child_token();
        if let Some(previous) = self.inner.state.borrow_mut().press.replace(session.clone()) {
            previous.cancel();
        }

        let cfg = &self.inner.cfg;
        let mut gate = RepeatGate::new(
            self.inner.operation.is_some(),
            cfg.timing.debounce_delay.is_some(),
            cfg.policy.allow_long_press_for_async,
        );
        let long_press = cfg.long_press;
        let weak = self.downgrade();

        tokio::task::spawn_local(async move {
            let ticks = repeat::run(long_press, session, || {
                let Some(stepper) = weak.upgrade() else {
                    return ControlFlow::Break(());
                };
                if !gate.permits() {
                    tracing::debug!(dispatched = gate.dispatched(), "long press gated");
                    return ControlFlow::Break(());
                }
                match stepper.request(direction.intent(), Source::LongPress) {
                    Ok(step) if step.is_accepted() => {
                        gate.record_dispatch();
                        ControlFlow::Continue(())
                    }
                    Ok(Step::Coalesced(_)) => ControlFlow::Continue(()),
                    _ => ControlFlow::Break(()),
                }
            })
            .await;
            tracing::debug!(ticks, ?direction, "long press ended");
        });
    }

    pub fn press_end(&self) {
        if let Some(session) = self.inner.state.borrow_mut().press.take() {
            session.cancel();
        }
    }

    // ── Routing ──────────────────────────────────────────────────────────────

    fn route(&self, target: T, kind: OperationKind) -> Step<T> {
        if self.inner.operation.is_none() {
            {
                let mut s = self.inner.state.borrow_mut();
                s.committed = target;
                s.display.clear();
            }
            self.inner.emit(vec![StepperEvent::Commit { value: target }]);
            return Step::Committed(target);
        }
        match self.inner.cfg.timing.debounce_delay {
            Some(delay) => self.debounce(target, kind, delay),
            None => self.throttle(target, kind),
        }
    }

    fn remove(&self, attempted: T) -> Step<T> {
        if self.inner.operation.is_none() {
            self.inner.emit(vec![StepperEvent::Removal { attempted }]);
            return Step::Removal(attempted);
        }
        {
            let mut s = self.inner.state.borrow_mut();
            s.throttle.reset();
            s.display.clear();
        }
        self.dispatch(attempted, OperationKind::Remove, Route::Removal);
        Step::Removal(attempted)
    }

    fn throttle(&self, target: T, kind: OperationKind) -> Step<T> {
        let now = Instant::now();
        let optimistic = self.inner.cfg.policy.optimistic_update;
        let offer = {
            let mut s = self.inner.state.borrow_mut();
            if s.in_flight.is_some_and(|f| f.target == target) {
                // the newest desire is what is already on its way
                s.throttle.reset();
                return Step::Coalesced(target);
            }
            let offer = s.throttle.offer(now, target, kind);
            if matches!(offer, Offer::Deferred { .. }) && optimistic {
                s.display.expect(target);
            }
            offer
        };

        match offer {
            Offer::Fire(value) => {
                let generation = self.dispatch(value, kind, Route::Throttle);
                Step::Dispatched {
                    generation,
                    target: value,
                }
            }
            Offer::Deferred { arm } => {
                if let Some(arm) = arm {
                    let weak = self.downgrade();
                    self.spawn(async move {
                        sleep_until(arm.at).await;
                        if let Some(stepper) = weak.upgrade() {
                            stepper.fire_trailing(arm.ticket);
                        }
                    });
                }
                self.inner.emit(vec![StepperEvent::Deferred { target }]);
                Step::Deferred(target)
            }
            Offer::Duplicate => Step::Coalesced(target),
        }
    }

    fn fire_trailing(&self, ticket: u64) {
        let next = {
            let mut s = self.inner.state.borrow_mut();
            match s.throttle.fire_trailing(ticket) {
                Some((value, _)) if s.in_flight.is_some_and(|f| f.target == value) => None,
                other => other,
            }
        };
        match next {
            Some((value, kind)) => {
                tracing::trace!(ticket, %value, "throttle trailing edge");
                self.dispatch(value, kind, Route::Throttle);
            }
            None => tracing::trace!(ticket, "throttle trailing edge: nothing to send"),
        }
    }

    fn debounce(&self, value: T, kind: OperationKind, delay: Duration) -> Step<T> {
        let token = self.inner.epoch.advance();
        let mut events = Vec::with_capacity(3);
        {
            let mut s = self.inner.state.borrow_mut();
            // A settled operation's minimum-duration tail is left running.
            if let Some(previous) = s.in_flight.take() {
                events.push(StepperEvent::Cancelled {
                    attempted: previous.target,
                    reason: CancelReason::Superseded,
                });
                if s.loading.hide() {
                    events.push(StepperEvent::LoadingHidden);
                }
            }
            let committed = s.committed;
            s.display.accumulate(value, committed);
        }
        events.push(StepperEvent::Debounced { value });
        self.inner.emit(events);

        let weak = self.downgrade();
        self.spawn(async move {
            sleep(delay).await;
            if !token.is_live() {
                tracing::trace!(generation = token.id(), "debounce timer superseded");
                return;
            }
            if let Some(stepper) = weak.upgrade() {
                stepper.dispatch(value, kind, Route::Debounce);
            }
        });
        Step::Debounced(value)
    }

    // ── Dispatch & settle ────────────────────────────────────────────────────

    fn dispatch(&self, target: T, kind: OperationKind, route: Route) -> u64 {
        let Some(operation) = self.inner.operation.clone() else {
            return self.inner.epoch.current();
        };
        let token = self.inner.epoch.advance();
        let generation = token.id();
        let now = Instant::now();
        let timing = &self.inner.cfg.timing;
        let mut events = Vec::with_capacity(3);

        let spawn_show = {
            let mut s = self.inner.state.borrow_mut();
            if let Some(previous) = s.in_flight.replace(InFlight { generation, target }) {
                events.push(StepperEvent::Cancelled {
                    attempted: previous.target,
                    reason: CancelReason::Superseded,
                });
            }
            s.ledger.clear();
            s.throttle.mark_fired(now, target);
            if route == Route::Throttle && self.inner.cfg.policy.optimistic_update {
                s.display.expect(target);
            }
            events.push(StepperEvent::Dispatched {
                generation,
                operation: kind,
                target,
            });
            if timing.show_delay.is_zero() {
                if s.loading.show(now) {
                    events.push(StepperEvent::LoadingShown);
                }
                false
            } else {
                !s.loading.is_active()
            }
        };
        tracing::debug!(generation, operation = %kind, %target, "dispatch");
        self.inner.emit(events);

        if spawn_show {
            let delay = timing.show_delay;
            let weak = self.downgrade();
            let token = token.clone();
            self.spawn(async move {
                sleep(delay).await;
                if !token.is_live() {
                    return;
                }
                if let Some(stepper) = weak.upgrade() {
                    stepper.show_loading(&token);
                }
            });
        }

        let pending = operation.call(target);
        drop(operation);
        let weak = self.downgrade();
        self.spawn(async move {
            let result = pending.await;
            if !token.is_live() {
                tracing::debug!(generation = token.id(), %target, ok = result.is_ok(), "stale completion discarded");
                return;
            }
            if let Some(stepper) = weak.upgrade() {
                stepper.settle(&token, kind, target, result);
            }
        });
        generation
    }

    fn show_loading(&self, token: &EpochToken) {
        let shown = {
            let mut s = self.inner.state.borrow_mut();
            let outstanding = s.in_flight.is_some_and(|f| f.generation == token.id());
            outstanding && s.loading.show(Instant::now())
        };
        if shown {
            self.inner.emit(vec![StepperEvent::LoadingShown]);
        }
    }

    fn settle(
        &self,
        token: &EpochToken,
        kind: OperationKind,
        target: T,
        result: Result<(), OperationFailure>,
    ) {
        let generation = token.id();
        let policy = self.inner.cfg.policy;
        let mut events = Vec::with_capacity(4);

        let tail = {
            let mut s = self.inner.state.borrow_mut();
            s.in_flight = None;
            let committed = s.committed;
            match result {
                Ok(()) => {
                    s.ledger.clear();
                    if kind != OperationKind::Remove {
                        s.display
                            .settle_success(target, committed, policy.optimistic_update);
                    }
                    events.push(StepperEvent::Settled { generation, target });
                    events.push(match kind {
                        OperationKind::Remove => StepperEvent::Removal { attempted: target },
                        _ => StepperEvent::Commit { value: target },
                    });
                }
                Err(failure) => {
                    let cause: Cause = Arc::from(failure);
                    if policy.revert_on_error
                        && let Some(anchor) = s.display.anchor()
                        && anchor != committed
                    {
                        tracing::debug!(%anchor, %committed, "committed moved during burst; reverting to it");
                    }
                    let reverted_to = if kind == OperationKind::Remove {
                        None
                    } else {
                        s.display.settle_failure(committed, policy.revert_on_error)
                    };
                    let mut record = ErrorRecord::new(kind, target, cause);
                    record.reverted_to = reverted_to;
                    s.ledger.record(record.clone());
                    events.push(StepperEvent::Failed(record));
                    if let Some(to) = reverted_to {
                        events.push(StepperEvent::Reverted { to });
                    }
                }
            }
            s.loading
                .remaining(Instant::now(), self.inner.cfg.timing.minimum_duration)
                .map(|rest| (rest, s.loading.started_at()))
        };
        tracing::debug!(generation, %target, "settled");

        match tail {
            None => {}
            Some((rest, _)) if rest.is_zero() => {
                if self.inner.state.borrow_mut().loading.hide() {
                    events.push(StepperEvent::LoadingHidden);
                }
            }
            Some((rest, started_at)) => {
                let weak = self.downgrade();
                self.spawn(async move {
                    sleep(rest).await;
                    if let Some(stepper) = weak.upgrade() {
                        stepper.finish_loading(started_at);
                    }
                });
            }
        }
        self.inner.emit(events);
    }

    /// End of a minimum-duration tail. The tail outlives its generation: a
    /// later tap must not cut it short, so it is keyed on the loading episode
    /// (`started_at`) and yields to any operation still outstanding.
    fn finish_loading(&self, started_at: Option<Instant>) {
        let hidden = {
            let mut s = self.inner.state.borrow_mut();
            let same_episode = s.loading.started_at() == started_at;
            same_episode && s.in_flight.is_none() && s.loading.hide()
        };
        if hidden {
            self.inner.emit(vec![StepperEvent::LoadingHidden]);
        } else {
            tracing::trace!("loading tail superseded");
        }
    }

    fn abandon(&self, reason: CancelReason) {
        self.inner.epoch.advance();
        let mut events = Vec::with_capacity(2);
        let press = {
            let mut s = self.inner.state.borrow_mut();
            let attempted = s
                .in_flight
                .take()
                .map(|f| f.target)
                .or_else(|| s.display.debounced());
            if let Some(attempted) = attempted {
                events.push(StepperEvent::Cancelled { attempted, reason });
            }
            s.throttle.reset();
            s.display.clear();
            if s.loading.hide() {
                events.push(StepperEvent::LoadingHidden);
            }
            s.press.take()
        };
        if let Some(session) = press {
            session.cancel();
        }
        tracing::debug!(%reason, generation = self.inner.epoch.current(), "abandoned");
        self.inner.emit(events);
    }

    fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ()> + 'static,
    {
        let shutdown = self.inner.shutdown.clone();
        tokio::task::spawn_local(async move {
            tokio::select! {
                biased;
                () = shutdown.cancelled() => {}
                () = task => {}
            }
        });
    }
}
