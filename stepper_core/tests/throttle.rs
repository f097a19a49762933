mod common;

use common::{BOUNDS, Recorder, Seen, local, ms};
use stepper_core::mocks::SimulatedOperation;
use stepper_core::{PolicyCfg, Step, Stepper, StepperEvent, TimingCfg};
use tokio::time::{Instant, sleep, sleep_until};

fn optimistic() -> PolicyCfg {
    PolicyCfg {
        optimistic_update: true,
        ..PolicyCfg::default()
    }
}

#[tokio::test(start_paused = true)]
async fn five_quick_taps_make_one_call() {
    local(async {
        let op = SimulatedOperation::new(ms(300));
        let stepper = Stepper::builder()
            .with_bounds(BOUNDS)
            .with_operation(op.clone())
            .build()
            .unwrap();

        let first = stepper.increment().unwrap();
        assert!(matches!(first, Step::Dispatched { target: 2, .. }));
        for _ in 0..4 {
            sleep(ms(50)).await;
            // committed is still 1, so every tap asks for 2 again
            assert_eq!(stepper.increment().unwrap(), Step::Coalesced(2));
        }
        sleep(ms(1000)).await;

        assert_eq!(op.targets(), vec![2]);
        assert!(op.targets().iter().all(|v| *v <= BOUNDS.max));
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn optimistic_burst_sends_leading_then_trailing_call() {
    local(async {
        let op = SimulatedOperation::new(ms(30));
        let stepper = Stepper::builder()
            .with_bounds(BOUNDS)
            .with_policy(optimistic())
            .with_operation(op.clone())
            .build()
            .unwrap();
        let t0 = Instant::now();

        stepper.increment().unwrap();
        for expected in 3..=6 {
            sleep(ms(10)).await;
            assert_eq!(stepper.increment().unwrap(), Step::Deferred(expected));
            assert_eq!(stepper.display_value(), expected);
        }
        sleep(ms(500)).await;

        // optimistic taps build on each other, so the window holds a new
        // target; the leading edge already went out and one trailing call follows
        let calls = op.calls();
        let summary: Vec<_> = calls.iter().map(|c| (c.target, c.at - t0)).collect();
        assert_eq!(summary, vec![(2, ms(0)), (6, ms(80))]);
        // never confirmed by the caller
        assert_eq!(stepper.pending_value(), Some(6));
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn superseded_leading_call_is_silent() {
    local(async {
        let rec = Recorder::default();
        let op = SimulatedOperation::new(ms(200)).with_fail_values([2]);
        let stepper = rec
            .attach(Stepper::builder().with_bounds(BOUNDS))
            .with_policy(optimistic())
            .with_operation(op.clone())
            .build()
            .unwrap();

        stepper.increment().unwrap();
        let leading = stepper.generation();
        sleep(ms(10)).await;
        stepper.increment().unwrap();

        sleep(ms(100)).await; // trailing fired at 80 ms
        assert!(stepper.generation() > leading);
        assert_eq!(rec.seen(), vec![Seen::Cancelled(2)]);

        sleep(ms(120)).await; // leading failure resolves at 200 ms
        assert!(stepper.last_error().is_none());
        assert_eq!(stepper.display_value(), 3);
        assert_eq!(rec.seen(), vec![Seen::Cancelled(2)]);

        sleep(ms(100)).await; // trailing succeeds at 280 ms
        assert_eq!(rec.seen(), vec![Seen::Cancelled(2), Seen::Commit(3)]);
        assert_eq!(op.targets(), vec![2, 3]);
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn loading_stays_for_minimum_duration() {
    local(async {
        let op = SimulatedOperation::new(ms(50));
        let stepper = Stepper::builder()
            .with_bounds(BOUNDS)
            .with_operation(op)
            .build()
            .unwrap();
        let t0 = Instant::now();

        stepper.increment().unwrap();
        assert!(stepper.is_loading());
        sleep_until(t0 + ms(100)).await;
        assert!(!stepper.is_in_flight());
        assert!(stepper.is_loading());
        sleep_until(t0 + ms(299)).await;
        assert!(stepper.is_loading());
        sleep_until(t0 + ms(301)).await;
        assert!(!stepper.is_loading());
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn fast_operation_under_show_delay_never_shows_loading() {
    local(async {
        let (tx, rx) = crossbeam_channel::bounded(64);
        let stepper = Stepper::builder()
            .with_bounds(BOUNDS)
            .with_timing(TimingCfg {
                show_delay: ms(100),
                ..TimingCfg::default()
            })
            .with_operation(SimulatedOperation::new(ms(50)))
            .with_event_feed(tx)
            .build()
            .unwrap();

        stepper.increment().unwrap();
        for _ in 0..4 {
            assert!(!stepper.is_loading());
            sleep(ms(40)).await;
        }
        let names: Vec<_> = rx.try_iter().map(|r| r.event.name()).collect();
        assert_eq!(names, vec!["dispatched", "settled", "commit"]);
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn slow_operation_shows_after_delay_then_holds_minimum() {
    local(async {
        let stepper = Stepper::builder()
            .with_bounds(BOUNDS)
            .with_timing(TimingCfg {
                show_delay: ms(100),
                ..TimingCfg::default()
            })
            .with_operation(SimulatedOperation::new(ms(200)))
            .build()
            .unwrap();
        let t0 = Instant::now();

        stepper.increment().unwrap();
        sleep_until(t0 + ms(99)).await;
        assert!(!stepper.is_loading());
        sleep_until(t0 + ms(150)).await;
        assert!(stepper.is_loading());
        // shown at 100 ms, so the 300 ms floor ends at 400 ms
        sleep_until(t0 + ms(399)).await;
        assert!(stepper.is_loading());
        sleep_until(t0 + ms(401)).await;
        assert!(!stepper.is_loading());
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn event_feed_orders_lifecycle() {
    local(async {
        let (tx, rx) = crossbeam_channel::bounded(64);
        let stepper = Stepper::builder()
            .with_bounds(BOUNDS)
            .with_operation(SimulatedOperation::new(ms(50)))
            .with_event_feed(tx)
            .build()
            .unwrap();
        let t0 = Instant::now();

        stepper.increment().unwrap();
        sleep(ms(500)).await;

        let records: Vec<_> = rx.try_iter().collect();
        let names: Vec<_> = records.iter().map(|r| r.event.name()).collect();
        assert_eq!(
            names,
            vec!["dispatched", "loading_shown", "settled", "commit", "loading_hidden"]
        );
        let hidden_at = records.last().map(|r| r.at - t0);
        assert_eq!(hidden_at, Some(ms(300)));
        assert!(matches!(
            records[0].event,
            StepperEvent::Dispatched { target: 2, .. }
        ));
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn echoed_commits_advance_each_window() {
    local(async {
        let rec = Recorder::echoing();
        let op = SimulatedOperation::new(ms(20));
        let stepper = rec
            .attach(Stepper::builder().with_bounds(BOUNDS))
            .with_operation(op.clone())
            .build()
            .unwrap();
        rec.bind(&stepper);

        for _ in 0..3 {
            stepper.increment().unwrap();
            sleep(ms(100)).await;
        }
        assert_eq!(op.targets(), vec![2, 3, 4]);
        assert_eq!(stepper.committed_value(), 4);
        assert_eq!(stepper.display_value(), 4);
    })
    .await;
}
