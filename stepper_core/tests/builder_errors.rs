use std::time::Duration;

use rstest::rstest;
use stepper_core::error::BuildError;
use stepper_core::{Bounds, LongPressCfg, Stepper, StepperCfg, TimingCfg};

#[rstest]
fn builder_missing_bounds_yields_typed_build_error() {
    let err = Stepper::<i64>::builder()
        // missing with_bounds()
        .with_committed(3)
        .try_build()
        .expect_err("should fail with MissingBounds");

    match err.downcast_ref::<BuildError>() {
        Some(BuildError::MissingBounds) => {}
        other => panic!("expected MissingBounds, got: {other:?}"),
    }
}

#[rstest]
#[case::inverted(Bounds { min: 5, max: 1, step: 1 }, None, "min must be <= max")]
#[case::zero_step(Bounds { min: 1, max: 5, step: 0 }, None, "step must be > 0")]
#[case::negative_step(Bounds { min: 1, max: 5, step: -2 }, None, "step must be > 0")]
#[case::committed_above(Bounds { min: 1, max: 5, step: 1 }, Some(6), "committed value out of range")]
#[case::committed_below(Bounds { min: 1, max: 5, step: 1 }, Some(-1), "committed value out of range")]
fn invalid_bounds_are_rejected(
    #[case] bounds: Bounds<i64>,
    #[case] committed: Option<i64>,
    #[case] msg: &str,
) {
    let mut b = Stepper::builder().with_bounds(bounds);
    if let Some(v) = committed {
        b = b.with_committed(v);
    }
    let err = b.build().expect_err("should be invalid");
    match err.downcast_ref::<BuildError>() {
        Some(BuildError::InvalidConfig(m)) => assert_eq!(*m, msg),
        other => panic!("expected InvalidConfig, got: {other:?}"),
    }
}

#[rstest]
fn one_step_below_min_is_a_valid_start() {
    let stepper = Stepper::builder()
        .with_bounds(Bounds { min: 1, max: 5, step: 1 })
        .with_committed(0)
        .build()
        .expect("removed state is displayable");
    assert!(stepper.would_remove());
}

#[rstest]
fn zero_debounce_delay_is_rejected() {
    let err = Stepper::builder()
        .with_bounds(Bounds { min: 0, max: 9, step: 1 })
        .with_timing(TimingCfg {
            debounce_delay: Some(Duration::ZERO),
            ..TimingCfg::default()
        })
        .build()
        .expect_err("zero debounce");
    assert!(err.to_string().contains("debounce delay must be > 0"));
}

#[rstest]
fn zero_long_press_interval_is_rejected() {
    let err = Stepper::builder()
        .with_bounds(Bounds { min: 0, max: 9, step: 1 })
        .with_long_press(LongPressCfg {
            interval: Duration::ZERO,
            ..LongPressCfg::default()
        })
        .build()
        .expect_err("zero interval");
    assert!(err.to_string().contains("long press interval must be > 0"));
}

#[rstest]
fn nan_bounds_are_rejected() {
    let err = Stepper::builder()
        .with_bounds(Bounds {
            min: f64::NAN,
            max: 1.0,
            step: 0.1,
        })
        .build()
        .expect_err("nan min");
    assert!(err.to_string().contains("min must be <= max"));
}

#[rstest]
fn with_cfg_carries_every_section() {
    let cfg = StepperCfg {
        bounds: Bounds { min: 0, max: 3, step: 1 },
        timing: TimingCfg {
            throttle_interval: Duration::from_millis(10),
            ..TimingCfg::default()
        },
        policy: stepper_core::PolicyCfg::default(),
        long_press: LongPressCfg::default(),
    };
    let stepper = Stepper::builder().with_cfg(cfg.clone()).build().unwrap();
    assert_eq!(stepper.config(), &cfg);
    assert_eq!(stepper.committed_value(), 0);
}
