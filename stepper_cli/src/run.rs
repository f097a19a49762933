//! `stepper run`: replay a scenario script against the simulated backend.
//!
//! Output is JSON lines on stdout. Every script row yields an `action` line,
//! every coordinator event an `event` line (both stamped with `t_ms` relative
//! to the start of the run), and the last line is a `summary` object.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use crossbeam_channel::Receiver;
use eyre::WrapErr;
use serde_json::{Map, Value, json};
use stepper_config::{Config, ScriptAction, ScriptStep};
use stepper_core::mocks::SimulatedOperation;
use stepper_core::{Direction, EventRecord, Step, Stepper, StepperError, StepperEvent, WeakStepper};
use tokio::time::{Instant, sleep_until};

const FEED_CAPACITY: usize = 4096;

/// CLI overrides applied on top of `[simulation]`.
#[derive(Debug, Default)]
pub struct Overrides {
    pub latency_ms: Option<u64>,
    pub fail_values: Vec<i64>,
}

pub fn run_script(cfg: &Config, script: &[ScriptStep], overrides: Overrides) -> eyre::Result<()> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .wrap_err("start runtime")?;
    let local = tokio::task::LocalSet::new();
    let summary = local.block_on(&rt, drive(cfg, script, overrides))?;
    println!("{}", json!({ "summary": summary }));
    Ok(())
}

async fn drive(cfg: &Config, script: &[ScriptStep], overrides: Overrides) -> eyre::Result<Value> {
    let mut sim = cfg.simulation.clone();
    if let Some(ms) = overrides.latency_ms {
        sim.latency_ms = ms;
    }
    sim.fail_values.extend(overrides.fail_values);
    let op = SimulatedOperation::<i64>::from(&sim);

    let (tx, rx) = crossbeam_channel::bounded(FEED_CAPACITY);
    let echo: Rc<RefCell<WeakStepper<i64>>> = Rc::default();
    let mut builder = Stepper::<i64>::builder()
        .with_cfg(cfg.into())
        .with_committed(cfg.initial_value())
        .with_operation(op.clone())
        .with_event_feed(tx);
    if sim.echo_commits {
        let slot = Rc::clone(&echo);
        builder = builder.on_commit(move |value| {
            let stepper = slot.borrow().upgrade();
            if let Some(stepper) = stepper {
                stepper.set_committed(value);
            }
        });
    }
    let stepper = builder.build()?;
    *echo.borrow_mut() = stepper.downgrade();

    tracing::info!(rows = script.len(), echo = sim.echo_commits, "script started");
    let t0 = Instant::now();
    for row in script {
        sleep_until(t0 + Duration::from_millis(row.at_ms)).await;
        flush(&rx, t0);
        let outcome = apply(&stepper, row);
        let mut line = Map::new();
        line.insert("t_ms".into(), json!(row.at_ms));
        line.insert("action".into(), json!(action_name(row.action)));
        if let Some(v) = row.value {
            line.insert("value".into(), json!(v));
        }
        match outcome {
            Ok(Some(step)) => {
                line.insert("result".into(), json!(step_name(&step)));
            }
            Ok(None) => {}
            Err(e) => {
                tracing::debug!(error = %e, action = action_name(row.action), "request refused");
                line.insert("error".into(), json!(e.to_string()));
                line.insert("kind".into(), json!(format!("{:?}", e.kind())));
            }
        }
        println!("{}", Value::Object(line));
        flush(&rx, t0);
    }

    let last_at = script.last().map_or(0, |s| s.at_ms);
    sleep_until(t0 + Duration::from_millis(last_at + sim.drain_ms)).await;
    flush(&rx, t0);

    let calls = op.calls();
    let failed_calls = calls.iter().filter(|c| c.failed).count();
    tracing::info!(calls = calls.len(), failed_calls, "script finished");
    let summary = json!({
        "calls": calls.len(),
        "failed_calls": failed_calls,
        "targets": op.targets(),
        "final_committed": stepper.committed_value(),
        "final_display": stepper.display_value(),
        "pending": stepper.pending_value(),
        "generation": stepper.generation(),
        "last_error": stepper.last_error().map(|e| e.to_string()),
    });
    stepper.dispose();
    Ok(summary)
}

/// `Ok(None)` for actions that do not produce a [`Step`].
fn apply(stepper: &Stepper<i64>, row: &ScriptStep) -> Result<Option<Step<i64>>, StepperError<i64>> {
    let value = row.value.unwrap_or_default();
    match row.action {
        ScriptAction::Increment => stepper.increment().map(Some),
        ScriptAction::Decrement => stepper.decrement().map(Some),
        ScriptAction::Add => stepper.add().map(Some),
        ScriptAction::Set => stepper.set_value(value).map(Some),
        ScriptAction::Retry => stepper.retry(),
        ScriptAction::PressIncrement => {
            stepper.press_start(Direction::Up);
            Ok(None)
        }
        ScriptAction::PressDecrement => {
            stepper.press_start(Direction::Down);
            Ok(None)
        }
        ScriptAction::Release => {
            stepper.press_end();
            Ok(None)
        }
        ScriptAction::Commit => {
            stepper.set_committed(value);
            Ok(None)
        }
        ScriptAction::Cancel => {
            stepper.cancel();
            Ok(None)
        }
    }
}

fn flush(rx: &Receiver<EventRecord<i64>>, t0: Instant) {
    for rec in rx.try_iter() {
        println!("{}", event_json(&rec, t0));
    }
}

fn event_json(rec: &EventRecord<i64>, t0: Instant) -> Value {
    let mut obj = Map::new();
    obj.insert(
        "t_ms".into(),
        json!(rec.at.saturating_duration_since(t0).as_millis() as u64),
    );
    obj.insert("event".into(), json!(rec.event.name()));
    match &rec.event {
        StepperEvent::Dispatched {
            generation,
            operation,
            target,
        } => {
            obj.insert("generation".into(), json!(generation));
            obj.insert("operation".into(), json!(operation.as_str()));
            obj.insert("target".into(), json!(target));
        }
        StepperEvent::Settled { generation, target } => {
            obj.insert("generation".into(), json!(generation));
            obj.insert("target".into(), json!(target));
        }
        StepperEvent::Deferred { target } => {
            obj.insert("target".into(), json!(target));
        }
        StepperEvent::Debounced { value } | StepperEvent::Commit { value } => {
            obj.insert("value".into(), json!(value));
        }
        StepperEvent::Failed(err) => {
            obj.insert("operation".into(), json!(err.operation.as_str()));
            obj.insert("attempted".into(), json!(err.attempted));
            obj.insert("cause".into(), json!(err.cause.to_string()));
        }
        StepperEvent::Reverted { to } => {
            obj.insert("to".into(), json!(to));
        }
        StepperEvent::Cancelled { attempted, reason } => {
            obj.insert("attempted".into(), json!(attempted));
            obj.insert("reason".into(), json!(reason.to_string()));
        }
        StepperEvent::Removal { attempted } => {
            obj.insert("attempted".into(), json!(attempted));
        }
        StepperEvent::Rejected { current, attempted } => {
            obj.insert("current".into(), json!(current));
            obj.insert("attempted".into(), json!(attempted));
        }
        StepperEvent::Limit(limit) => {
            obj.insert("limit".into(), json!(format!("{limit:?}").to_ascii_lowercase()));
        }
        StepperEvent::LoadingShown | StepperEvent::LoadingHidden => {}
    }
    Value::Object(obj)
}

fn action_name(action: ScriptAction) -> &'static str {
    match action {
        ScriptAction::Increment => "increment",
        ScriptAction::Decrement => "decrement",
        ScriptAction::Add => "add",
        ScriptAction::Set => "set",
        ScriptAction::PressIncrement => "press_increment",
        ScriptAction::PressDecrement => "press_decrement",
        ScriptAction::Release => "release",
        ScriptAction::Commit => "commit",
        ScriptAction::Retry => "retry",
        ScriptAction::Cancel => "cancel",
    }
}

fn step_name(step: &Step<i64>) -> &'static str {
    match step {
        Step::Committed(_) => "committed",
        Step::Dispatched { .. } => "dispatched",
        Step::Deferred(_) => "deferred",
        Step::Debounced(_) => "debounced",
        Step::Removal(_) => "removal",
        Step::Coalesced(_) => "coalesced",
        Step::Limit(_) => "limit",
        Step::Unchanged => "unchanged",
    }
}
