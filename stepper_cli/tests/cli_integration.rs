use assert_cmd::prelude::*;
use predicates::prelude::*;
use rstest::rstest;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

// Minimal valid config with a fast simulated backend
fn write_valid_config(dir: &tempfile::TempDir) -> PathBuf {
    let toml = r#"
[bounds]
min = 1
max = 10
step = 1

[timing]
throttle_interval_ms = 80
minimum_duration_ms = 0

[simulation]
latency_ms = 20
echo_commits = true
drain_ms = 200
"#;
    let path = dir.path().join("cfg.toml");
    fs::write(&path, toml).unwrap();
    path
}

fn write_script(dir: &tempfile::TempDir, body: &str) -> PathBuf {
    let path = dir.path().join("script.csv");
    let mut f = fs::File::create(&path).unwrap();
    write!(f, "{body}").unwrap();
    path
}

fn summary(stdout: &[u8]) -> serde_json::Value {
    let text = String::from_utf8_lossy(stdout);
    let last = text.lines().last().expect("at least one line");
    let v: serde_json::Value = serde_json::from_str(last).unwrap();
    v["summary"].clone()
}

#[rstest]
#[case(&["--help"], 0, "Usage:", "stdout")]
#[case(&["check"], 0, "config ok", "stdout")]
#[case(&["run"], 2, "required", "stderr")]
#[case(&["frobnicate"], 2, "unrecognized subcommand", "stderr")]
fn cli_table_cases(
    #[case] args: &[&str],
    #[case] exit_code: i32,
    #[case] needle: &str,
    #[case] stream: &str,
) {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    let mut cmd = Command::cargo_bin("stepper").unwrap();
    // Always include a valid config to avoid relying on default path
    cmd.arg("--config").arg(&cfg);
    for a in args {
        cmd.arg(a);
    }

    let assert = cmd.assert().code(exit_code);
    match stream {
        "stdout" => {
            assert.stdout(predicate::str::contains(needle));
        }
        "stderr" => {
            assert.stderr(predicate::str::contains(needle));
        }
        other => panic!("unknown stream: {other}"),
    }
}

#[rstest]
fn run_coalesces_rapid_taps_into_one_call() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);
    let script = write_script(&dir, "at_ms,action,value\n0,increment,\n10,increment,\n");

    let out = Command::cargo_bin("stepper")
        .unwrap()
        .arg("--config")
        .arg(&cfg)
        .arg("run")
        .arg("--script")
        .arg(&script)
        .output()
        .unwrap();
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));

    let s = summary(&out.stdout);
    assert_eq!(s["calls"], 1);
    assert_eq!(s["failed_calls"], 0);
    assert_eq!(s["final_committed"], 2);
    assert_eq!(s["final_display"], 2);

    let text = String::from_utf8_lossy(&out.stdout);
    let events: Vec<serde_json::Value> = text
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .filter(|v: &serde_json::Value| v.get("event").is_some())
        .collect();
    let names: Vec<&str> = events.iter().filter_map(|e| e["event"].as_str()).collect();
    assert!(names.contains(&"dispatched"));
    assert!(names.contains(&"commit"));
}

#[rstest]
fn run_reports_rejected_target() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);
    let script = write_script(&dir, "at_ms,action,value\n0,increment,\n");

    let out = Command::cargo_bin("stepper")
        .unwrap()
        .arg("--config")
        .arg(&cfg)
        .arg("run")
        .arg("--script")
        .arg(&script)
        .arg("--fail-value")
        .arg("2")
        .output()
        .unwrap();
    assert!(out.status.success());

    let s = summary(&out.stdout);
    assert_eq!(s["failed_calls"], 1);
    assert_eq!(s["final_committed"], 1);
    assert_eq!(s["last_error"], "increment to 2 failed: backend rejected 2");
}

#[rstest]
fn cli_reports_bad_script_header() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);
    let script = write_script(&dir, "when,what\n0,increment\n");

    Command::cargo_bin("stepper")
        .unwrap()
        .arg("--config")
        .arg(&cfg)
        .arg("run")
        .arg("--script")
        .arg(&script)
        .assert()
        .code(4)
        .stderr(predicate::str::contains("Invalid headers"));
}

#[rstest]
fn invalid_config_exits_with_config_code() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    fs::write(&path, "[bounds]\nmin = 1\nmax = 5\nstep = 0\n").unwrap();

    Command::cargo_bin("stepper")
        .unwrap()
        .arg("--config")
        .arg(&path)
        .arg("check")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("bounds.step must be > 0"));
}

#[rstest]
fn json_mode_emits_structured_errors() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("nope.toml");

    let out = Command::cargo_bin("stepper")
        .unwrap()
        .arg("--json")
        .arg("--config")
        .arg(&missing)
        .arg("check")
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(3));
    let err: serde_json::Value =
        serde_json::from_str(String::from_utf8_lossy(&out.stderr).trim()).unwrap();
    assert_eq!(err["reason"], "Config");
}
