//! Scenario script schema.
//!
//! Expected headers:
//! at_ms,action,value
//!
//! Example:
//! at_ms,action,value
//! 0,increment,
//! 100,set,7
//! 400,press_increment,
//! 1200,release,
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ScriptAction {
    Increment,
    Decrement,
    Add,
    Set,
    PressIncrement,
    PressDecrement,
    Release,
    /// The caller applies a committed value (e.g. a server push).
    Commit,
    Retry,
    Cancel,
}

impl ScriptAction {
    pub fn needs_value(self) -> bool {
        matches!(self, Self::Set | Self::Commit)
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct ScriptStep {
    pub at_ms: u64,
    pub action: ScriptAction,
    #[serde(default)]
    pub value: Option<i64>,
}

const EXPECTED_HEADERS: [&str; 3] = ["at_ms", "action", "value"];

/// Parse a scenario from any reader, enforcing the exact header row.
pub fn parse_script_csv<R: Read>(reader: R) -> eyre::Result<Vec<ScriptStep>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr
        .headers()
        .map_err(|e| eyre::eyre!("read script headers: {}", e))?
        .clone();
    let actual: Vec<String> = headers.iter().map(|s| s.to_string()).collect();
    if actual != EXPECTED_HEADERS {
        eyre::bail!(
            "script CSV must have headers 'at_ms,action,value', got: {}",
            actual.join(",")
        );
    }

    let mut steps: Vec<ScriptStep> = Vec::new();
    for (idx, rec) in rdr.deserialize::<ScriptStep>().enumerate() {
        let line = idx + 2;
        let step = rec.map_err(|e| eyre::eyre!("invalid script row {}: {}", line, e))?;
        if step.action.needs_value() && step.value.is_none() {
            eyre::bail!("script row {}: action {:?} requires a value", line, step.action);
        }
        if let Some(prev) = steps.last()
            && step.at_ms < prev.at_ms
        {
            eyre::bail!(
                "script row {}: at_ms must not decrease ({} after {})",
                line,
                step.at_ms,
                prev.at_ms
            );
        }
        steps.push(step);
    }

    Ok(steps)
}

pub fn load_script_csv(path: &std::path::Path) -> eyre::Result<Vec<ScriptStep>> {
    let file =
        std::fs::File::open(path).map_err(|e| eyre::eyre!("open script CSV {:?}: {}", path, e))?;
    parse_script_csv(file)
}
