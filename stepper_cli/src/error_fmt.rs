//! Human-readable error descriptions and structured JSON error formatting.

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    use stepper_core::error::BuildError;

    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingBounds => {
                "What happened: No bounds were provided to the stepper.\nLikely causes: The [bounds] section was not wired into the builder.\nHow to fix: Provide min/max/step via with_bounds(...) or the [bounds] table.".to_string()
            }
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun `stepper check`."
            ),
        };
    }

    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();

    if lower.contains("script csv must have headers") {
        return "Invalid headers in script CSV. Expected 'at_ms,action,value'.".to_string();
    }

    if lower.starts_with("script row") || lower.starts_with("invalid script row") {
        return format!(
            "What happened: The scenario script is malformed ({msg}).\nHow to fix: Each row needs a non-decreasing at_ms, a known action and a value for set/commit."
        );
    }

    if lower.starts_with("bounds.")
        || lower.starts_with("timing.")
        || lower.starts_with("long_press.")
        || lower.starts_with("logging.")
        || lower.starts_with("simulation.")
    {
        return format!(
            "What happened: Configuration is invalid ({msg}).\nHow to fix: Edit the TOML config and try again."
        );
    }

    if lower.contains("read config") || lower.contains("open script csv") {
        return format!(
            "What happened: A file could not be read ({msg}).\nHow to fix: Check the path passed to --config / --script."
        );
    }

    // Generic fallback
    let cause = err
        .chain()
        .nth(1)
        .map(|src| format!(" Cause: {src}"))
        .unwrap_or_default();
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable exit codes: 3 for config problems, 4 for script problems, 1 otherwise.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    match reason_name(err) {
        "InvalidConfig" | "MissingBounds" | "Config" => 3,
        "Script" => 4,
        _ => 1,
    }
}

fn reason_name(err: &eyre::Report) -> &'static str {
    use stepper_core::error::BuildError;

    match err.downcast_ref::<BuildError>() {
        Some(BuildError::MissingBounds) => return "MissingBounds",
        Some(BuildError::InvalidConfig(_)) => return "InvalidConfig",
        None => {}
    }
    let lower = err.to_string().to_ascii_lowercase();
    if lower.contains("script") {
        "Script"
    } else if lower.contains("config")
        || ["bounds.", "timing.", "long_press.", "logging.", "simulation."]
            .iter()
            .any(|p| lower.starts_with(p))
    {
        "Config"
    } else {
        "Error"
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    serde_json::json!({
        "reason": reason_name(err),
        "exit_code": exit_code_for_error(err),
        "message": humanize(err),
    })
    .to_string()
}
