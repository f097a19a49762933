#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod cli;
mod error_fmt;
mod run;

use clap::Parser;
use eyre::WrapErr;
use std::path::Path;

use cli::{Cli, Commands, FILE_GUARD, JSON_MODE};
use error_fmt::{exit_code_for_error, format_error_json, humanize};

fn main() {
    if let Err(e) = real_main() {
        let json = JSON_MODE.get().copied().unwrap_or(false);
        if json {
            eprintln!("{}", format_error_json(&e));
        } else {
            eprintln!("{}", humanize(&e));
        }
        std::process::exit(exit_code_for_error(&e));
    }
}

fn real_main() -> eyre::Result<()> {
    // Keep color-eyre for pretty panics; errors are rendered by error_fmt.
    let _ = color_eyre::install();

    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    let cfg = load_config(&cli.config)?;
    init_tracing(cli.json, cli.log_level.as_deref(), &cfg.logging)?;
    tracing::debug!(config = %cli.config.display(), "config loaded");

    match cli.cmd {
        Commands::Check => {
            let stepper = stepper_core::Stepper::<i64>::builder()
                .with_cfg((&cfg).into())
                .with_committed(cfg.initial_value())
                .build()?;
            let bounds = &stepper.config().bounds;
            println!(
                "config ok: bounds [{}, {}] step {}, committed {}",
                bounds.min,
                bounds.max,
                bounds.step,
                stepper.committed_value()
            );
            Ok(())
        }
        Commands::Run {
            script,
            latency_ms,
            fail_value,
        } => {
            let steps = stepper_config::load_script_csv(&script)?;
            run::run_script(
                &cfg,
                &steps,
                run::Overrides {
                    latency_ms,
                    fail_values: fail_value,
                },
            )
        }
    }
}

fn load_config(path: &Path) -> eyre::Result<stepper_config::Config> {
    let text = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("read config {}", path.display()))?;
    let cfg = stepper_config::load_toml(&text)
        .map_err(|e| eyre::eyre!("parse config {}: {e}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Level precedence: `--log-level`, then `[logging].level`, then info.
fn effective_level<'a>(cli_level: Option<&'a str>, logging: &'a stepper_config::Logging) -> &'a str {
    cli_level.or(logging.level.as_deref()).unwrap_or("info")
}

/// Console logs go to stderr so stdout stays a clean JSONL stream.
/// `RUST_LOG` wins over both the flag and the config.
fn init_tracing(
    json: bool,
    cli_level: Option<&str>,
    logging: &stepper_config::Logging,
) -> eyre::Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let level = effective_level(cli_level, logging);
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .wrap_err_with(|| format!("invalid log level {level:?}"))?;

    let console_json = json.then(|| {
        fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_current_span(false)
    });
    let console_pretty = (!json).then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
    });

    let file_layer = match logging.file.as_deref() {
        Some(file) => {
            let path = Path::new(file);
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let name = path
                .file_name()
                .ok_or_else(|| eyre::eyre!("logging.file must name a file"))?;
            let appender = match logging.rotation.as_deref().unwrap_or("never") {
                "daily" => tracing_appender::rolling::daily(dir, name),
                "hourly" => tracing_appender::rolling::hourly(dir, name),
                _ => tracing_appender::rolling::never(dir, name),
            };
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let _ = FILE_GUARD.set(guard);
            Some(fmt::layer().json().with_ansi(false).with_writer(writer))
        }
        None => None,
    };

    // A second init (tests driving main twice) is harmless.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(console_json)
        .with(console_pretty)
        .with(file_layer)
        .try_init();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::effective_level;
    use stepper_config::Logging;

    #[test]
    fn flag_overrides_config_level() {
        let logging = Logging {
            level: Some("warn".into()),
            ..Logging::default()
        };
        assert_eq!(effective_level(Some("debug"), &logging), "debug");
        assert_eq!(effective_level(None, &logging), "warn");
        assert_eq!(effective_level(None, &Logging::default()), "info");
    }
}
