//! Structured logging for the relay.
//!
//! The events worth watching in production:
//! - `full resync complete` (`removed`, `registered`) after startup and `/sync`
//! - `channels connected` / `channels disconnected` (`input`, `output`)
//! - `compensation failed ...` at `error`, with `key`, `cause` and
//!   `compensation`: live subscriptions and the store disagree until `/sync`
//! - `failed to relay message` / `relay handler failed` at `warn`, per edge `key`
//! - `command rejected` at `warn`, with the non-admin `caller`
//!
//! [`init_production`] writes them as JSON to a daily file and echoes them to
//! stderr; [`init_cli`] is stderr only, for `check`.

use std::path::Path;

use anyhow::Context;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// File name prefix of the rotated relay log.
pub const LOG_FILE_PREFIX: &str = "telerelay.log";

/// Keeps the non-blocking file writer alive; dropping it flushes the log.
pub struct LoggingGuard {
    _guard: WorkerGuard,
}

/// Directives used when `RUST_LOG` is unset. Teloxide's long-polling chatter
/// stays at `warn`.
pub const DEFAULT_DIRECTIVES: &str = "info,teloxide=warn";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES))
}

/// Initialise logging for `start`.
///
/// Writes JSON logs to `{logs_dir}/telerelay.log.YYYY-MM-DD` and
/// human-readable output to stderr, both filtered by `RUST_LOG`
/// (default [`DEFAULT_DIRECTIVES`]).
///
/// # Errors
///
/// Returns an error if the logs directory cannot be created.
pub fn init_production(logs_dir: &Path) -> anyhow::Result<LoggingGuard> {
    std::fs::create_dir_all(logs_dir)
        .with_context(|| format!("failed to create logs directory {}", logs_dir.display()))?;

    let file_appender = tracing_appender::rolling::daily(logs_dir, LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let json_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(non_blocking);
    let console_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(env_filter())
        .with(json_layer)
        .with(console_layer)
        .init();

    Ok(LoggingGuard { _guard: guard })
}

/// Initialise console-only logging for one-shot subcommands.
pub fn init_cli() {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .init();
}
