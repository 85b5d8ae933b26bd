//! File logging for the TUI.
//!
//! The terminal belongs to ratatui, so all tracing output goes to a daily
//! rolling file under the user's data directory.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::daily;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub fn log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("docqa")
        .join("logs")
}

/// Initialize the tracing subscriber. `RUST_LOG` overrides `default_level`.
///
/// The returned guard must be kept alive for the duration of the program;
/// dropping it stops file logging.
pub fn init_tracing(default_level: &str) -> Result<WorkerGuard> {
    init_tracing_in(&log_dir(), default_level)
}

fn init_tracing_in(dir: &Path, default_level: &str) -> Result<WorkerGuard> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create log directory: {}", dir.display()))?;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    let file_appender = daily(dir, "docqa.log");
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false)
        .with_target(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(guard)
}
