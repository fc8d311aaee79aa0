//! Logging system configuration and initialization
//!
//! Console logging with `RUST_LOG`-style filtering, plus an optional
//! non-blocking daily-rolling file layer for long-running deployments.

use std::path::Path;
use std::sync::Mutex;

use anyhow::Result;
use lazy_static::lazy_static;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{
    EnvFilter, Registry, fmt, layer::SubscriberExt, util::SubscriberInitExt,
};

// Global guard slot keeping the non-blocking file writer alive.
lazy_static! {
    static ref LOG_GUARDS: Mutex<Vec<non_blocking::WorkerGuard>> = Mutex::new(Vec::new());
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initialize console-only logging. Returns an error if a global
/// subscriber was already installed.
pub fn init_logging() -> Result<()> {
    Registry::default()
        .with(env_filter())
        .with(fmt::layer().with_target(false))
        .try_init()?;
    Ok(())
}

/// Initialize console logging plus a daily-rolling log file under `log_dir`.
pub fn init_logging_with_file(log_dir: impl AsRef<Path>) -> Result<()> {
    let file_appender = rolling::daily(log_dir.as_ref(), "catalog-refinery.log");
    let (file_writer, guard) = non_blocking(file_appender);

    Registry::default()
        .with(env_filter())
        .with(fmt::layer().with_target(false))
        .with(fmt::layer().with_ansi(false).with_writer(file_writer))
        .try_init()?;

    if let Ok(mut guards) = LOG_GUARDS.lock() {
        guards.push(guard);
    }
    Ok(())
}
