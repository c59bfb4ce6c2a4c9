//! Tracing setup for the kiosk daemons.

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{fmt, EnvFilter};

/// Console output plus a daily rolling file `<log_dir>/<file_prefix>.<date>`.
///
/// Level comes from `RUST_LOG`, default `info`. Keep the returned guard
/// alive for the life of the process so buffered file output gets flushed.
/// Fails if a global subscriber is already installed.
pub fn init(log_dir: &Path, file_prefix: &str) -> Result<WorkerGuard, TryInitError> {
    let file_appender = tracing_appender::rolling::daily(log_dir, file_prefix);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer())
        .with(fmt::layer().with_writer(file_writer).with_ansi(false))
        .try_init()?;

    Ok(guard)
}
