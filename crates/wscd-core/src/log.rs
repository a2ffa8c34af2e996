use crate::error::{Error, Result};
use std::fs::OpenOptions;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

const DEFAULT_LOG_LEVEL: &str = "warn";

/// Builds the filter: explicit level first, then `RUST_LOG`, then `warn`.
fn build_filter(log_level: Option<&str>) -> Result<EnvFilter> {
    match log_level {
        Some(level) => EnvFilter::try_new(level).map_err(|e| Error::Tracing(e.to_string())),
        None => Ok(EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL))),
    }
}

/// Installs the global subscriber.
///
/// With a `log_file` output is appended to that file through a non-blocking
/// writer and the returned guard must be held until exit to flush it. Without
/// one, diagnostics go to stderr so stdout only ever carries resolved paths.
pub fn init_tracing(
    log_file: Option<&Path>,
    log_level: Option<&str>,
) -> Result<Option<WorkerGuard>> {
    let filter = build_filter(log_level)?;

    let Some(log_file) = log_file else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false)
                    .without_time(),
            )
            .try_init()
            .map_err(|e| Error::Tracing(e.to_string()))?;
        return Ok(None);
    };

    if let Some(parent) = log_file.parent() {
        std::fs::create_dir_all(parent).map_err(Error::CreateDir)?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .map_err(|source| Error::LogFileOpen {
            path: log_file.to_path_buf(),
            source,
        })?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);
    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .with_line_number(true),
        )
        .try_init()
        .map_err(|e| Error::Tracing(e.to_string()))?;

    tracing::debug!(path = %log_file.display(), "File logging initialized");
    Ok(Some(guard))
}

/// Routes panics through `tracing::error!` before the default hook runs.
pub fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let location = info
            .location()
            .map(|location| format!("{}:{}", location.file(), location.line()))
            .unwrap_or_default();
        let payload = info
            .payload()
            .downcast_ref::<&str>()
            .map(|s| (*s).to_owned())
            .or_else(|| info.payload().downcast_ref::<String>().cloned())
            .unwrap_or_default();

        tracing::error!(%location, %payload, "Panic");
        default_hook(info);
    }));
}
