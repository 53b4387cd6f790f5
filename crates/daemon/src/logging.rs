// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process-wide tracing setup.
//!
//! Always logs to stderr. With a log directory, also appends to
//! `<log_dir>/thd.log` through a non-blocking writer. `RUST_LOG` overrides the
//! default `info` filter.

use std::path::Path;

use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::EnvFilter;

/// Daemon log file name inside the log directory
pub const LOG_FILE: &str = "thd.log";

const DEFAULT_FILTER: &str = "info";

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("failed to create log directory {path}: {source}")]
    Dir {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to install tracing subscriber: {0}")]
    Init(#[from] TryInitError),
}

/// Flushes the file writer when dropped; hold it for the process lifetime.
pub struct LoggingGuard {
    _file_guard: Option<WorkerGuard>,
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Create `log_dir` if needed and return the daemon log path inside it.
pub fn prepare_log_dir(log_dir: &Path) -> Result<std::path::PathBuf, LoggingError> {
    std::fs::create_dir_all(log_dir)
        .map_err(|source| LoggingError::Dir { path: log_dir.to_path_buf(), source })?;
    Ok(log_dir.join(LOG_FILE))
}

/// Install the global subscriber.
pub fn init(log_dir: Option<&Path>) -> Result<LoggingGuard, LoggingError> {
    let (file_layer, file_guard) = match log_dir {
        Some(dir) => {
            prepare_log_dir(dir)?;
            let appender = tracing_appender::rolling::never(dir, LOG_FILE);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    tracing_subscriber::registry().with(env_filter()).with(stderr_layer).with(file_layer).try_init()?;

    Ok(LoggingGuard { _file_guard: file_guard })
}

#[cfg(test)]
#[path = "logging_tests.rs"]
mod tests;
