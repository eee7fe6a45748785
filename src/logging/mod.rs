//! Tracing subscriber initialization.
//!
//! The library only emits `tracing` events; hosts that want them on disk call
//! [`init`] (or [`init_from_settings`]) once at startup. Logs go to a file,
//! never to the render surface.

use crate::config::LayoutSettings;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Filter used when neither `BOARDFIT_LOG` nor `RUST_LOG` is set.
pub const DEFAULT_FILTER: &str = "boardfit=info";

/// Crate-specific filter variable, checked before `RUST_LOG`.
pub const LOG_ENV: &str = "BOARDFIT_LOG";

/// Error type for logging initialization failures.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// Failed to create log directory
    #[error("Failed to create log directory at {path:?}: {source}")]
    DirectoryCreation {
        /// Directory that could not be created
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Path has no file name component
    #[error("Invalid log file path: {0:?}")]
    InvalidPath(PathBuf),

    /// Tracing subscriber already initialized
    #[error("Tracing subscriber already initialized")]
    SubscriberAlreadySet,
}

/// Split a log path into `(directory, file name)`, creating the directory.
fn prepare_log_file(log_path: &Path) -> Result<(PathBuf, String), LoggingError> {
    let file_name = log_path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| LoggingError::InvalidPath(log_path.to_path_buf()))?;
    let directory = match log_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&directory).map_err(|source| LoggingError::DirectoryCreation {
        path: directory.clone(),
        source,
    })?;
    Ok((directory, file_name.to_string()))
}

/// `BOARDFIT_LOG`, then `RUST_LOG`, then [`DEFAULT_FILTER`].
fn filter_from_env() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install a file-backed subscriber writing to `log_path`.
///
/// # Errors
/// Returns `LoggingError` if the path has no file name, the directory could
/// not be created, or a subscriber is already installed.
pub fn init(log_path: &Path) -> Result<(), LoggingError> {
    let (directory, file_name) = prepare_log_file(log_path)?;
    let appender = tracing_appender::rolling::never(directory, file_name);

    tracing_subscriber::fmt()
        .with_env_filter(filter_from_env())
        .with_writer(appender)
        .with_ansi(false)
        .with_target(true)
        .try_init()
        .map_err(|_| LoggingError::SubscriberAlreadySet)
}

/// [`init`] with the log path from resolved settings.
pub fn init_from_settings(settings: &LayoutSettings) -> Result<(), LoggingError> {
    init(&settings.log_file_path)
}
