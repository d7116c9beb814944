//! Error types raised while starting a worker process.
//!
//! [`StartError`] covers every way a `start` request can fail before the
//! worker is attached. Failures after spawn (the worker crashing, a write to
//! its stdin failing) are not errors: they surface as lifecycle events.
//!
//! Like the rest of the crate's errors it provides `as_label` / `as_message`
//! helpers for logs and metrics.

use std::{io, path::PathBuf};
use thiserror::Error;

/// # Errors produced by a start request.
///
/// Every variant leaves the supervisor in `Stopped` with no process attached
/// and the stay-awake resource released.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum StartError {
    /// The configuration template could not be read.
    #[error("failed to read config template {path:?}: {source}")]
    ConfigRead {
        /// Template location.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The rendered configuration could not be written into the staging directory.
    #[error("failed to write config {path:?}: {source}")]
    ConfigWrite {
        /// Target file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The worker executable could not be launched (missing, not executable, ...).
    #[error("failed to spawn worker {program:?}: {source}")]
    Spawn {
        /// Program path as passed to the OS (`<staging_dir>/<executable>`).
        program: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The start request was superseded by `stop` or a newer `start`.
    #[error("start canceled")]
    Canceled,
}

impl StartError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use rigvisor::StartError;
    ///
    /// assert_eq!(StartError::Canceled.as_label(), "start_canceled");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            StartError::ConfigRead { .. } => "config_read",
            StartError::ConfigWrite { .. } => "config_write",
            StartError::Spawn { .. } => "spawn_failed",
            StartError::Canceled => "start_canceled",
        }
    }

    /// Returns a human-readable message, suitable for showing to a user.
    pub fn as_message(&self) -> String {
        match self {
            StartError::ConfigRead { source, .. } => {
                format!("cannot read config template: {source}")
            }
            StartError::ConfigWrite { source, .. } => format!("cannot write config: {source}"),
            StartError::Spawn { program, source } => format!("cannot start {program}: {source}"),
            StartError::Canceled => "start canceled".to_string(),
        }
    }

    /// True for a start that was superseded rather than failed.
    pub fn is_canceled(&self) -> bool {
        matches!(self, StartError::Canceled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_stable() {
        let err = StartError::Spawn {
            program: "./xmrig".into(),
            source: io::Error::from(io::ErrorKind::NotFound),
        };
        assert_eq!(err.as_label(), "spawn_failed");
        assert!(err.as_message().starts_with("cannot start ./xmrig"));
        assert!(!err.is_canceled());
        assert!(StartError::Canceled.is_canceled());
    }
}
