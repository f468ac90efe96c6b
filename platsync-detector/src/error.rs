//! Error types for platsync-detector.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from layout resolution, application discovery, and make-file parsing.
#[derive(Debug, Error)]
pub enum DetectError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed make file. `line` is 1-based.
    #[error("failed to parse {path} at line {line}: {message}")]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("failed to parse application config {path}: {source}")]
    AppConfig {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// No explicit root and nothing to derive one from.
    #[error("cannot determine the local project root: {0}")]
    Configuration(String),
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> DetectError {
    DetectError::Io {
        path: path.into(),
        source,
    }
}
