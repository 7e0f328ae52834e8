//! CLI error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the `ccbridge` binary.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("unknown operation '{0}' (run `ccbridge operations` for the list)")]
    UnknownOperation(String),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to access {path}: {source}")]
    File {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Engine(#[from] ccbridge_core::Error),
}

impl CliError {
    pub fn file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CliError::File {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, CliError>;
