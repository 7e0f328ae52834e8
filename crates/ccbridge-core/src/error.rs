//! Engine error types.

use thiserror::Error;

use crate::connector::ConnectorError;

/// Errors that stop a whole operation before (or instead of) producing a result.
///
/// Failures of individual entities inside a batch are never reported through
/// this type; they are recorded on the per-item result instead.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed or missing arguments. The operation did not start.
    #[error("validation error: {0}")]
    Validation(String),

    /// A requested backup, rollback run or entity does not exist.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// What was being looked up (e.g. "backup").
        kind: &'static str,
        /// The identifier that was not found.
        id: String,
    },

    /// Another migrate/rollback call holds the advisory lock for this key.
    #[error("operation already in progress: {0}")]
    InProgress(String),

    /// A connector call failed outside of a per-item context.
    #[error(transparent)]
    Connector(#[from] ConnectorError),

    /// The caller cancelled the operation before it could produce a result.
    #[error("operation cancelled")]
    Cancelled,

    /// Backup store error.
    #[error("storage error: {0}")]
    Storage(#[from] sled::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand for a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }

    /// Shorthand for a not-found error.
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Error::NotFound {
            kind,
            id: id.into(),
        }
    }
}

/// Result alias used throughout the engine.
pub type Result<T> = std::result::Result<T, Error>;
