//! Connector capability sets for the source and target platforms.
//!
//! The engine never talks HTTP itself. Platform clients implement these
//! traits; [`memory`] provides in-process implementations used for sandboxed
//! test restores, fixtures and tests.

pub mod call;
pub mod memory;

use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

use crate::migration::artifacts::ImportManifest;
use crate::model::{EntityType, NewTargetEntity, SourceEntity, TargetEntity};

pub use call::{CallError, CallGuard};
pub use memory::{MemorySource, MemoryTarget};

/// Failure category reported by a connector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectorErrorKind {
    /// Platform unreachable or the transport failed.
    Connectivity,
    /// Credentials rejected.
    Auth,
    /// The addressed entity does not exist.
    NotFound,
    /// The platform refused the request (validation, conflict, quota).
    Rejected,
}

impl fmt::Display for ConnectorErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectorErrorKind::Connectivity => write!(f, "connectivity"),
            ConnectorErrorKind::Auth => write!(f, "auth"),
            ConnectorErrorKind::NotFound => write!(f, "not found"),
            ConnectorErrorKind::Rejected => write!(f, "rejected"),
        }
    }
}

/// Error returned by connector calls.
#[derive(Debug, Clone, Error)]
#[error("{kind} error: {message}")]
pub struct ConnectorError {
    pub kind: ConnectorErrorKind,
    pub message: String,
}

impl ConnectorError {
    /// Create a connector error.
    pub fn new(kind: ConnectorErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Connectivity failure.
    pub fn connectivity(message: impl Into<String>) -> Self {
        Self::new(ConnectorErrorKind::Connectivity, message)
    }

    /// Missing entity.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ConnectorErrorKind::NotFound, message)
    }

    /// Request refused by the platform.
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::new(ConnectorErrorKind::Rejected, message)
    }
}

/// Result of a connector call.
pub type ConnectorResult<T> = Result<T, ConnectorError>;

/// Read access to the platform entities are migrated from.
#[async_trait]
pub trait SourceConnector: Send + Sync + 'static {
    /// List entities of one type, optionally restricted to the given ids.
    async fn list_entities(
        &self,
        entity_type: EntityType,
        org_ref: &str,
        id_filter: Option<&[String]>,
    ) -> ConnectorResult<Vec<SourceEntity>>;

    /// Skill names assigned to an entity.
    async fn get_entity_skills(&self, entity_id: &str) -> ConnectorResult<Vec<String>>;

    /// Queue ids the entity belongs to (or routes to, for flows).
    async fn get_entity_queues(&self, entity_id: &str) -> ConnectorResult<Vec<String>>;
}

/// Read/write access to the platform entities are migrated to.
#[async_trait]
pub trait TargetConnector: Send + Sync + 'static {
    /// List every entity of one type in an environment.
    async fn list_entities(
        &self,
        entity_type: EntityType,
        env_ref: &str,
    ) -> ConnectorResult<Vec<TargetEntity>>;

    /// Create an entity and return it with its assigned id.
    async fn create_entity(
        &self,
        entity_type: EntityType,
        env_ref: &str,
        entity: &NewTargetEntity,
    ) -> ConnectorResult<TargetEntity>;

    /// Write an entity back under its original id, replacing any current version.
    async fn restore_entity(
        &self,
        entity_type: EntityType,
        env_ref: &str,
        entity: &TargetEntity,
    ) -> ConnectorResult<TargetEntity>;

    /// Skill names assigned to an entity.
    async fn get_entity_skills(&self, entity_id: &str) -> ConnectorResult<Vec<String>>;

    /// Workstream ids the entity belongs to.
    async fn get_entity_workstreams(&self, entity_id: &str) -> ConnectorResult<Vec<String>>;

    /// Bulk import of flow artifacts. Returns `false` when the platform
    /// accepted the request but did not apply it.
    async fn import_batch(&self, env_ref: &str, manifest: &ImportManifest) -> ConnectorResult<bool>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connector_error_display() {
        let err = ConnectorError::not_found("user u9");
        assert_eq!(err.to_string(), "not found error: user u9");
        assert_eq!(err.kind, ConnectorErrorKind::NotFound);
    }
}
