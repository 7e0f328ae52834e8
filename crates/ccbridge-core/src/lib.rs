//! ccbridge core - migration, reconciliation, backup and rollback of
//! contact-center configuration between a source and a target platform.
//!
//! Platform clients plug in through the [`SourceConnector`] and
//! [`TargetConnector`] traits; [`Engine`] exposes the operations.

pub mod backup;
pub mod config;
pub mod connector;
pub mod engine;
pub mod error;
pub mod mapping;
pub mod migration;
pub mod model;
pub mod reconcile;

pub use backup::{
    BackupManager, BackupManifest, BackupRequest, BackupStore, CheckStatus, Component,
    CompressionLevel, IntegrityChecks, MemoryBackupStore, RollbackRequest, RollbackRun,
    RollbackScope, RollbackStatus, SledBackupStore, StepStatus, ValidateRequest,
    ValidationReport,
};
pub use config::{EngineConfig, LockPolicy};
pub use connector::{
    ConnectorError, ConnectorErrorKind, ConnectorResult, MemorySource, MemoryTarget,
    SourceConnector, TargetConnector,
};
pub use engine::Engine;
pub use error::{Error, Result};
pub use migration::{
    CompareRequest, FlowArtifactOptions, ItemStatus, MigrateRequest, MigrationBatchResult,
    MigrationExecutor, MigrationItemResult,
};
pub use model::{Associations, EntityType, NewTargetEntity, SourceEntity, TargetEntity, TargetStatus};
pub use reconcile::{MatchResult, MatchStatus, Matcher};

/// Re-export of the cancellation token taken by every operation.
pub use tokio_util::sync::CancellationToken;
