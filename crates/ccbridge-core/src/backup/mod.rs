//! Backup and rollback of target environment configuration.
//!
//! # Backups
//!
//! A backup captures the selected components (Users, Queues, Flows, Bots) of
//! a target environment. The manifest records per-component counts and sizes,
//! md5/sha256 checksums of the snapshot and an expiry after which the backup
//! can no longer be rolled back.
//!
//! | Level | Reported ratio | gzip level |
//! |-------|----------------|------------|
//! | low | 0.8 | 1 |
//! | medium | 0.6 | 6 |
//! | high | 0.4 | 9 |
//!
//! # Rollback
//!
//! Steps run in the fixed order Users, Queues, Flows, Bots. A step with
//! unresolved references or rejected writes ends as `warning`; a step that
//! cannot list the current state ends as `failed` and the remaining steps are
//! skipped. Runs are persisted after every step and can be resumed.

pub mod integrity;
pub mod manager;
pub mod manifest;
pub mod rollback;
pub mod store;

pub use integrity::{
    CheckKind, CheckResult, CheckStatus, IntegrityChecks, ValidationReport, DO_NOT_USE,
};
pub use manager::{BackupManager, BackupRequest, RollbackRequest, ValidateRequest};
pub use manifest::{
    BackupManifest, Checksums, Component, ComponentSnapshot, ComponentStatus, ComponentSummary,
    CompressionLevel, Snapshot, SnapshotRecord,
};
pub use rollback::{RollbackRun, RollbackScope, RollbackStatus, RollbackStep, StepStatus};
pub use store::{BackupStore, MemoryBackupStore, SledBackupStore};
