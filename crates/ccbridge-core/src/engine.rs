//! Operation facade over the executor and the backup manager.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::instrument;

use crate::backup::{
    BackupManager, BackupManifest, BackupRequest, BackupStore, RollbackRequest, RollbackRun,
    ValidateRequest, ValidationReport,
};
use crate::config::EngineConfig;
use crate::connector::{SourceConnector, TargetConnector};
use crate::error::Result;
use crate::migration::{
    CompareRequest, LockRegistry, MigrateRequest, MigrationBatchResult, MigrationExecutor,
};
use crate::reconcile::MatchResult;

/// Migration, reconciliation, backup and rollback engine.
///
/// Every operation is one asynchronous unit of work. Migrate and rollback
/// calls share one advisory lock registry.
pub struct Engine {
    executor: MigrationExecutor,
    backups: BackupManager,
    config: EngineConfig,
}

impl Engine {
    /// Create an engine.
    pub fn new(
        source: Arc<dyn SourceConnector>,
        target: Arc<dyn TargetConnector>,
        store: Arc<dyn BackupStore>,
        config: EngineConfig,
    ) -> Self {
        let locks = LockRegistry::new();
        Self {
            executor: MigrationExecutor::new(
                source,
                target.clone(),
                locks.clone(),
                config.clone(),
            ),
            backups: BackupManager::new(target, store, locks, config.clone()),
            config,
        }
    }

    /// Engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Migrate one batch of entities.
    #[instrument(skip_all, fields(entity_type = %req.entity_type, dry_run = req.dry_run))]
    pub async fn migrate(
        &self,
        req: &MigrateRequest,
        cancel: &CancellationToken,
    ) -> Result<MigrationBatchResult> {
        self.executor.migrate(req, cancel).await
    }

    /// Reconcile source entities against the target.
    #[instrument(skip_all, fields(entity_type = %req.entity_type))]
    pub async fn compare(
        &self,
        req: &CompareRequest,
        cancel: &CancellationToken,
    ) -> Result<Vec<MatchResult>> {
        self.executor.compare(req, cancel).await
    }

    /// Back up target components.
    #[instrument(skip_all, fields(migration_id = %req.migration_id))]
    pub async fn create_backup(
        &self,
        req: &BackupRequest,
        cancel: &CancellationToken,
    ) -> Result<BackupManifest> {
        self.backups.create_backup(req, cancel).await
    }

    /// Check a stored backup.
    #[instrument(skip_all, fields(backup_id = %req.backup_id))]
    pub async fn validate_backup_integrity(
        &self,
        req: &ValidateRequest,
        cancel: &CancellationToken,
    ) -> Result<ValidationReport> {
        self.backups.validate_backup_integrity(req, cancel).await
    }

    /// Restore a backup.
    #[instrument(skip_all, fields(backup_id = %req.backup_id, dry_run = req.dry_run))]
    pub async fn rollback(
        &self,
        req: &RollbackRequest,
        cancel: &CancellationToken,
    ) -> Result<RollbackRun> {
        self.backups.rollback(req, cancel).await
    }

    /// Stored state of a rollback run.
    pub fn rollback_status(&self, rollback_id: &str) -> Result<RollbackRun> {
        self.backups.rollback_status(rollback_id)
    }

    /// Continue an interrupted or failed rollback.
    #[instrument(skip(self, cancel))]
    pub async fn resume_rollback(
        &self,
        rollback_id: &str,
        cancel: &CancellationToken,
    ) -> Result<RollbackRun> {
        self.backups.resume_rollback(rollback_id, cancel).await
    }
}
