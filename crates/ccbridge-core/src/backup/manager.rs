//! Backup creation, integrity validation and rollback.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::integrity::{CheckKind, CheckResult, IntegrityChecks, ValidationReport};
use super::manifest::{
    compress, decompress, BackupManifest, BackupOrigin, Checksums, Component, ComponentSnapshot,
    ComponentSummary, CompressionLevel, Snapshot, SnapshotRecord,
};
use super::rollback::{RollbackRun, RollbackScope};
use super::store::BackupStore;
use crate::config::EngineConfig;
use crate::connector::{CallError, CallGuard, MemoryTarget, TargetConnector};
use crate::error::{Error, Result};
use crate::migration::lock::{LockGuard, LockKey, LockRegistry};
use crate::model::{Associations, EntityType};

/// Arguments of `create_backup`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupRequest {
    pub migration_id: String,
    pub source_org_ref: String,
    pub target_env_ref: String,
    pub components: Vec<String>,
    /// Defaults to the configured level.
    #[serde(default)]
    pub compression_level: Option<CompressionLevel>,
}

/// Arguments of `validate_backup_integrity`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateRequest {
    pub backup_id: String,
    pub migration_id: String,
    #[serde(default)]
    pub checks: IntegrityChecks,
}

/// Arguments of `rollback`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollbackRequest {
    /// Generated when absent.
    #[serde(default)]
    pub rollback_id: Option<String>,
    pub backup_id: String,
    pub target_env_ref: String,
    #[serde(default)]
    pub scope: RollbackScope,
    /// Required for partial scope; ignored for full scope.
    #[serde(default)]
    pub components: Vec<String>,
    #[serde(default)]
    pub dry_run: bool,
}

/// Creates backups of the target environment and restores them.
pub struct BackupManager {
    target: Arc<dyn TargetConnector>,
    store: Arc<dyn BackupStore>,
    locks: LockRegistry,
    config: EngineConfig,
}

impl BackupManager {
    /// Create a manager.
    pub fn new(
        target: Arc<dyn TargetConnector>,
        store: Arc<dyn BackupStore>,
        locks: LockRegistry,
        config: EngineConfig,
    ) -> Self {
        Self {
            target,
            store,
            locks,
            config,
        }
    }

    fn guard(&self, cancel: &CancellationToken) -> CallGuard {
        CallGuard::new(cancel.clone(), self.config.call_timeout)
    }

    /// Capture the selected components of the target environment.
    pub async fn create_backup(
        &self,
        req: &BackupRequest,
        cancel: &CancellationToken,
    ) -> Result<BackupManifest> {
        require("migrationId", &req.migration_id)?;
        require("targetEnvRef", &req.target_env_ref)?;
        if req.components.is_empty() {
            return Err(Error::validation("at least one component is required"));
        }
        let components = Component::ordered(&Component::parse_list(&req.components)?);
        let level = req
            .compression_level
            .unwrap_or(self.config.default_compression);
        let guard = self.guard(cancel);

        let mut captured = Vec::with_capacity(components.len());
        let mut summaries = Vec::with_capacity(components.len());
        for component in components {
            let snapshot = self
                .capture_component(component, &req.target_env_ref, &guard)
                .await?;
            summaries.push(ComponentSummary::new(
                component,
                snapshot.records.len(),
                snapshot.size_bytes()?,
            ));
            captured.push(snapshot);
        }

        let created_at = Utc::now();
        let snapshot = Snapshot {
            target_env_ref: req.target_env_ref.clone(),
            captured_at: created_at,
            components: captured,
        };
        let raw = snapshot.to_bytes()?;
        let checksums = Checksums::compute(&raw);
        let payload = compress(&raw, level)?;

        let manifest = BackupManifest::new(
            uuid::Uuid::new_v4().to_string(),
            BackupOrigin {
                migration_id: req.migration_id.clone(),
                source_org_ref: req.source_org_ref.clone(),
                target_env_ref: req.target_env_ref.clone(),
            },
            summaries,
            level,
            checksums,
            created_at,
            self.config.retention(),
        );
        self.store.save_backup(&manifest, &payload)?;

        info!(
            backup_id = %manifest.backup_id,
            migration_id = %manifest.migration_id,
            records = manifest.record_count(),
            original_bytes = manifest.original_size_bytes,
            stored_bytes = payload.len(),
            "Backup created"
        );

        Ok(manifest)
    }

    async fn capture_component(
        &self,
        component: Component,
        env_ref: &str,
        guard: &CallGuard,
    ) -> Result<ComponentSnapshot> {
        let entity_type = component.entity_type();
        let entities = guard
            .run(self.target.list_entities(entity_type, env_ref))
            .await?;

        let mut records = Vec::with_capacity(entities.len());
        for entity in entities {
            let associations = if entity_type.has_associations() {
                let skills = guard.run(self.target.get_entity_skills(&entity.id)).await?;
                let workstreams = guard
                    .run(self.target.get_entity_workstreams(&entity.id))
                    .await?;
                Associations::new(skills, workstreams)
            } else {
                Associations::default()
            };
            records.push(SnapshotRecord {
                entity,
                associations,
            });
        }

        debug!(component = %component, records = records.len(), "Captured component");
        Ok(ComponentSnapshot { component, records })
    }

    /// Run the selected integrity checks on a stored backup.
    ///
    /// Integrity problems are reported in the returned report, never as errors.
    pub async fn validate_backup_integrity(
        &self,
        req: &ValidateRequest,
        cancel: &CancellationToken,
    ) -> Result<ValidationReport> {
        if req.checks.is_empty() {
            return Err(Error::validation("at least one check must be selected"));
        }
        let manifest = self.load_manifest(&req.backup_id)?;
        if manifest.migration_id != req.migration_id {
            return Err(Error::validation(format!(
                "backup {} belongs to migration {}, not {}",
                manifest.backup_id, manifest.migration_id, req.migration_id
            )));
        }

        let decoded = self.decode_payload(&manifest.backup_id);

        let mut checks = Vec::new();
        if req.checks.checksum {
            checks.push(check_checksum(&manifest, &decoded));
        }
        let snapshot = decoded
            .as_ref()
            .ok()
            .and_then(|raw| Snapshot::from_bytes(raw).ok());
        if req.checks.structure {
            checks.push(check_structure(&manifest, snapshot.as_ref()));
        }
        if req.checks.test_restore {
            checks.push(self.check_test_restore(&manifest, snapshot.as_ref(), cancel).await?);
        }

        let report = ValidationReport::new(&manifest.backup_id, &manifest.migration_id, checks);
        if report.usable_for_rollback {
            info!(backup_id = %report.backup_id, status = %report.status, "Backup validated");
        } else {
            warn!(backup_id = %report.backup_id, "Backup failed validation");
        }
        Ok(report)
    }

    async fn check_test_restore(
        &self,
        manifest: &BackupManifest,
        snapshot: Option<&Snapshot>,
        cancel: &CancellationToken,
    ) -> Result<CheckResult> {
        let Some(snapshot) = snapshot else {
            return Ok(CheckResult::new(
                CheckKind::TestRestore,
                vec!["snapshot could not be decoded".to_string()],
                vec![],
            ));
        };

        // Writes go to the sandbox; references resolve against the live target.
        let sandbox = MemoryTarget::new();
        let guard = self.guard(cancel);
        let ctx = RestoreContext {
            target: &sandbox,
            references: self.target.as_ref(),
            env_ref: &manifest.target_env_ref,
            snapshot,
            guard: &guard,
        };
        let mut failures = Vec::new();
        let mut warnings = Vec::new();

        for component in Component::ordered(&manifest.component_names()) {
            match ctx.restore_component(component).await {
                Ok(outcome) => warnings.extend(outcome.issues),
                Err(CallError::Cancelled) => return Err(Error::Cancelled),
                Err(e) => failures.push(format!("{component}: {e}")),
            }
        }

        Ok(CheckResult::new(CheckKind::TestRestore, failures, warnings))
    }

    /// Restore a backup into the target environment.
    ///
    /// Expired backups are refused. The backup is not re-validated; call
    /// [`BackupManager::validate_backup_integrity`] first.
    pub async fn rollback(
        &self,
        req: &RollbackRequest,
        cancel: &CancellationToken,
    ) -> Result<RollbackRun> {
        require("backupId", &req.backup_id)?;
        require("targetEnvRef", &req.target_env_ref)?;

        let manifest = self.load_manifest(&req.backup_id)?;
        ensure_not_expired(&manifest)?;

        let components = match req.scope {
            RollbackScope::Full => manifest.component_names(),
            RollbackScope::Partial => {
                if req.components.is_empty() {
                    return Err(Error::validation(
                        "partial rollback requires at least one component",
                    ));
                }
                let requested = Component::parse_list(&req.components)?;
                if let Some(missing) = requested.iter().find(|c| manifest.component(**c).is_none()) {
                    return Err(Error::validation(format!(
                        "component {} is not part of backup {}",
                        missing, manifest.backup_id
                    )));
                }
                requested
            }
        };

        let rollback_id = match &req.rollback_id {
            Some(id) if !id.trim().is_empty() => id.clone(),
            _ => uuid::Uuid::new_v4().to_string(),
        };
        if self.store.load_run(&rollback_id)?.is_some() {
            return Err(Error::validation(format!(
                "rollback {rollback_id} already exists; resume it instead"
            )));
        }

        let _locks = if req.dry_run {
            Vec::new()
        } else {
            self.lock_components(
                &manifest.source_org_ref,
                &req.target_env_ref,
                &components,
                cancel,
            )
            .await?
        };

        let snapshot = self.load_snapshot(&manifest.backup_id)?;
        let mut run = RollbackRun::new(
            rollback_id,
            &manifest.backup_id,
            &manifest.migration_id,
            &req.target_env_ref,
            req.scope,
            &components,
            req.dry_run,
        );
        self.store.save_run(&run)?;

        info!(
            rollback_id = %run.rollback_id,
            backup_id = %run.backup_id,
            scope = %run.scope,
            dry_run = run.dry_run,
            "Starting rollback"
        );
        self.execute(&mut run, &snapshot, cancel).await?;
        Ok(run)
    }

    /// Load a stored rollback run.
    pub fn rollback_status(&self, rollback_id: &str) -> Result<RollbackRun> {
        self.store
            .load_run(rollback_id)?
            .ok_or_else(|| Error::not_found("rollback", rollback_id))
    }

    /// Re-run the steps of a rollback that did not complete.
    ///
    /// Completed and warning steps are kept as they are. A run with nothing
    /// left to do is returned unchanged.
    pub async fn resume_rollback(
        &self,
        rollback_id: &str,
        cancel: &CancellationToken,
    ) -> Result<RollbackRun> {
        let mut run = self.rollback_status(rollback_id)?;
        if !run.can_resume() {
            return Ok(run);
        }

        let manifest = self.load_manifest(&run.backup_id)?;
        ensure_not_expired(&manifest)?;

        let _locks = self
            .lock_components(
                &manifest.source_org_ref,
                &run.target_env_ref,
                &run.components(),
                cancel,
            )
            .await?;

        let snapshot = self.load_snapshot(&manifest.backup_id)?;
        info!(rollback_id = %run.rollback_id, "Resuming rollback");
        self.execute(&mut run, &snapshot, cancel).await?;
        Ok(run)
    }

    /// Take the migrate lock of every component's entity type.
    async fn lock_components(
        &self,
        source_ref: &str,
        target_env: &str,
        components: &[Component],
        cancel: &CancellationToken,
    ) -> Result<Vec<LockGuard>> {
        let keys = components
            .iter()
            .map(|c| LockKey::migration(source_ref, target_env, c.entity_type()));
        self.locks
            .acquire_all(keys, self.config.lock_policy, cancel)
            .await
    }

    /// Run every step that is not done, persisting after each transition.
    async fn execute(
        &self,
        run: &mut RollbackRun,
        snapshot: &Snapshot,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let guard = self.guard(cancel);
        let env_ref = run.target_env_ref.clone();
        let ctx = RestoreContext {
            target: self.target.as_ref(),
            references: self.target.as_ref(),
            env_ref: &env_ref,
            snapshot,
            guard: &guard,
        };
        run.start();
        self.store.save_run(run)?;

        let mut halted = false;
        for idx in 0..run.steps.len() {
            if run.steps[idx].status.is_done() {
                continue;
            }
            if halted {
                run.steps[idx].skip();
                self.store.save_run(run)?;
                continue;
            }

            let component = run.steps[idx].component;
            run.steps[idx].start();
            self.store.save_run(run)?;

            if run.dry_run {
                let records = component_records(snapshot, component);
                run.steps[idx].simulate(records.len(), Vec::new());
            } else {
                match ctx.restore_component(component).await {
                    Ok(outcome) => run.steps[idx].complete(outcome.restored, outcome.issues),
                    Err(e) => {
                        warn!(component = %component, error = %e, "Rollback step failed");
                        run.steps[idx].fail(e.to_string());
                        halted = true;
                    }
                }
            }

            debug!(component = %component, status = %run.steps[idx].status, "Rollback step finished");
            self.store.save_run(run)?;
        }

        run.finish();
        self.store.save_run(run)?;

        info!(
            rollback_id = %run.rollback_id,
            status = %run.status,
            steps = run.steps.len(),
            "Rollback finished"
        );
        Ok(())
    }

    fn load_manifest(&self, backup_id: &str) -> Result<BackupManifest> {
        self.store
            .load_manifest(backup_id)?
            .ok_or_else(|| Error::not_found("backup", backup_id))
    }

    fn decode_payload(&self, backup_id: &str) -> std::result::Result<Vec<u8>, String> {
        let payload = match self.store.load_payload(backup_id) {
            Ok(Some(payload)) => payload,
            Ok(None) => return Err("backup payload is missing".to_string()),
            Err(e) => return Err(format!("backup payload could not be read: {e}")),
        };
        decompress(&payload).map_err(|e| format!("backup payload could not be decompressed: {e}"))
    }

    fn load_snapshot(&self, backup_id: &str) -> Result<Snapshot> {
        let payload = self
            .store
            .load_payload(backup_id)?
            .ok_or_else(|| Error::not_found("backup payload", backup_id))?;
        Snapshot::from_bytes(&decompress(&payload)?)
    }
}

fn require(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::validation(format!("{field} is required")));
    }
    Ok(())
}

fn ensure_not_expired(manifest: &BackupManifest) -> Result<()> {
    if manifest.is_expired_at(Utc::now()) {
        return Err(Error::validation(format!(
            "backup {} expired at {}",
            manifest.backup_id,
            manifest.expires_at.to_rfc3339()
        )));
    }
    Ok(())
}

fn component_records(snapshot: &Snapshot, component: Component) -> &[SnapshotRecord] {
    snapshot
        .component(component)
        .map(|c| c.records.as_slice())
        .unwrap_or(&[])
}

fn check_checksum(
    manifest: &BackupManifest,
    decoded: &std::result::Result<Vec<u8>, String>,
) -> CheckResult {
    let raw = match decoded {
        Ok(raw) => raw,
        Err(reason) => return CheckResult::new(CheckKind::Checksum, vec![reason.clone()], vec![]),
    };

    let actual = Checksums::compute(raw);
    let mut failures = Vec::new();
    if actual.md5 != manifest.checksums.md5 {
        failures.push(format!(
            "md5 mismatch: expected {}, got {}",
            manifest.checksums.md5, actual.md5
        ));
    }
    if actual.sha256 != manifest.checksums.sha256 {
        failures.push(format!(
            "sha256 mismatch: expected {}, got {}",
            manifest.checksums.sha256, actual.sha256
        ));
    }
    CheckResult::new(CheckKind::Checksum, failures, vec![])
}

fn check_structure(manifest: &BackupManifest, snapshot: Option<&Snapshot>) -> CheckResult {
    let Some(snapshot) = snapshot else {
        return CheckResult::new(
            CheckKind::Structure,
            vec!["snapshot could not be decoded".to_string()],
            vec![],
        );
    };

    let mut failures = Vec::new();
    let mut warnings = Vec::new();

    for summary in &manifest.components {
        let Some(captured) = snapshot.component(summary.name) else {
            failures.push(format!("component {} is missing from the snapshot", summary.name));
            continue;
        };
        if captured.records.len() != summary.record_count {
            failures.push(format!(
                "component {} has {} records, manifest lists {}",
                summary.name,
                captured.records.len(),
                summary.record_count
            ));
        }

        let expected_type = summary.name.entity_type();
        let mistyped = captured
            .records
            .iter()
            .filter(|r| r.entity.entity_type != expected_type)
            .count();
        if mistyped > 0 {
            failures.push(format!(
                "component {} holds {} records of another entity type",
                summary.name, mistyped
            ));
        }

        let unnamed = captured
            .records
            .iter()
            .filter(|r| r.entity.name.trim().is_empty())
            .count();
        if unnamed > 0 {
            warnings.push(format!(
                "component {} has {} records without a name",
                summary.name, unnamed
            ));
        }
    }

    for captured in &snapshot.components {
        if manifest.component(captured.component).is_none() {
            warnings.push(format!(
                "snapshot holds component {} not listed in the manifest",
                captured.component
            ));
        }
    }

    CheckResult::new(CheckKind::Structure, failures, warnings)
}

/// What restoring one component produced.
struct RestoreOutcome {
    restored: usize,
    issues: Vec<String>,
}

/// Ids and names a restored record may reference.
#[derive(Default)]
struct ReferenceIndex {
    queue_ids: HashSet<String>,
    skill_names: HashSet<String>,
}

impl ReferenceIndex {
    async fn load(
        target: &dyn TargetConnector,
        env_ref: &str,
        snapshot: &Snapshot,
        guard: &CallGuard,
    ) -> std::result::Result<Self, CallError> {
        let mut index = Self::default();
        index.queue_ids.extend(
            component_records(snapshot, Component::Queues)
                .iter()
                .map(|r| r.entity.id.clone()),
        );
        index.queue_ids.extend(
            guard
                .run(target.list_entities(EntityType::Queue, env_ref))
                .await?
                .into_iter()
                .map(|q| q.id),
        );
        index.skill_names.extend(
            guard
                .run(target.list_entities(EntityType::Skill, env_ref))
                .await?
                .into_iter()
                .map(|s| s.name.to_lowercase()),
        );
        Ok(index)
    }

    fn unresolved(&self, record: &SnapshotRecord) -> Vec<String> {
        let label = format!(
            "{} '{}' ({})",
            record.entity.entity_type, record.entity.name, record.entity.id
        );
        let workstreams = record
            .associations
            .memberships
            .iter()
            .filter(|id| !self.queue_ids.contains(*id))
            .map(|id| format!("{label} references unknown workstream '{id}'"));
        let skills = record
            .associations
            .skills
            .iter()
            .filter(|name| !self.skill_names.contains(&name.to_lowercase()))
            .map(|name| format!("{label} references unknown skill '{name}'"));
        workstreams.chain(skills).collect()
    }
}

/// Where a restore writes and where it resolves references.
struct RestoreContext<'a> {
    target: &'a dyn TargetConnector,
    references: &'a dyn TargetConnector,
    env_ref: &'a str,
    snapshot: &'a Snapshot,
    guard: &'a CallGuard,
}

impl RestoreContext<'_> {
    /// Write the records of one component back to the target.
    ///
    /// Fails only when the current state cannot be listed or the call is
    /// cancelled. Unresolved references, rejected writes and entities created
    /// after the backup become issues. Those entities are left in place.
    async fn restore_component(
        &self,
        component: Component,
    ) -> std::result::Result<RestoreOutcome, CallError> {
        let entity_type = component.entity_type();
        let records = component_records(self.snapshot, component);
        let current = self
            .guard
            .run(self.target.list_entities(entity_type, self.env_ref))
            .await?;

        let needs_references = records.iter().any(|r| !r.associations.is_empty());
        let references = if needs_references {
            ReferenceIndex::load(self.references, self.env_ref, self.snapshot, self.guard).await?
        } else {
            ReferenceIndex::default()
        };

        let mut restored = 0;
        let mut issues = Vec::new();
        for record in records {
            issues.extend(references.unresolved(record));

            match self
                .guard
                .run(self.target.restore_entity(entity_type, self.env_ref, &record.entity))
                .await
            {
                Ok(_) => restored += 1,
                Err(CallError::Cancelled) => return Err(CallError::Cancelled),
                Err(e) => issues.push(format!(
                    "failed to restore {} '{}' ({}): {e}",
                    entity_type, record.entity.name, record.entity.id
                )),
            }
        }

        let backed_up: HashSet<&str> = records.iter().map(|r| r.entity.id.as_str()).collect();
        let added: Vec<_> = current
            .iter()
            .filter(|e| !backed_up.contains(e.id.as_str()))
            .collect();
        issues.extend(added.iter().map(|e| {
            format!(
                "{} '{}' ({}) was created after the backup and was not removed",
                entity_type, e.name, e.id
            )
        }));

        debug!(
            component = %component,
            existing = current.len(),
            added = added.len(),
            restored,
            issues = issues.len(),
            "Restored component"
        );
        Ok(RestoreOutcome { restored, issues })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backup::integrity::{CheckStatus, DO_NOT_USE};
    use crate::backup::rollback::{RollbackStatus, StepStatus};
    use crate::backup::store::MemoryBackupStore;
    use crate::model::{TargetEntity, TargetStatus};

    const ENV: &str = "env-1";

    fn entity(id: &str, entity_type: EntityType, name: &str) -> TargetEntity {
        TargetEntity {
            id: id.into(),
            entity_type,
            name: name.into(),
            email: None,
            description: None,
            status: TargetStatus::Active,
            source_type: None,
        }
    }

    fn fixture() -> (Arc<MemoryTarget>, Arc<MemoryBackupStore>, BackupManager) {
        let target = Arc::new(MemoryTarget::new());
        target.insert(ENV, entity("u-1", EntityType::User, "Jane"));
        target.insert(ENV, entity("q-1", EntityType::Queue, "Sales"));
        target.insert(ENV, entity("s-1", EntityType::Skill, "Billing"));
        target.set_associations(
            "u-1",
            Associations::new(vec!["billing".into()], vec!["q-1".into()]),
        );

        let store = Arc::new(MemoryBackupStore::new());
        let manager = BackupManager::new(
            target.clone(),
            store.clone(),
            LockRegistry::new(),
            EngineConfig::default(),
        );
        (target, store, manager)
    }

    fn backup_request(components: &[&str]) -> BackupRequest {
        BackupRequest {
            migration_id: "mig-1".into(),
            source_org_ref: "org-1".into(),
            target_env_ref: ENV.into(),
            components: components.iter().map(|c| c.to_string()).collect(),
            compression_level: None,
        }
    }

    fn rollback_request(backup_id: &str) -> RollbackRequest {
        RollbackRequest {
            rollback_id: None,
            backup_id: backup_id.into(),
            target_env_ref: ENV.into(),
            scope: RollbackScope::Full,
            components: vec![],
            dry_run: false,
        }
    }

    #[tokio::test]
    async fn test_empty_component_list_is_rejected() {
        let (_target, _store, manager) = fixture();
        let err = manager
            .create_backup(&backup_request(&[]), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[tokio::test]
    async fn test_create_backup_records_components() {
        let (_target, store, manager) = fixture();
        let manifest = manager
            .create_backup(&backup_request(&["queues", "Users"]), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(manifest.component_names(), vec![Component::Users, Component::Queues]);
        assert_eq!(manifest.record_count(), 2);
        assert_eq!(manifest.compression_level, CompressionLevel::Medium);
        assert_eq!(
            manifest.compressed_size_bytes,
            CompressionLevel::Medium.compressed_size(manifest.original_size_bytes)
        );
        assert!(store.load_payload(&manifest.backup_id).unwrap().is_some());
    }

    #[tokio::test]
    async fn test_validate_clean_backup() {
        let (_target, _store, manager) = fixture();
        let cancel = CancellationToken::new();
        let manifest = manager
            .create_backup(&backup_request(&["Users", "Queues"]), &cancel)
            .await
            .unwrap();

        let report = manager
            .validate_backup_integrity(
                &ValidateRequest {
                    backup_id: manifest.backup_id.clone(),
                    migration_id: "mig-1".into(),
                    checks: IntegrityChecks::default(),
                },
                &cancel,
            )
            .await
            .unwrap();

        assert_eq!(report.status, CheckStatus::Passed);
        assert!(report.usable_for_rollback);
        assert_eq!(report.checks.len(), 2);
    }

    #[tokio::test]
    async fn test_tampered_payload_fails_validation() {
        let (_target, store, manager) = fixture();
        let cancel = CancellationToken::new();
        let manifest = manager
            .create_backup(&backup_request(&["Users"]), &cancel)
            .await
            .unwrap();

        let other = Snapshot {
            target_env_ref: ENV.into(),
            captured_at: Utc::now(),
            components: vec![],
        };
        let payload = compress(&other.to_bytes().unwrap(), CompressionLevel::Low).unwrap();
        store.replace_payload(&manifest.backup_id, payload);

        let report = manager
            .validate_backup_integrity(
                &ValidateRequest {
                    backup_id: manifest.backup_id.clone(),
                    migration_id: "mig-1".into(),
                    checks: IntegrityChecks::all(),
                },
                &cancel,
            )
            .await
            .unwrap();

        assert_eq!(report.status, CheckStatus::Failed);
        assert!(!report.usable_for_rollback);
        assert_eq!(report.recommendation.as_deref(), Some(DO_NOT_USE));
        assert_eq!(report.check(CheckKind::Checksum).unwrap().status, CheckStatus::Failed);
        assert_eq!(report.check(CheckKind::Structure).unwrap().status, CheckStatus::Failed);
    }

    #[tokio::test]
    async fn test_validate_rejects_wrong_migration_and_unknown_backup() {
        let (_target, _store, manager) = fixture();
        let cancel = CancellationToken::new();
        let manifest = manager
            .create_backup(&backup_request(&["Users"]), &cancel)
            .await
            .unwrap();

        let err = manager
            .validate_backup_integrity(
                &ValidateRequest {
                    backup_id: manifest.backup_id.clone(),
                    migration_id: "other".into(),
                    checks: IntegrityChecks::default(),
                },
                &cancel,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        let err = manager
            .validate_backup_integrity(
                &ValidateRequest {
                    backup_id: "nope".into(),
                    migration_id: "mig-1".into(),
                    checks: IntegrityChecks::default(),
                },
                &cancel,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { kind: "backup", .. }));
    }

    #[tokio::test]
    async fn test_rollback_restores_changed_entities() {
        let (target, _store, manager) = fixture();
        let cancel = CancellationToken::new();
        let manifest = manager
            .create_backup(&backup_request(&["Users", "Queues"]), &cancel)
            .await
            .unwrap();

        // Drift after the backup.
        target
            .restore_entity(EntityType::Queue, ENV, &entity("q-1", EntityType::Queue, "Renamed"))
            .await
            .unwrap();

        let run = manager
            .rollback(&rollback_request(&manifest.backup_id), &cancel)
            .await
            .unwrap();

        assert_eq!(run.status, RollbackStatus::Completed);
        assert_eq!(run.components(), vec![Component::Users, Component::Queues]);
        assert!(run.steps.iter().all(|s| s.records_processed == 1));
        let queue = target
            .entities(ENV)
            .into_iter()
            .find(|e| e.id == "q-1")
            .unwrap();
        assert_eq!(queue.name, "Sales");
        assert_eq!(manager.rollback_status(&run.rollback_id).unwrap(), run);
    }

    #[tokio::test]
    async fn test_unresolved_references_are_step_warnings() {
        let (target, _store, manager) = fixture();
        let cancel = CancellationToken::new();
        target.set_associations(
            "u-1",
            Associations::new(vec!["french".into()], vec!["ws-gone".into()]),
        );
        let manifest = manager
            .create_backup(&backup_request(&["Users"]), &cancel)
            .await
            .unwrap();

        let run = manager
            .rollback(&rollback_request(&manifest.backup_id), &cancel)
            .await
            .unwrap();

        let step = &run.steps[0];
        assert_eq!(step.status, StepStatus::Warning);
        assert_eq!(step.records_processed, 1);
        assert_eq!(step.issues.len(), 2);
        assert!(step.issues[0].contains("workstream 'ws-gone'"));
        assert!(step.issues[1].contains("skill 'french'"));
        assert_eq!(run.status, RollbackStatus::CompletedWithWarnings);
    }

    #[tokio::test]
    async fn test_test_restore_resolves_references_on_live_target() {
        let (target, _store, manager) = fixture();
        let cancel = CancellationToken::new();
        // Skill "Billing" and queue q-1 live only on the target, not in the backup.
        let manifest = manager
            .create_backup(&backup_request(&["Users"]), &cancel)
            .await
            .unwrap();

        let report = manager
            .validate_backup_integrity(
                &ValidateRequest {
                    backup_id: manifest.backup_id.clone(),
                    migration_id: "mig-1".into(),
                    checks: IntegrityChecks::all(),
                },
                &cancel,
            )
            .await
            .unwrap();

        let restore = report.check(CheckKind::TestRestore).unwrap();
        assert_eq!(restore.status, CheckStatus::Passed, "{restore:?}");
        assert_eq!(report.status, CheckStatus::Passed);
        assert_eq!(target.restore_count(), 0);
    }

    #[tokio::test]
    async fn test_entities_created_after_backup_are_reported() {
        let (target, _store, manager) = fixture();
        let cancel = CancellationToken::new();
        let manifest = manager
            .create_backup(&backup_request(&["Users"]), &cancel)
            .await
            .unwrap();

        target.insert(ENV, entity("u-2", EntityType::User, "Late"));

        let run = manager
            .rollback(&rollback_request(&manifest.backup_id), &cancel)
            .await
            .unwrap();

        let step = &run.steps[0];
        assert_eq!(step.status, StepStatus::Warning);
        assert_eq!(step.records_processed, 1);
        assert_eq!(
            step.issues,
            vec!["user 'Late' (u-2) was created after the backup and was not removed".to_string()]
        );
        assert_eq!(run.status, RollbackStatus::CompletedWithWarnings);
        assert!(target.entities(ENV).iter().any(|e| e.id == "u-2"));
    }

    #[tokio::test]
    async fn test_partial_rollback_requires_known_components() {
        let (_target, _store, manager) = fixture();
        let cancel = CancellationToken::new();
        let manifest = manager
            .create_backup(&backup_request(&["Users"]), &cancel)
            .await
            .unwrap();

        let mut req = rollback_request(&manifest.backup_id);
        req.scope = RollbackScope::Partial;
        let err = manager.rollback(&req, &cancel).await.unwrap_err();
        assert!(err.to_string().contains("at least one component"));

        req.components = vec!["Flows".into()];
        let err = manager.rollback(&req, &cancel).await.unwrap_err();
        assert!(err.to_string().contains("Flows"));
    }

    #[tokio::test]
    async fn test_expired_backup_is_refused() {
        let target = Arc::new(MemoryTarget::new());
        let manager = BackupManager::new(
            target,
            Arc::new(MemoryBackupStore::new()),
            LockRegistry::new(),
            EngineConfig::default().with_backup_retention(std::time::Duration::ZERO),
        );
        let cancel = CancellationToken::new();
        let manifest = manager
            .create_backup(&backup_request(&["Users"]), &cancel)
            .await
            .unwrap();

        let err = manager
            .rollback(&rollback_request(&manifest.backup_id), &cancel)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("expired"));
    }

    #[tokio::test]
    async fn test_dry_run_rollback_writes_nothing() {
        let (target, _store, manager) = fixture();
        let cancel = CancellationToken::new();
        let manifest = manager
            .create_backup(&backup_request(&["Users", "Queues"]), &cancel)
            .await
            .unwrap();

        let mut req = rollback_request(&manifest.backup_id);
        req.dry_run = true;
        let run = manager.rollback(&req, &cancel).await.unwrap();

        assert_eq!(run.status, RollbackStatus::DryRunCompleted);
        assert!(run.steps.iter().all(|s| s.status == StepStatus::Simulated));
        assert_eq!(target.restore_count(), 0);
    }

    #[tokio::test]
    async fn test_rollback_id_cannot_be_reused() {
        let (_target, _store, manager) = fixture();
        let cancel = CancellationToken::new();
        let manifest = manager
            .create_backup(&backup_request(&["Users"]), &cancel)
            .await
            .unwrap();

        let mut req = rollback_request(&manifest.backup_id);
        req.rollback_id = Some("rb-1".into());
        manager.rollback(&req, &cancel).await.unwrap();

        let err = manager.rollback(&req, &cancel).await.unwrap_err();
        assert!(err.to_string().contains("resume"));

        // Nothing left to resume.
        let run = manager.resume_rollback("rb-1", &cancel).await.unwrap();
        assert_eq!(run.status, RollbackStatus::Completed);
    }
}
