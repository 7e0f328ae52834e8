//! Migration executor.
//!
//! Processes one batch sequentially in source fetch order. Whole-operation
//! problems (bad arguments, source listing failure) are returned as errors
//! before any item is touched; everything that goes wrong for a single item
//! is recorded on that item and the loop moves on.

use std::sync::Arc;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::artifacts::build_manifest;
use super::lock::{LockKey, LockRegistry};
use super::request::{apply_filter, CompareRequest, MigrateRequest};
use super::result::{ItemStatus, MigrationBatchResult, MigrationItemResult};
use crate::config::EngineConfig;
use crate::connector::{CallError, CallGuard, ConnectorError, SourceConnector, TargetConnector};
use crate::error::Result;
use crate::mapping::{is_state_mapped, is_type_mapped, map_entity};
use crate::model::{Associations, EntityType, SourceEntity, TargetEntity};
use crate::reconcile::{AssociationPair, MatchResult, MatchStatus, Matcher};

/// Target entity set fetched once per batch.
#[derive(Debug)]
enum TargetCache {
    Unfetched,
    Loaded(Vec<TargetEntity>),
    Failed(String),
}

impl TargetCache {
    fn entities(&self) -> std::result::Result<&[TargetEntity], String> {
        match self {
            TargetCache::Loaded(entities) => Ok(entities),
            TargetCache::Failed(reason) => Err(reason.clone()),
            TargetCache::Unfetched => Err("target entities were not loaded".to_string()),
        }
    }

    fn push(&mut self, entity: TargetEntity) {
        if let TargetCache::Loaded(entities) = self {
            entities.push(entity);
        }
    }
}

/// A dry-run entity has no target id yet.
fn is_planned(entity: &TargetEntity) -> bool {
    entity.id.is_empty()
}

/// What processing one item produced.
struct ItemOutcome {
    item: MigrationItemResult,
    created: Option<TargetEntity>,
    cancelled: bool,
}

impl ItemOutcome {
    fn done(item: MigrationItemResult) -> Self {
        Self {
            item,
            created: None,
            cancelled: false,
        }
    }

    fn cancelled(entity: &SourceEntity) -> Self {
        Self {
            item: MigrationItemResult::failed(&entity.id, &entity.name, CallError::Cancelled.to_string()),
            created: None,
            cancelled: true,
        }
    }
}

/// Runs migrate and compare batches against a source and target connector.
pub struct MigrationExecutor {
    source: Arc<dyn SourceConnector>,
    target: Arc<dyn TargetConnector>,
    locks: LockRegistry,
    config: EngineConfig,
}

impl MigrationExecutor {
    /// Create an executor.
    pub fn new(
        source: Arc<dyn SourceConnector>,
        target: Arc<dyn TargetConnector>,
        locks: LockRegistry,
        config: EngineConfig,
    ) -> Self {
        Self {
            source,
            target,
            locks,
            config,
        }
    }

    fn guard(&self, cancel: &CancellationToken) -> CallGuard {
        CallGuard::new(cancel.clone(), self.config.call_timeout)
    }

    /// Migrate one batch of entities.
    ///
    /// Holds the advisory lock for `(source org, target env, entity type)`
    /// for the whole call. When `cancel` fires the in-flight item is marked
    /// failed and the partial batch is returned with `cancelled` set.
    pub async fn migrate(
        &self,
        req: &MigrateRequest,
        cancel: &CancellationToken,
    ) -> Result<MigrationBatchResult> {
        req.validate()?;

        let _lock = self
            .locks
            .acquire(
                LockKey::migration(&req.source_org_ref, &req.target_env_ref, req.entity_type),
                self.config.lock_policy,
                cancel,
            )
            .await?;

        let guard = self.guard(cancel);
        let started_at = Utc::now();
        let migration_id = uuid::Uuid::new_v4().to_string();

        let fetched = guard
            .run(
                self.source
                    .list_entities(req.entity_type, &req.source_org_ref, req.filter()),
            )
            .await?;
        let entities = apply_filter(fetched, req.filter());

        info!(
            migration_id = %migration_id,
            entity_type = %req.entity_type,
            items = entities.len(),
            dry_run = req.dry_run,
            "Starting migration batch"
        );

        let mut cache = TargetCache::Unfetched;
        let mut items = Vec::with_capacity(entities.len());
        let mut cancelled = false;

        for entity in &entities {
            if guard.is_cancelled() {
                cancelled = true;
                break;
            }

            if matches!(cache, TargetCache::Unfetched) {
                match guard
                    .run(self.target.list_entities(req.entity_type, &req.target_env_ref))
                    .await
                {
                    Ok(list) => cache = TargetCache::Loaded(list),
                    Err(CallError::Cancelled) => {
                        items.push(ItemOutcome::cancelled(entity).item);
                        cancelled = true;
                        break;
                    }
                    Err(e) => {
                        warn!(error = %e, env = %req.target_env_ref, "Failed to list target entities");
                        cache = TargetCache::Failed(format!("failed to list target entities: {e}"));
                    }
                }
            }

            let candidate = match cache.entities() {
                Ok(targets) => Matcher::find_candidate(entity, targets).cloned(),
                Err(reason) => {
                    items.push(MigrationItemResult::failed(&entity.id, &entity.name, reason));
                    continue;
                }
            };

            let outcome = self.process_item(entity, candidate, req, &guard).await;
            debug!(
                source_id = %entity.id,
                status = %outcome.item.status,
                "Processed migration item"
            );
            if outcome.item.status == ItemStatus::Failed && !outcome.cancelled {
                warn!(
                    source_id = %entity.id,
                    reason = outcome.item.warnings.last().map(String::as_str).unwrap_or(""),
                    "Migration item failed"
                );
            }

            if let Some(created) = outcome.created {
                cache.push(created);
            }
            items.push(outcome.item);

            if outcome.cancelled {
                cancelled = true;
                break;
            }
        }

        let result = MigrationBatchResult::new(
            migration_id,
            req.entity_type,
            items,
            req.dry_run,
            cancelled,
            started_at,
        );

        info!(
            migration_id = %result.migration_id,
            entity_type = %result.entity_type,
            total = result.total_items,
            successful = result.summary.successful,
            failed = result.summary.failed,
            cancelled = result.cancelled,
            "Migration batch complete"
        );

        Ok(result)
    }

    async fn process_item(
        &self,
        entity: &SourceEntity,
        candidate: Option<TargetEntity>,
        req: &MigrateRequest,
        guard: &CallGuard,
    ) -> ItemOutcome {
        if let Some(existing) = candidate {
            if is_planned(&existing) {
                return ItemOutcome::done(MigrationItemResult::planned_duplicate(
                    &entity.id,
                    &entity.name,
                    &existing.name,
                ));
            }

            let mut item = MigrationItemResult::duplicate(
                &entity.id,
                &entity.name,
                &existing.id,
                &existing.name,
            );

            let associations = if req.include_associations && entity.entity_type.has_associations() {
                match self.fetch_associations(entity, &existing, guard).await {
                    Ok(pair) => Some(pair),
                    Err(CallError::Cancelled) => {
                        // The duplicate decision is already final.
                        return ItemOutcome {
                            item,
                            created: None,
                            cancelled: true,
                        };
                    }
                    Err(e) => {
                        item.warnings.push(format!("could not compare associations: {e}"));
                        None
                    }
                }
            } else {
                None
            };

            let evaluation = Matcher::evaluate(entity, Some(&existing), associations.as_ref());
            if evaluation.status != MatchStatus::Identical {
                let details: Vec<String> =
                    evaluation.differences.iter().map(ToString::to_string).collect();
                item.warnings.push(format!(
                    "existing entity differs ({}% match): {}",
                    evaluation.match_percentage,
                    details.join("; ")
                ));
            }

            return ItemOutcome::done(item);
        }

        let mapping_warnings = mapping_warnings(entity);

        let mapped = map_entity(entity);

        if req.dry_run {
            let mut item = MigrationItemResult::simulated(&entity.id, &entity.name);
            item.warnings.extend(mapping_warnings);
            // Later items of the batch must still see this one as taken.
            return ItemOutcome {
                item,
                created: Some(TargetEntity::from_new(String::new(), mapped)),
                cancelled: false,
            };
        }

        let created = match guard
            .run(
                self.target
                    .create_entity(req.entity_type, &req.target_env_ref, &mapped),
            )
            .await
        {
            Ok(created) => created,
            Err(CallError::Cancelled) => return ItemOutcome::cancelled(entity),
            Err(e) => {
                let mut item = MigrationItemResult::failed(&entity.id, &entity.name, e.to_string());
                item.warnings.extend(mapping_warnings);
                return ItemOutcome::done(item);
            }
        };

        let mut item = MigrationItemResult::migrated(&entity.id, &entity.name, &created.id);
        item.warnings.extend(mapping_warnings);

        let mut cancelled = false;
        if entity.entity_type == EntityType::Flow && !req.flow_artifacts.is_none() {
            if let Err(e) = self.import_flow_artifacts(entity, &created, req, guard).await {
                cancelled = e.is_cancelled();
                item.warnings.push(format!("flow artifacts not imported: {e}"));
            }
        }

        ItemOutcome {
            item,
            created: Some(created),
            cancelled,
        }
    }

    async fn import_flow_artifacts(
        &self,
        flow: &SourceEntity,
        created: &TargetEntity,
        req: &MigrateRequest,
        guard: &CallGuard,
    ) -> std::result::Result<(), CallError> {
        let queues = if req.flow_artifacts.include_routing_rules {
            guard.run(self.source.get_entity_queues(&flow.id)).await?
        } else {
            Vec::new()
        };

        let Some(manifest) = build_manifest(flow, &created.id, &queues, req.flow_artifacts) else {
            return Ok(());
        };

        let applied = guard
            .run(self.target.import_batch(&req.target_env_ref, &manifest))
            .await?;
        if !applied {
            return Err(CallError::Connector(
                ConnectorError::rejected("import batch was not applied"),
            ));
        }

        debug!(
            flow_id = %created.id,
            artifacts = manifest.len(),
            "Imported flow artifacts"
        );
        Ok(())
    }

    async fn fetch_associations(
        &self,
        source: &SourceEntity,
        target: &TargetEntity,
        guard: &CallGuard,
    ) -> std::result::Result<AssociationPair, CallError> {
        let source_skills = guard.run(self.source.get_entity_skills(&source.id)).await?;
        let source_queues = guard.run(self.source.get_entity_queues(&source.id)).await?;
        let target_skills = guard.run(self.target.get_entity_skills(&target.id)).await?;
        let target_workstreams = guard
            .run(self.target.get_entity_workstreams(&target.id))
            .await?;

        Ok(AssociationPair {
            source: Associations::new(source_skills, source_queues),
            target: Associations::new(target_skills, target_workstreams),
        })
    }

    /// Reconcile source entities against the target without mutating anything.
    pub async fn compare(
        &self,
        req: &CompareRequest,
        cancel: &CancellationToken,
    ) -> Result<Vec<MatchResult>> {
        req.validate()?;
        let guard = self.guard(cancel);

        let fetched = guard
            .run(
                self.source
                    .list_entities(req.entity_type, &req.source_org_ref, req.filter()),
            )
            .await?;
        let entities = apply_filter(fetched, req.filter());
        let targets = guard
            .run(self.target.list_entities(req.entity_type, &req.target_env_ref))
            .await?;

        let mut results = Vec::with_capacity(entities.len());
        for entity in &entities {
            let candidate = Matcher::find_candidate(entity, &targets);
            let associations = match candidate {
                Some(existing)
                    if req.include_associations && entity.entity_type.has_associations() =>
                {
                    Some(self.fetch_associations(entity, existing, &guard).await?)
                }
                _ => None,
            };

            let result = Matcher::evaluate(entity, candidate, associations.as_ref());
            if req.show_only_differences && result.status == MatchStatus::Identical {
                continue;
            }
            results.push(result);
        }

        info!(
            entity_type = %req.entity_type,
            compared = entities.len(),
            reported = results.len(),
            "Comparison complete"
        );

        Ok(results)
    }
}

/// Warnings for source values the field mapper has no target equivalent for.
fn mapping_warnings(entity: &SourceEntity) -> Vec<String> {
    let mut warnings = Vec::new();
    if entity.entity_type == EntityType::Flow {
        if let Some(flow_type) = entity.flow_type.as_deref() {
            if !is_type_mapped(flow_type) {
                warnings.push(format!(
                    "flow type '{flow_type}' has no target equivalent; mapped to unknown"
                ));
            }
        }
    }
    if !entity.state.is_empty() && !is_state_mapped(&entity.state) {
        warnings.push(format!(
            "state '{}' has no target equivalent; mapped to unknown",
            entity.state
        ));
    }
    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LockPolicy;
    use crate::connector::{MemorySource, MemoryTarget};
    use crate::migration::artifacts::FlowArtifactOptions;
    use crate::model::TargetStatus;

    const ORG: &str = "org-1";
    const ENV: &str = "env-1";

    fn fixture() -> (Arc<MemorySource>, Arc<MemoryTarget>, MigrationExecutor) {
        let source = Arc::new(MemorySource::new());
        let target = Arc::new(MemoryTarget::new());
        let executor = MigrationExecutor::new(
            source.clone(),
            target.clone(),
            LockRegistry::new(),
            EngineConfig::default(),
        );
        (source, target, executor)
    }

    fn queue(id: &str, name: &str) -> SourceEntity {
        SourceEntity::new(id, EntityType::Queue, name)
    }

    #[tokio::test]
    async fn test_migrate_creates_missing_entities() {
        let (source, target, executor) = fixture();
        source.insert(ORG, queue("q1", "Sales"));
        source.insert(ORG, queue("q2", "Support"));

        let req = MigrateRequest::new(EntityType::Queue, ORG, ENV);
        let result = executor.migrate(&req, &CancellationToken::new()).await.unwrap();

        assert_eq!(result.total_items, 2);
        assert_eq!(result.summary.successful, 2);
        assert!(result.items.iter().all(|i| i.status == ItemStatus::Migrated));
        assert!(result.items.iter().all(|i| i.target_id.is_some()));
        assert_eq!(target.entities(ENV).len(), 2);
    }

    #[tokio::test]
    async fn test_existing_entity_is_skipped() {
        let (source, target, executor) = fixture();
        source.insert(ORG, queue("q1", "Sales"));
        target.insert(
            ENV,
            TargetEntity {
                id: "t-1".into(),
                entity_type: EntityType::Queue,
                name: "SALES".into(),
                email: None,
                description: None,
                status: TargetStatus::Active,
                source_type: None,
            },
        );

        let req = MigrateRequest::new(EntityType::Queue, ORG, ENV);
        let result = executor.migrate(&req, &CancellationToken::new()).await.unwrap();

        let item = &result.items[0];
        assert_eq!(item.status, ItemStatus::SkippedDuplicate);
        assert!(item.target_id.is_none());
        assert_eq!(item.matched_target_id.as_deref(), Some("t-1"));
        assert_eq!(target.create_count(), 0);
    }

    #[tokio::test]
    async fn test_same_name_twice_in_one_batch_is_created_once() {
        let (source, target, executor) = fixture();
        source.insert(ORG, queue("q1", "Sales"));
        source.insert(ORG, queue("q2", "sales"));

        let req = MigrateRequest::new(EntityType::Queue, ORG, ENV);
        let result = executor.migrate(&req, &CancellationToken::new()).await.unwrap();

        assert_eq!(result.items[0].status, ItemStatus::Migrated);
        assert_eq!(result.items[1].status, ItemStatus::SkippedDuplicate);
        assert!(result.items[1].target_id.is_none());
        assert_eq!(
            result.items[1].matched_target_id,
            result.items[0].target_id
        );
        assert_eq!(target.create_count(), 1);
    }

    #[tokio::test]
    async fn test_dry_run_simulates() {
        let (source, target, executor) = fixture();
        source.insert(ORG, queue("q1", "Sales"));

        let req = MigrateRequest::new(EntityType::Queue, ORG, ENV).dry_run();
        let result = executor.migrate(&req, &CancellationToken::new()).await.unwrap();

        assert!(result.dry_run);
        assert_eq!(result.items[0].status, ItemStatus::Simulated);
        assert!(result.items[0].target_id.is_none());
        assert_eq!(target.mutation_count(), 0);
    }

    #[tokio::test]
    async fn test_dry_run_predicts_in_batch_duplicates() {
        let (source, target, executor) = fixture();
        source.insert(ORG, queue("q1", "Sales"));
        source.insert(ORG, queue("q2", "sales"));

        let req = MigrateRequest::new(EntityType::Queue, ORG, ENV).dry_run();
        let result = executor.migrate(&req, &CancellationToken::new()).await.unwrap();

        assert_eq!(result.items[0].status, ItemStatus::Simulated);
        assert_eq!(result.items[1].status, ItemStatus::SkippedDuplicate);
        assert!(result.items[1].matched_target_id.is_none());
        assert!(result.items[1].warnings[0].contains("'Sales' already simulated"));
        assert_eq!(result.summary.successful, 1);
        assert_eq!(target.mutation_count(), 0);
    }

    #[tokio::test]
    async fn test_id_filter_drops_unknown_ids() {
        let (source, _target, executor) = fixture();
        source.insert(ORG, queue("q1", "Sales"));
        source.insert(ORG, queue("q2", "Support"));

        let req = MigrateRequest::new(EntityType::Queue, ORG, ENV).with_id_filter(["q2", "nope"]);
        let result = executor.migrate(&req, &CancellationToken::new()).await.unwrap();

        assert_eq!(result.total_items, 1);
        assert_eq!(result.items[0].source_id, "q2");
    }

    #[tokio::test]
    async fn test_rejected_create_fails_only_that_item() {
        let (source, _target, executor) = fixture();
        source.insert(ORG, queue("q1", "Sales"));
        source.insert(ORG, queue("q2", " "));
        source.insert(ORG, queue("q3", "Support"));

        let req = MigrateRequest::new(EntityType::Queue, ORG, ENV);
        let result = executor.migrate(&req, &CancellationToken::new()).await.unwrap();

        assert_eq!(result.total_items, 3);
        assert_eq!(result.items[1].status, ItemStatus::Failed);
        assert!(result.items[1].target_id.is_none());
        assert!(result.items[1].warnings[0].contains("name must not be empty"));
        assert_eq!(result.summary.successful, 2);
        assert_eq!(result.summary.failed, 1);
    }

    #[tokio::test]
    async fn test_unmapped_state_is_a_warning() {
        let (source, _target, executor) = fixture();
        source.insert(ORG, queue("q1", "Sales").with_state("paused"));

        let req = MigrateRequest::new(EntityType::Queue, ORG, ENV);
        let result = executor.migrate(&req, &CancellationToken::new()).await.unwrap();

        assert_eq!(result.items[0].status, ItemStatus::Migrated);
        assert!(result.items[0].warnings[0].contains("'paused'"));
    }

    #[tokio::test]
    async fn test_flow_artifacts_are_imported() {
        let (source, target, executor) = fixture();
        source.insert(
            ORG,
            SourceEntity::new("f1", EntityType::Flow, "Main IVR")
                .with_flow_type("inbound")
                .with_variable("customerId"),
        );
        source.set_associations("f1", Associations::new(vec![], vec!["q-sales".into()]));

        let req = MigrateRequest::new(EntityType::Flow, ORG, ENV)
            .with_flow_artifacts(FlowArtifactOptions::all());
        let result = executor.migrate(&req, &CancellationToken::new()).await.unwrap();

        let item = &result.items[0];
        assert_eq!(item.status, ItemStatus::Migrated);
        assert!(item.warnings.is_empty());

        let imports = target.imports();
        assert_eq!(imports.len(), 1);
        let manifest = &imports[0].1;
        assert_eq!(Some(&manifest.flow_id), item.target_id.as_ref());
        assert_eq!(manifest.variables.len(), 1);
        assert_eq!(manifest.routing_rules[0].queue_ref, "q-sales");
    }

    #[tokio::test]
    async fn test_empty_artifact_import_warns_but_keeps_item() {
        let (source, target, executor) = fixture();
        source.insert(ORG, SourceEntity::new("f1", EntityType::Flow, "Main IVR"));

        let req = MigrateRequest::new(EntityType::Flow, ORG, ENV)
            .with_flow_artifacts(FlowArtifactOptions::all());
        let result = executor.migrate(&req, &CancellationToken::new()).await.unwrap();

        // Nothing to import: no variables, no queues.
        assert_eq!(result.items[0].status, ItemStatus::Migrated);
        assert!(result.items[0].warnings.is_empty());
        assert!(target.imports().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_reports_association_drift() {
        let (source, target, executor) = fixture();
        source.insert(
            ORG,
            SourceEntity::new("u1", EntityType::User, "Jane").with_email("jane@x.com"),
        );
        source.set_associations("u1", Associations::new(vec!["billing".into()], vec![]));
        target.insert(
            ENV,
            TargetEntity {
                id: "t-u1".into(),
                entity_type: EntityType::User,
                name: "Jane".into(),
                email: Some("JANE@x.com".into()),
                description: None,
                status: TargetStatus::Active,
                source_type: None,
            },
        );

        let req = MigrateRequest::new(EntityType::User, ORG, ENV).with_associations();
        let result = executor.migrate(&req, &CancellationToken::new()).await.unwrap();

        let item = &result.items[0];
        assert_eq!(item.status, ItemStatus::SkippedDuplicate);
        assert_eq!(item.warnings.len(), 2);
        assert!(item.warnings[1].contains("billing"));
    }

    #[tokio::test]
    async fn test_missing_refs_are_rejected() {
        let (_source, target, executor) = fixture();
        let req = MigrateRequest::new(EntityType::Queue, "", ENV);
        let err = executor.migrate(&req, &CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, crate::Error::Validation(_)));
        assert_eq!(target.mutation_count(), 0);
    }

    #[tokio::test]
    async fn test_unknown_org_is_a_connector_error() {
        let (_source, _target, executor) = fixture();
        let req = MigrateRequest::new(EntityType::Queue, "missing-org", ENV);
        let err = executor.migrate(&req, &CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, crate::Error::Connector(_)));
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let (source, _target, executor) = fixture();
        source.insert(ORG, queue("q1", "Sales"));

        let cancel = CancellationToken::new();
        cancel.cancel();
        let req = MigrateRequest::new(EntityType::Queue, ORG, ENV);
        let err = executor.migrate(&req, &cancel).await.unwrap_err();
        assert!(matches!(err, crate::Error::Cancelled));
    }

    #[tokio::test]
    async fn test_lock_reject_policy() {
        let source = Arc::new(MemorySource::new());
        source.insert(ORG, queue("q1", "Sales"));
        let locks = LockRegistry::new();
        let executor = MigrationExecutor::new(
            source,
            Arc::new(MemoryTarget::new()),
            locks.clone(),
            EngineConfig::default().with_lock_policy(LockPolicy::Reject),
        );

        let cancel = CancellationToken::new();
        let _held = locks
            .acquire(
                LockKey::migration(ORG, ENV, EntityType::Queue),
                LockPolicy::Wait,
                &cancel,
            )
            .await
            .unwrap();

        let req = MigrateRequest::new(EntityType::Queue, ORG, ENV);
        let err = executor.migrate(&req, &cancel).await.unwrap_err();
        assert!(matches!(err, crate::Error::InProgress(_)));

        // A different entity type is not blocked.
        let req = MigrateRequest::new(EntityType::User, ORG, ENV);
        assert!(executor.migrate(&req, &cancel).await.is_ok());
    }

    #[tokio::test]
    async fn test_compare_only_differences() {
        let (source, target, executor) = fixture();
        source.insert(ORG, queue("q1", "Sales"));
        source.insert(ORG, queue("q2", "Support"));
        target.insert(
            ENV,
            TargetEntity {
                id: "t-1".into(),
                entity_type: EntityType::Queue,
                name: "sales".into(),
                email: None,
                description: None,
                status: TargetStatus::Active,
                source_type: None,
            },
        );

        let cancel = CancellationToken::new();
        let all = executor
            .compare(&CompareRequest::new(EntityType::Queue, ORG, ENV), &cancel)
            .await
            .unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].status, MatchStatus::Identical);
        assert_eq!(all[1].status, MatchStatus::NotFound);

        let diffs = executor
            .compare(
                &CompareRequest::new(EntityType::Queue, ORG, ENV).only_differences(),
                &cancel,
            )
            .await
            .unwrap();
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].source_id, "q2");
        assert_eq!(target.mutation_count(), 0);
    }
}
