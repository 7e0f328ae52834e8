//! In-memory connectors.
//!
//! [`MemoryTarget`] doubles as the sandbox for test restores during backup
//! validation. Both connectors keep insertion order so fetch order is stable.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{ConnectorError, ConnectorResult, SourceConnector, TargetConnector};
use crate::migration::artifacts::ImportManifest;
use crate::model::{Associations, EntityType, NewTargetEntity, SourceEntity, TargetEntity};

/// Source platform held in memory, keyed by organization reference.
#[derive(Debug, Default)]
pub struct MemorySource {
    orgs: RwLock<HashMap<String, Vec<SourceEntity>>>,
    associations: RwLock<HashMap<String, Associations>>,
}

impl MemorySource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entity to an organization. The organization is created on first use.
    pub fn insert(&self, org_ref: &str, entity: SourceEntity) {
        self.orgs
            .write()
            .entry(org_ref.to_string())
            .or_default()
            .push(entity);
    }

    /// Register an empty organization.
    pub fn add_org(&self, org_ref: &str) {
        self.orgs.write().entry(org_ref.to_string()).or_default();
    }

    /// Set the skills and queue memberships of an entity.
    pub fn set_associations(&self, entity_id: &str, associations: Associations) {
        self.associations
            .write()
            .insert(entity_id.to_string(), associations);
    }

    /// All entities of an organization, in insertion order.
    pub fn entities(&self, org_ref: &str) -> Vec<SourceEntity> {
        self.orgs.read().get(org_ref).cloned().unwrap_or_default()
    }
}

#[async_trait]
impl SourceConnector for MemorySource {
    async fn list_entities(
        &self,
        entity_type: EntityType,
        org_ref: &str,
        id_filter: Option<&[String]>,
    ) -> ConnectorResult<Vec<SourceEntity>> {
        let orgs = self.orgs.read();
        let entities = orgs
            .get(org_ref)
            .ok_or_else(|| ConnectorError::not_found(format!("organization {org_ref}")))?;

        Ok(entities
            .iter()
            .filter(|e| e.entity_type == entity_type)
            .filter(|e| id_filter.map_or(true, |ids| ids.iter().any(|id| id == &e.id)))
            .cloned()
            .collect())
    }

    async fn get_entity_skills(&self, entity_id: &str) -> ConnectorResult<Vec<String>> {
        Ok(self
            .associations
            .read()
            .get(entity_id)
            .map(|a| a.skills.clone())
            .unwrap_or_default())
    }

    async fn get_entity_queues(&self, entity_id: &str) -> ConnectorResult<Vec<String>> {
        Ok(self
            .associations
            .read()
            .get(entity_id)
            .map(|a| a.memberships.clone())
            .unwrap_or_default())
    }
}

#[derive(Debug, Default)]
struct TargetState {
    envs: HashMap<String, Vec<TargetEntity>>,
    associations: HashMap<String, Associations>,
    imports: Vec<(String, ImportManifest)>,
}

/// Target platform held in memory, keyed by environment reference.
#[derive(Debug, Default)]
pub struct MemoryTarget {
    state: RwLock<TargetState>,
    create_calls: AtomicUsize,
    restore_calls: AtomicUsize,
    import_calls: AtomicUsize,
}

impl MemoryTarget {
    /// Create an empty target.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an existing entity into an environment.
    pub fn insert(&self, env_ref: &str, entity: TargetEntity) {
        self.state
            .write()
            .envs
            .entry(env_ref.to_string())
            .or_default()
            .push(entity);
    }

    /// Set the skills and workstream memberships of an entity.
    pub fn set_associations(&self, entity_id: &str, associations: Associations) {
        self.state
            .write()
            .associations
            .insert(entity_id.to_string(), associations);
    }

    /// All entities of an environment, in insertion order.
    pub fn entities(&self, env_ref: &str) -> Vec<TargetEntity> {
        self.state
            .read()
            .envs
            .get(env_ref)
            .cloned()
            .unwrap_or_default()
    }

    /// Every environment and its entities.
    pub fn environments(&self) -> HashMap<String, Vec<TargetEntity>> {
        self.state.read().envs.clone()
    }

    /// Artifact manifests received through `import_batch`.
    pub fn imports(&self) -> Vec<(String, ImportManifest)> {
        self.state.read().imports.clone()
    }

    /// Number of mutating calls received (create, restore and import).
    pub fn mutation_count(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
            + self.restore_calls.load(Ordering::SeqCst)
            + self.import_calls.load(Ordering::SeqCst)
    }

    /// Number of `create_entity` calls received.
    pub fn create_count(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    /// Number of `restore_entity` calls received.
    pub fn restore_count(&self) -> usize {
        self.restore_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TargetConnector for MemoryTarget {
    async fn list_entities(
        &self,
        entity_type: EntityType,
        env_ref: &str,
    ) -> ConnectorResult<Vec<TargetEntity>> {
        Ok(self
            .state
            .read()
            .envs
            .get(env_ref)
            .map(|entities| {
                entities
                    .iter()
                    .filter(|e| e.entity_type == entity_type)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn create_entity(
        &self,
        entity_type: EntityType,
        env_ref: &str,
        entity: &NewTargetEntity,
    ) -> ConnectorResult<TargetEntity> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if entity.name.trim().is_empty() {
            return Err(ConnectorError::rejected("name must not be empty"));
        }

        let id = format!("{}-{}", entity_type.as_str(), uuid::Uuid::new_v4());
        let mut created = TargetEntity::from_new(id, entity.clone());
        created.entity_type = entity_type;
        self.insert(env_ref, created.clone());
        Ok(created)
    }

    async fn restore_entity(
        &self,
        entity_type: EntityType,
        env_ref: &str,
        entity: &TargetEntity,
    ) -> ConnectorResult<TargetEntity> {
        self.restore_calls.fetch_add(1, Ordering::SeqCst);
        let mut restored = entity.clone();
        restored.entity_type = entity_type;

        let mut state = self.state.write();
        let entities = state.envs.entry(env_ref.to_string()).or_default();
        match entities.iter_mut().find(|e| e.id == entity.id) {
            Some(existing) => *existing = restored.clone(),
            None => entities.push(restored.clone()),
        }
        Ok(restored)
    }

    async fn get_entity_skills(&self, entity_id: &str) -> ConnectorResult<Vec<String>> {
        Ok(self
            .state
            .read()
            .associations
            .get(entity_id)
            .map(|a| a.skills.clone())
            .unwrap_or_default())
    }

    async fn get_entity_workstreams(&self, entity_id: &str) -> ConnectorResult<Vec<String>> {
        Ok(self
            .state
            .read()
            .associations
            .get(entity_id)
            .map(|a| a.memberships.clone())
            .unwrap_or_default())
    }

    async fn import_batch(&self, env_ref: &str, manifest: &ImportManifest) -> ConnectorResult<bool> {
        self.import_calls.fetch_add(1, Ordering::SeqCst);
        if manifest.is_empty() {
            return Ok(false);
        }
        self.state
            .write()
            .imports
            .push((env_ref.to_string(), manifest.clone()));
        Ok(true)
    }
}
