//! Migrate and compare requests.

use serde::{Deserialize, Serialize};

use super::artifacts::FlowArtifactOptions;
use crate::error::{Error, Result};
use crate::model::{EntityType, SourceEntity};

/// Arguments of one `migrate` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrateRequest {
    pub entity_type: EntityType,
    pub source_org_ref: String,
    pub target_env_ref: String,
    #[serde(default)]
    pub id_filter: Option<Vec<String>>,
    #[serde(default)]
    pub include_associations: bool,
    #[serde(default)]
    pub dry_run: bool,
    #[serde(default)]
    pub flow_artifacts: FlowArtifactOptions,
}

impl MigrateRequest {
    /// Create a request migrating every entity of `entity_type`.
    pub fn new(
        entity_type: EntityType,
        source_org_ref: impl Into<String>,
        target_env_ref: impl Into<String>,
    ) -> Self {
        Self {
            entity_type,
            source_org_ref: source_org_ref.into(),
            target_env_ref: target_env_ref.into(),
            id_filter: None,
            include_associations: false,
            dry_run: false,
            flow_artifacts: FlowArtifactOptions::default(),
        }
    }

    /// Restrict the batch to the given source ids.
    pub fn with_id_filter(mut self, ids: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.id_filter = Some(ids.into_iter().map(Into::into).collect());
        self
    }

    /// Compare skills and memberships when reconciling.
    pub fn with_associations(mut self) -> Self {
        self.include_associations = true;
        self
    }

    /// Simulate creations instead of performing them.
    pub fn dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }

    /// Generate flow artifacts for migrated flows.
    pub fn with_flow_artifacts(mut self, options: FlowArtifactOptions) -> Self {
        self.flow_artifacts = options;
        self
    }

    /// Reject requests that cannot start.
    pub fn validate(&self) -> Result<()> {
        validate_refs(&self.source_org_ref, &self.target_env_ref)
    }

    /// The id filter, if one with at least one id was supplied.
    pub fn filter(&self) -> Option<&[String]> {
        effective_filter(&self.id_filter)
    }
}

/// Arguments of one `compare` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareRequest {
    pub entity_type: EntityType,
    pub source_org_ref: String,
    pub target_env_ref: String,
    #[serde(default)]
    pub id_filter: Option<Vec<String>>,
    #[serde(default)]
    pub include_associations: bool,
    #[serde(default)]
    pub show_only_differences: bool,
}

impl CompareRequest {
    /// Create a request comparing every entity of `entity_type`.
    pub fn new(
        entity_type: EntityType,
        source_org_ref: impl Into<String>,
        target_env_ref: impl Into<String>,
    ) -> Self {
        Self {
            entity_type,
            source_org_ref: source_org_ref.into(),
            target_env_ref: target_env_ref.into(),
            id_filter: None,
            include_associations: false,
            show_only_differences: false,
        }
    }

    /// Restrict the comparison to the given source ids.
    pub fn with_id_filter(mut self, ids: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.id_filter = Some(ids.into_iter().map(Into::into).collect());
        self
    }

    /// Compare skills and memberships too.
    pub fn with_associations(mut self) -> Self {
        self.include_associations = true;
        self
    }

    /// Drop identical pairs from the result.
    pub fn only_differences(mut self) -> Self {
        self.show_only_differences = true;
        self
    }

    /// Reject requests that cannot start.
    pub fn validate(&self) -> Result<()> {
        validate_refs(&self.source_org_ref, &self.target_env_ref)
    }

    /// The id filter, if one with at least one id was supplied.
    pub fn filter(&self) -> Option<&[String]> {
        effective_filter(&self.id_filter)
    }
}

/// Keep only the entities named by `filter`, preserving fetch order.
///
/// Filter ids that match nothing are dropped silently.
pub fn apply_filter(entities: Vec<SourceEntity>, filter: Option<&[String]>) -> Vec<SourceEntity> {
    match filter {
        Some(ids) => entities
            .into_iter()
            .filter(|e| ids.iter().any(|id| id == &e.id))
            .collect(),
        None => entities,
    }
}

fn validate_refs(source_org_ref: &str, target_env_ref: &str) -> Result<()> {
    if source_org_ref.trim().is_empty() {
        return Err(Error::validation("sourceOrgRef is required"));
    }
    if target_env_ref.trim().is_empty() {
        return Err(Error::validation("targetEnvRef is required"));
    }
    Ok(())
}

fn effective_filter(filter: &Option<Vec<String>>) -> Option<&[String]> {
    filter.as_deref().filter(|ids| !ids.is_empty())
}
