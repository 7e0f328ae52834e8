//! Per-item and per-batch migration results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::EntityType;

/// Outcome of one source entity in a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    /// Created on the target in this run.
    Migrated,
    /// Would have been created; dry run.
    Simulated,
    /// A matching target entity already exists.
    SkippedDuplicate,
    /// Creation failed or the call was cancelled.
    Failed,
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemStatus::Migrated => write!(f, "migrated"),
            ItemStatus::Simulated => write!(f, "simulated"),
            ItemStatus::SkippedDuplicate => write!(f, "skipped_duplicate"),
            ItemStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Result for one source entity.
///
/// `target_id` is only ever set on `migrated` items and always names an
/// entity created by this run. The existing counterpart of a duplicate is
/// reported through `matched_target_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationItemResult {
    pub source_id: String,
    pub source_name: String,
    pub target_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_target_id: Option<String>,
    pub status: ItemStatus,
    pub warnings: Vec<String>,
}

impl MigrationItemResult {
    fn base(source_id: &str, source_name: &str, status: ItemStatus) -> Self {
        Self {
            source_id: source_id.to_string(),
            source_name: source_name.to_string(),
            target_id: None,
            matched_target_id: None,
            status,
            warnings: Vec::new(),
        }
    }

    /// Entity created with the given target id.
    pub fn migrated(source_id: &str, source_name: &str, target_id: impl Into<String>) -> Self {
        let mut item = Self::base(source_id, source_name, ItemStatus::Migrated);
        item.target_id = Some(target_id.into());
        item
    }

    /// Creation simulated by a dry run.
    pub fn simulated(source_id: &str, source_name: &str) -> Self {
        Self::base(source_id, source_name, ItemStatus::Simulated)
    }

    /// A target counterpart already exists.
    pub fn duplicate(
        source_id: &str,
        source_name: &str,
        existing_id: &str,
        existing_name: &str,
    ) -> Self {
        let mut item = Self::base(source_id, source_name, ItemStatus::SkippedDuplicate);
        item.matched_target_id = Some(existing_id.to_string());
        item.warnings.push(format!(
            "duplicate of existing target entity '{}' ({})",
            existing_name, existing_id
        ));
        item
    }

    /// Same counterpart as an item simulated earlier in the same dry run.
    pub fn planned_duplicate(source_id: &str, source_name: &str, planned_name: &str) -> Self {
        let mut item = Self::base(source_id, source_name, ItemStatus::SkippedDuplicate);
        item.warnings.push(format!(
            "duplicate of '{}' already simulated in this dry run",
            planned_name
        ));
        item
    }

    /// The item could not be processed.
    pub fn failed(source_id: &str, source_name: &str, reason: impl Into<String>) -> Self {
        let mut item = Self::base(source_id, source_name, ItemStatus::Failed);
        item.warnings.push(reason.into());
        item
    }

    /// Append a warning.
    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }

    /// True for migrated and simulated items.
    pub fn is_success(&self) -> bool {
        matches!(self.status, ItemStatus::Migrated | ItemStatus::Simulated)
    }
}

/// Aggregate counts of a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Migrated plus simulated items.
    pub successful: usize,
    /// Failed items.
    pub failed: usize,
    /// Items carrying at least one warning.
    pub warnings: usize,
}

impl BatchSummary {
    /// Summarize a list of item results.
    pub fn from_items(items: &[MigrationItemResult]) -> Self {
        items.iter().fold(Self::default(), |mut summary, item| {
            if item.is_success() {
                summary.successful += 1;
            }
            if item.status == ItemStatus::Failed {
                summary.failed += 1;
            }
            if !item.warnings.is_empty() {
                summary.warnings += 1;
            }
            summary
        })
    }
}

/// Result of one `migrate` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationBatchResult {
    pub migration_id: String,
    pub entity_type: EntityType,
    pub total_items: usize,
    pub items: Vec<MigrationItemResult>,
    pub summary: BatchSummary,
    pub dry_run: bool,
    /// True when the batch stopped early because the caller cancelled.
    pub cancelled: bool,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

impl MigrationBatchResult {
    /// Finish a batch from its item results.
    pub fn new(
        migration_id: String,
        entity_type: EntityType,
        items: Vec<MigrationItemResult>,
        dry_run: bool,
        cancelled: bool,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            migration_id,
            entity_type,
            total_items: items.len(),
            summary: BatchSummary::from_items(&items),
            items,
            dry_run,
            cancelled,
            started_at,
            completed_at: Utc::now(),
        }
    }

    /// Items with the given status.
    pub fn with_status(&self, status: ItemStatus) -> impl Iterator<Item = &MigrationItemResult> {
        self.items.iter().filter(move |i| i.status == status)
    }

    /// Find the result for a source id.
    pub fn item(&self, source_id: &str) -> Option<&MigrationItemResult> {
        self.items.iter().find(|i| i.source_id == source_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_never_carries_target_id() {
        let item = MigrationItemResult::duplicate("u1", "Jane", "t9", "Jane Doe");
        assert_eq!(item.status, ItemStatus::SkippedDuplicate);
        assert!(item.target_id.is_none());
        assert_eq!(item.matched_target_id.as_deref(), Some("t9"));
        assert!(item.warnings[0].contains("t9"));
    }

    #[test]
    fn test_summary_counts() {
        let items = vec![
            MigrationItemResult::migrated("a", "A", "t1"),
            MigrationItemResult::simulated("b", "B"),
            MigrationItemResult::duplicate("c", "C", "t2", "C"),
            MigrationItemResult::failed("d", "D", "rejected error: quota"),
            MigrationItemResult::migrated("e", "E", "t3").with_warning("artifact import failed"),
        ];

        let summary = BatchSummary::from_items(&items);
        assert_eq!(summary.successful, 3);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.warnings, 3);
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_string(&ItemStatus::SkippedDuplicate).unwrap();
        assert_eq!(json, "\"skipped_duplicate\"");
        assert_eq!(ItemStatus::SkippedDuplicate.to_string(), "skipped_duplicate");

        let item = MigrationItemResult::simulated("u1", "Jane");
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["sourceId"], "u1");
        assert!(value["targetId"].is_null());
        assert!(value.get("matchedTargetId").is_none());
    }

    #[test]
    fn test_batch_result_lookup() {
        let batch = MigrationBatchResult::new(
            "m1".into(),
            EntityType::Queue,
            vec![
                MigrationItemResult::migrated("q1", "Sales", "t1"),
                MigrationItemResult::failed("q2", "Support", "boom"),
            ],
            false,
            false,
            Utc::now(),
        );

        assert_eq!(batch.total_items, 2);
        assert_eq!(batch.with_status(ItemStatus::Failed).count(), 1);
        assert_eq!(batch.item("q1").unwrap().target_id.as_deref(), Some("t1"));
        assert!(batch.completed_at >= batch.started_at);
    }
}
