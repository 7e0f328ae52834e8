//! Field-level differencing between a source entity and its matched target.
//!
//! Scalars compare case-insensitively; set-valued associations compare as
//! case-insensitive sets. Output order is stable: scalars in field order,
//! then skills, then memberships.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::mapping::{is_state_mapped, is_type_mapped, map_state, mapped_source_type};
use crate::model::{Associations, EntityType, SourceEntity, TargetEntity};

/// Kind of a single difference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DifferenceKind {
    /// Both sides have a value and they differ.
    ValueMismatch,
    /// The source value has no target equivalent in the lookup tables.
    UnmappedValue,
    /// Set members present only on the source side.
    OnlyInSource,
    /// Set members present only on the target side.
    OnlyInTarget,
    /// Set cardinalities differ.
    CountMismatch,
    /// No target entity matched.
    NotFound,
}

/// One difference between a source entity and a target entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Difference {
    pub field: String,
    pub kind: DifferenceKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    /// Human-readable descriptor.
    pub description: String,
}

impl Difference {
    fn new(
        field: impl Into<String>,
        kind: DifferenceKind,
        source: Option<String>,
        target: Option<String>,
    ) -> Self {
        let field = field.into();
        let description = describe(&field, kind, source.as_deref(), target.as_deref());
        Self {
            field,
            kind,
            source,
            target,
            description,
        }
    }

    /// The "entity not found in target" difference.
    pub fn not_found() -> Self {
        Self::new("entity", DifferenceKind::NotFound, None, None)
    }

    /// Whether this difference is a cross-platform taxonomy artifact rather
    /// than real drift.
    pub fn is_taxonomy_artifact(&self) -> bool {
        self.kind == DifferenceKind::UnmappedValue
    }
}

impl fmt::Display for Difference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description)
    }
}

fn describe(field: &str, kind: DifferenceKind, source: Option<&str>, target: Option<&str>) -> String {
    let s = source.unwrap_or("");
    let t = target.unwrap_or("");
    match kind {
        DifferenceKind::ValueMismatch => {
            format!("{field} differs: source '{s}' vs target '{t}'")
        }
        DifferenceKind::UnmappedValue => {
            format!("{field} '{s}' has no target equivalent (target has '{t}')")
        }
        DifferenceKind::OnlyInSource => format!("{field} missing in target: {s}"),
        DifferenceKind::OnlyInTarget => format!("{field} only in target: {t}"),
        DifferenceKind::CountMismatch => {
            format!("{field} count differs: source {s} vs target {t}")
        }
        DifferenceKind::NotFound => "entity not found in target".to_string(),
    }
}

/// Source and target associations of a matched pair.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssociationPair {
    pub source: Associations,
    pub target: Associations,
}

fn eq_ignore_case(a: Option<&str>, b: Option<&str>) -> bool {
    let a = a.unwrap_or("");
    let b = b.unwrap_or("");
    a == b || a.to_lowercase() == b.to_lowercase()
}

fn compare_text(
    diffs: &mut Vec<Difference>,
    field: &str,
    source: Option<&str>,
    target: Option<&str>,
) {
    if !eq_ignore_case(source, target) {
        diffs.push(Difference::new(
            field,
            DifferenceKind::ValueMismatch,
            source.map(str::to_string),
            target.map(str::to_string),
        ));
    }
}

/// Compare the scalar fields tracked for the entity's type.
pub fn compare_scalars(source: &SourceEntity, target: &TargetEntity) -> Vec<Difference> {
    let mut diffs = Vec::new();

    compare_text(&mut diffs, "name", Some(&source.name), Some(&target.name));

    if source.entity_type == EntityType::User {
        compare_text(
            &mut diffs,
            "email",
            source.email.as_deref(),
            target.email.as_deref(),
        );
    }
    compare_text(
        &mut diffs,
        "description",
        source.description.as_deref(),
        target.description.as_deref(),
    );

    if let Some(mapped) = mapped_source_type(source) {
        let target_code = target.source_type.unwrap_or(crate::mapping::UNKNOWN_SOURCE_TYPE);
        let raw = source.flow_type.clone().unwrap_or_default();
        if !is_type_mapped(&raw) {
            diffs.push(Difference::new(
                "type",
                DifferenceKind::UnmappedValue,
                Some(raw),
                Some(target_code.to_string()),
            ));
        } else if mapped != target_code {
            diffs.push(Difference::new(
                "type",
                DifferenceKind::ValueMismatch,
                Some(mapped.to_string()),
                Some(target_code.to_string()),
            ));
        }
    }

    if !is_state_mapped(&source.state) {
        diffs.push(Difference::new(
            "status",
            DifferenceKind::UnmappedValue,
            Some(source.state.clone()),
            Some(target.status.to_string()),
        ));
    } else {
        let mapped = map_state(&source.state);
        if mapped != target.status {
            diffs.push(Difference::new(
                "status",
                DifferenceKind::ValueMismatch,
                Some(mapped.to_string()),
                Some(target.status.to_string()),
            ));
        }
    }

    diffs
}

/// Compare two sets case-insensitively.
///
/// Emits at most one entry per direction plus a count entry when the
/// (deduplicated) cardinalities differ.
pub fn compare_sets(label: &str, source: &[String], target: &[String]) -> Vec<Difference> {
    let source: BTreeSet<String> = source.iter().map(|s| s.to_lowercase()).collect();
    let target: BTreeSet<String> = target.iter().map(|s| s.to_lowercase()).collect();

    let mut diffs = Vec::new();

    let only_source: Vec<&str> = source.difference(&target).map(String::as_str).collect();
    if !only_source.is_empty() {
        diffs.push(Difference::new(
            label,
            DifferenceKind::OnlyInSource,
            Some(only_source.join(", ")),
            None,
        ));
    }

    let only_target: Vec<&str> = target.difference(&source).map(String::as_str).collect();
    if !only_target.is_empty() {
        diffs.push(Difference::new(
            label,
            DifferenceKind::OnlyInTarget,
            None,
            Some(only_target.join(", ")),
        ));
    }

    if source.len() != target.len() {
        diffs.push(Difference::new(
            label,
            DifferenceKind::CountMismatch,
            Some(source.len().to_string()),
            Some(target.len().to_string()),
        ));
    }

    diffs
}

/// Compare skills and memberships of a matched pair.
pub fn compare_associations(pair: &AssociationPair) -> Vec<Difference> {
    let mut diffs = compare_sets("skills", &pair.source.skills, &pair.target.skills);
    diffs.extend(compare_sets(
        "memberships",
        &pair.source.memberships,
        &pair.target.memberships,
    ));
    diffs
}
