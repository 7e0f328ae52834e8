//! Field mapping from the source schema to the target schema.
//!
//! Every function here is total: unmapped input degrades to a default
//! (`0` for types, [`TargetStatus::Unknown`] for states) and is left for the
//! reconciler to report as a difference. String fields are copied verbatim.

use crate::model::{EntityType, NewTargetEntity, SourceEntity, TargetStatus};

/// Target source code used for unmapped flow types.
pub const UNKNOWN_SOURCE_TYPE: u32 = 0;

/// Source flow type -> target source code.
const TYPE_TABLE: &[(&str, u32)] = &[
    ("inbound", 1),
    ("outbound", 2),
    ("chat", 3),
    ("email", 4),
    ("sms", 5),
    ("bot", 6),
    ("messaging", 7),
    ("social", 8),
    ("workflow", 9),
    ("callback", 10),
];

/// Source state -> target status.
const STATE_TABLE: &[(&str, TargetStatus)] = &[
    ("active", TargetStatus::Active),
    ("published", TargetStatus::Active),
    ("enabled", TargetStatus::Active),
    ("draft", TargetStatus::Inactive),
    ("inactive", TargetStatus::Inactive),
    ("archived", TargetStatus::Inactive),
    ("disabled", TargetStatus::Inactive),
    ("deleted", TargetStatus::Inactive),
];

fn lookup<T: Copy>(table: &[(&str, T)], key: &str) -> Option<T> {
    let key = key.trim();
    table
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(key))
        .map(|(_, v)| *v)
}

/// Map a source flow type to the target source code.
pub fn map_type(source_type: &str) -> u32 {
    lookup(TYPE_TABLE, source_type).unwrap_or(UNKNOWN_SOURCE_TYPE)
}

/// Map a source state to the target status.
pub fn map_state(source_state: &str) -> TargetStatus {
    lookup(STATE_TABLE, source_state).unwrap_or(TargetStatus::Unknown)
}

/// Whether the flow type has an explicit entry in the lookup table.
pub fn is_type_mapped(source_type: &str) -> bool {
    lookup(TYPE_TABLE, source_type).is_some()
}

/// Whether the state has an explicit entry in the lookup table.
pub fn is_state_mapped(source_state: &str) -> bool {
    lookup(STATE_TABLE, source_state).is_some()
}

/// The source code a flow maps to, `None` for non-flow entities.
pub fn mapped_source_type(entity: &SourceEntity) -> Option<u32> {
    if entity.entity_type != EntityType::Flow {
        return None;
    }
    Some(
        entity
            .flow_type
            .as_deref()
            .map(map_type)
            .unwrap_or(UNKNOWN_SOURCE_TYPE),
    )
}

/// Build the target create payload for a source entity.
pub fn map_entity(entity: &SourceEntity) -> NewTargetEntity {
    NewTargetEntity {
        entity_type: entity.entity_type,
        name: entity.name.clone(),
        email: if entity.entity_type == EntityType::User {
            entity.email.clone()
        } else {
            None
        },
        description: entity.description.clone(),
        status: map_state(&entity.state),
        source_type: mapped_source_type(entity),
    }
}
