//! Entity records exchanged with the source and target platforms.
//!
//! Source and target identifiers live in separate namespaces. Nothing here
//! stores a cross-system key: correlation between a [`SourceEntity`] and a
//! [`TargetEntity`] is inferred by the reconciler every time it is needed.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Kind of configuration entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    /// Agent or supervisor account.
    User,
    /// Routing queue.
    Queue,
    /// Call/message handling flow.
    Flow,
    /// Routing skill.
    Skill,
    /// Bot definition (target side of bot flows).
    Bot,
}

impl EntityType {
    /// All entity types.
    pub const ALL: [EntityType; 5] = [
        EntityType::User,
        EntityType::Queue,
        EntityType::Flow,
        EntityType::Skill,
        EntityType::Bot,
    ];

    /// Lowercase name used on the wire and in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::User => "user",
            EntityType::Queue => "queue",
            EntityType::Flow => "flow",
            EntityType::Skill => "skill",
            EntityType::Bot => "bot",
        }
    }

    /// Whether this entity type carries skill/membership associations.
    pub fn has_associations(&self) -> bool {
        matches!(self, EntityType::User | EntityType::Flow)
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        let singular = lowered.strip_suffix('s').unwrap_or(&lowered);
        EntityType::ALL
            .into_iter()
            .find(|t| t.as_str() == singular)
            .ok_or_else(|| Error::validation(format!("unknown entity type '{s}'")))
    }
}

/// One entity as fetched from the source platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceEntity {
    /// Source-system identifier.
    pub id: String,
    /// Entity type.
    pub entity_type: EntityType,
    /// Display name.
    pub name: String,
    /// Email address (users only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Free-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Source-native lifecycle state (active, draft, published, archived, ...).
    #[serde(default)]
    pub state: String,
    /// Source-native flow type (inbound, outbound, chat, ...). Flows only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow_type: Option<String>,
    /// Names of variables declared by the flow. Flows only.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variables: Vec<String>,
}

impl SourceEntity {
    /// Create a source entity with the given id, type and name.
    pub fn new(id: impl Into<String>, entity_type: EntityType, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            entity_type,
            name: name.into(),
            email: None,
            description: None,
            state: "active".to_string(),
            flow_type: None,
            variables: Vec::new(),
        }
    }

    /// Set the email address.
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the source-native state.
    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = state.into();
        self
    }

    /// Set the source-native flow type.
    pub fn with_flow_type(mut self, flow_type: impl Into<String>) -> Self {
        self.flow_type = Some(flow_type.into());
        self
    }

    /// Add a declared flow variable.
    pub fn with_variable(mut self, name: impl Into<String>) -> Self {
        self.variables.push(name.into());
        self
    }
}

/// Target-native status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetStatus {
    Active,
    Inactive,
    #[default]
    Unknown,
}

impl fmt::Display for TargetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetStatus::Active => write!(f, "active"),
            TargetStatus::Inactive => write!(f, "inactive"),
            TargetStatus::Unknown => write!(f, "unknown"),
        }
    }
}

/// One entity as it exists on the target platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetEntity {
    /// Target-system identifier.
    pub id: String,
    /// Entity type.
    pub entity_type: EntityType,
    /// Display name.
    pub name: String,
    /// Email address (users only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Free-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Target-native status.
    #[serde(default)]
    pub status: TargetStatus,
    /// Target-native source/stream code. Flows only; 0 means unknown.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_type: Option<u32>,
}

impl TargetEntity {
    /// Materialize a create payload under the id assigned by the target.
    pub fn from_new(id: impl Into<String>, new: NewTargetEntity) -> Self {
        Self {
            id: id.into(),
            entity_type: new.entity_type,
            name: new.name,
            email: new.email,
            description: new.description,
            status: new.status,
            source_type: new.source_type,
        }
    }
}

/// Create payload for a target entity. Produced by the field mapper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTargetEntity {
    pub entity_type: EntityType,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: TargetStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_type: Option<u32>,
}

/// Set-valued associations of one entity.
///
/// On the source side `memberships` are queue ids; on the target side they are
/// workstream ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Associations {
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub memberships: Vec<String>,
}

impl Associations {
    /// Create an association set.
    pub fn new(skills: Vec<String>, memberships: Vec<String>) -> Self {
        Self {
            skills,
            memberships,
        }
    }

    /// True when there are no associations at all.
    pub fn is_empty(&self) -> bool {
        self.skills.is_empty() && self.memberships.is_empty()
    }
}
