//! Flow artifacts generated alongside a migrated flow.
//!
//! The target platform models flow variables and routing separately from the
//! flow itself, so a migrated flow gets context-variable and routing-rule
//! stubs sent in one `import_batch` call.

use serde::{Deserialize, Serialize};

use crate::model::SourceEntity;

/// Which artifacts to generate for migrated flows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowArtifactOptions {
    #[serde(default)]
    pub include_variables: bool,
    #[serde(default)]
    pub include_routing_rules: bool,
}

impl FlowArtifactOptions {
    /// Generate every artifact kind.
    pub fn all() -> Self {
        Self {
            include_variables: true,
            include_routing_rules: true,
        }
    }

    /// True when no artifact kind is requested.
    pub fn is_none(&self) -> bool {
        !self.include_variables && !self.include_routing_rules
    }
}

/// Context variable stub.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextVariable {
    pub name: String,
    pub data_type: String,
    pub flow_ref: String,
}

/// Routing rule stub pointing a flow at a queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutingRuleStub {
    pub name: String,
    pub flow_ref: String,
    pub queue_ref: String,
    pub priority: u32,
}

/// Payload of one `import_batch` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportManifest {
    /// Target id of the flow the artifacts belong to.
    pub flow_id: String,
    /// Source id the flow was migrated from.
    pub source_flow_id: String,
    pub variables: Vec<ContextVariable>,
    pub routing_rules: Vec<RoutingRuleStub>,
}

impl ImportManifest {
    /// True when the manifest carries no artifacts.
    pub fn is_empty(&self) -> bool {
        self.variables.is_empty() && self.routing_rules.is_empty()
    }

    /// Total number of artifacts.
    pub fn len(&self) -> usize {
        self.variables.len() + self.routing_rules.len()
    }
}

/// Build the artifact manifest for a freshly created flow.
///
/// Returns `None` when nothing was requested or there is nothing to send.
pub fn build_manifest(
    flow: &SourceEntity,
    target_flow_id: &str,
    queues: &[String],
    options: FlowArtifactOptions,
) -> Option<ImportManifest> {
    if options.is_none() {
        return None;
    }

    let variables = if options.include_variables {
        flow.variables
            .iter()
            .map(|name| ContextVariable {
                name: name.clone(),
                data_type: "string".to_string(),
                flow_ref: target_flow_id.to_string(),
            })
            .collect()
    } else {
        Vec::new()
    };

    let routing_rules = if options.include_routing_rules {
        queues
            .iter()
            .enumerate()
            .map(|(idx, queue)| RoutingRuleStub {
                name: format!("{} -> {}", flow.name, queue),
                flow_ref: target_flow_id.to_string(),
                queue_ref: queue.clone(),
                priority: idx as u32 + 1,
            })
            .collect()
    } else {
        Vec::new()
    };

    let manifest = ImportManifest {
        flow_id: target_flow_id.to_string(),
        source_flow_id: flow.id.clone(),
        variables,
        routing_rules,
    };

    (!manifest.is_empty()).then_some(manifest)
}
