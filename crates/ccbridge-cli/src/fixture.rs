//! JSON fixture standing in for the source and target platforms.
//!
//! ```json
//! {
//!   "sources": { "org-1": [{ "id": "u1", "entityType": "user", "name": "Jane Doe" }] },
//!   "sourceAssociations": { "u1": { "skills": ["billing"], "memberships": ["q1"] } },
//!   "targets": { "env-1": [] },
//!   "targetAssociations": {}
//! }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use ccbridge_core::{Associations, MemorySource, MemoryTarget, SourceEntity, TargetEntity};
use serde::{Deserialize, Serialize};

use crate::error::{CliError, Result};

/// Source and target entity sets, keyed by organization and environment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fixture {
    #[serde(default)]
    pub sources: BTreeMap<String, Vec<SourceEntity>>,
    #[serde(default)]
    pub source_associations: BTreeMap<String, Associations>,
    #[serde(default)]
    pub targets: BTreeMap<String, Vec<TargetEntity>>,
    #[serde(default)]
    pub target_associations: BTreeMap<String, Associations>,
}

impl Fixture {
    /// Read a fixture file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| CliError::file(path, e))?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write the fixture back, pretty-printed.
    pub fn save(&self, path: &Path) -> Result<()> {
        let raw = serde_json::to_string_pretty(self)?;
        std::fs::write(path, raw).map_err(|e| CliError::file(path, e))
    }

    /// Build an in-memory source connector.
    pub fn source(&self) -> MemorySource {
        let source = MemorySource::new();
        for (org, entities) in &self.sources {
            source.add_org(org);
            for entity in entities {
                source.insert(org, entity.clone());
            }
        }
        for (id, associations) in &self.source_associations {
            source.set_associations(id, associations.clone());
        }
        source
    }

    /// Build an in-memory target connector.
    pub fn target(&self) -> MemoryTarget {
        let target = MemoryTarget::new();
        for (env, entities) in &self.targets {
            for entity in entities {
                target.insert(env, entity.clone());
            }
        }
        for (id, associations) in &self.target_associations {
            target.set_associations(id, associations.clone());
        }
        target
    }

    /// Replace the target entity sets with the connector's current state.
    pub fn absorb(&mut self, target: &MemoryTarget) {
        for (env, entities) in target.environments() {
            self.targets.insert(env, entities);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ccbridge_core::{EntityType, NewTargetEntity, TargetConnector, TargetStatus};

    const SAMPLE: &str = r#"{
        "sources": {
            "org-1": [
                { "id": "u1", "entityType": "user", "name": "Jane Doe", "email": "jane@x.com", "state": "active" }
            ]
        },
        "sourceAssociations": { "u1": { "skills": ["billing"], "memberships": ["q1"] } }
    }"#;

    #[test]
    fn test_parse_with_missing_sections() {
        let fixture: Fixture = serde_json::from_str(SAMPLE).unwrap();
        assert_eq!(fixture.sources["org-1"].len(), 1);
        assert!(fixture.targets.is_empty());
        assert!(fixture.target_associations.is_empty());

        let source = fixture.source();
        assert_eq!(source.entities("org-1")[0].name, "Jane Doe");
    }

    #[tokio::test]
    async fn test_absorb_and_save_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fixture.json");

        let mut fixture: Fixture = serde_json::from_str(SAMPLE).unwrap();
        let target = fixture.target();
        target
            .create_entity(
                EntityType::User,
                "env-1",
                &NewTargetEntity {
                    entity_type: EntityType::User,
                    name: "Jane Doe".into(),
                    email: Some("jane@x.com".into()),
                    description: None,
                    status: TargetStatus::Active,
                    source_type: None,
                },
            )
            .await
            .unwrap();

        fixture.absorb(&target);
        fixture.save(&path).unwrap();

        let reloaded = Fixture::load(&path).unwrap();
        assert_eq!(reloaded, fixture);
        assert_eq!(reloaded.target().entities("env-1").len(), 1);
    }

    #[test]
    fn test_missing_file() {
        let err = Fixture::load(Path::new("/nonexistent/fixture.json")).unwrap_err();
        assert!(matches!(err, CliError::File { .. }));
    }
}
