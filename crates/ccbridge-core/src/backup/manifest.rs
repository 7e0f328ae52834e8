//! Backup manifests, snapshots and their encoding.
//!
//! A backup is a manifest (counts, sizes, checksums, expiry) plus a
//! gzip-compressed JSON [`Snapshot`] of the selected target components.
//! Checksums cover the uncompressed snapshot bytes.

use std::fmt;
use std::io::{Read, Write};
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use md5::Md5;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};
use crate::model::{Associations, EntityType, TargetEntity};

/// A backup component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Component {
    Users,
    Queues,
    Flows,
    Bots,
}

impl Component {
    /// Every component, in rollback order.
    pub const ALL: [Component; 4] = [
        Component::Users,
        Component::Queues,
        Component::Flows,
        Component::Bots,
    ];

    /// Position in the fixed rollback order.
    pub fn rollback_order(&self) -> usize {
        match self {
            Component::Users => 0,
            Component::Queues => 1,
            Component::Flows => 2,
            Component::Bots => 3,
        }
    }

    /// Target entity type stored under this component.
    pub fn entity_type(&self) -> EntityType {
        match self {
            Component::Users => EntityType::User,
            Component::Queues => EntityType::Queue,
            Component::Flows => EntityType::Flow,
            Component::Bots => EntityType::Bot,
        }
    }

    /// Component name as used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Component::Users => "Users",
            Component::Queues => "Queues",
            Component::Flows => "Flows",
            Component::Bots => "Bots",
        }
    }

    /// Sort components into rollback order and drop repeats.
    pub fn ordered(components: &[Component]) -> Vec<Component> {
        let mut ordered = components.to_vec();
        ordered.sort_by_key(Component::rollback_order);
        ordered.dedup();
        ordered
    }

    /// Parse a list of component names.
    pub fn parse_list<S: AsRef<str>>(names: &[S]) -> Result<Vec<Component>> {
        names.iter().map(|n| n.as_ref().parse()).collect()
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Component {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim().to_ascii_lowercase();
        let singular = name.strip_suffix('s').unwrap_or(&name);
        match singular {
            "user" => Ok(Component::Users),
            "queue" => Ok(Component::Queues),
            "flow" => Ok(Component::Flows),
            "bot" => Ok(Component::Bots),
            _ => Err(Error::validation(format!("unknown backup component '{s}'"))),
        }
    }
}

/// Compression level of a backup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionLevel {
    Low,
    #[default]
    Medium,
    High,
}

impl CompressionLevel {
    /// Fraction of the original size reported as the compressed size.
    pub fn ratio(&self) -> f64 {
        match self {
            CompressionLevel::Low => 0.8,
            CompressionLevel::Medium => 0.6,
            CompressionLevel::High => 0.4,
        }
    }

    /// Reported compressed size for an original size.
    pub fn compressed_size(&self, original: u64) -> u64 {
        (self.ratio() * original as f64).round() as u64
    }

    /// gzip level used for the stored payload.
    pub fn gzip(&self) -> Compression {
        match self {
            CompressionLevel::Low => Compression::new(1),
            CompressionLevel::Medium => Compression::new(6),
            CompressionLevel::High => Compression::new(9),
        }
    }
}

impl fmt::Display for CompressionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompressionLevel::Low => write!(f, "low"),
            CompressionLevel::Medium => write!(f, "medium"),
            CompressionLevel::High => write!(f, "high"),
        }
    }
}

impl FromStr for CompressionLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(CompressionLevel::Low),
            "medium" => Ok(CompressionLevel::Medium),
            "high" => Ok(CompressionLevel::High),
            _ => Err(Error::validation(format!("unknown compression level '{s}'"))),
        }
    }
}

/// Capture status of one component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentStatus {
    /// Records were captured.
    Completed,
    /// The component had no records at backup time.
    Empty,
}

/// Per-component entry of a manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentSummary {
    pub name: Component,
    pub record_count: usize,
    pub size_bytes: u64,
    pub status: ComponentStatus,
}

impl ComponentSummary {
    /// Summarize a captured component.
    pub fn new(name: Component, record_count: usize, size_bytes: u64) -> Self {
        Self {
            name,
            record_count,
            size_bytes,
            status: if record_count == 0 {
                ComponentStatus::Empty
            } else {
                ComponentStatus::Completed
            },
        }
    }
}

/// Checksums over the uncompressed snapshot bytes, lowercase hex.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checksums {
    pub md5: String,
    pub sha256: String,
}

impl Checksums {
    /// Compute both checksums of `data`.
    pub fn compute(data: &[u8]) -> Self {
        Self {
            md5: hex::encode(Md5::digest(data)),
            sha256: hex::encode(Sha256::digest(data)),
        }
    }
}

/// Immutable description of one backup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupManifest {
    pub backup_id: String,
    pub migration_id: String,
    pub source_org_ref: String,
    pub target_env_ref: String,
    pub components: Vec<ComponentSummary>,
    pub original_size_bytes: u64,
    pub compressed_size_bytes: u64,
    pub compression_level: CompressionLevel,
    pub checksums: Checksums,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Where a backup came from.
#[derive(Debug, Clone)]
pub struct BackupOrigin {
    pub migration_id: String,
    pub source_org_ref: String,
    pub target_env_ref: String,
}

impl BackupManifest {
    /// Build a manifest from captured component summaries.
    ///
    /// Sizes are summed and the compression ratio applied to the total.
    pub fn new(
        backup_id: String,
        origin: BackupOrigin,
        components: Vec<ComponentSummary>,
        compression_level: CompressionLevel,
        checksums: Checksums,
        created_at: DateTime<Utc>,
        retention: Duration,
    ) -> Self {
        let original_size_bytes = components.iter().map(|c| c.size_bytes).sum();
        Self {
            backup_id,
            migration_id: origin.migration_id,
            source_org_ref: origin.source_org_ref,
            target_env_ref: origin.target_env_ref,
            compressed_size_bytes: compression_level.compressed_size(original_size_bytes),
            original_size_bytes,
            components,
            compression_level,
            checksums,
            created_at,
            expires_at: created_at + retention,
        }
    }

    /// Whether the backup is no longer eligible for rollback at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Manifest entry of a component.
    pub fn component(&self, component: Component) -> Option<&ComponentSummary> {
        self.components.iter().find(|c| c.name == component)
    }

    /// Components captured by this backup.
    pub fn component_names(&self) -> Vec<Component> {
        self.components.iter().map(|c| c.name).collect()
    }

    /// Total number of captured records.
    pub fn record_count(&self) -> usize {
        self.components.iter().map(|c| c.record_count).sum()
    }
}

/// One captured target entity with its associations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotRecord {
    pub entity: TargetEntity,
    #[serde(default)]
    pub associations: Associations,
}

/// Captured records of one component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentSnapshot {
    pub component: Component,
    pub records: Vec<SnapshotRecord>,
}

impl ComponentSnapshot {
    /// Serialized size of the component in bytes.
    pub fn size_bytes(&self) -> Result<u64> {
        Ok(serde_json::to_vec(self)?.len() as u64)
    }
}

/// Full contents of a backup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub target_env_ref: String,
    pub captured_at: DateTime<Utc>,
    pub components: Vec<ComponentSnapshot>,
}

impl Snapshot {
    /// Records of a component, if it was captured.
    pub fn component(&self, component: Component) -> Option<&ComponentSnapshot> {
        self.components.iter().find(|c| c.component == component)
    }

    /// Uncompressed JSON encoding.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decode from uncompressed JSON.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// gzip-compress a payload.
pub fn compress(data: &[u8], level: CompressionLevel) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), level.gzip());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

/// Decompress a gzip payload.
pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = GzDecoder::new(data);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TargetStatus;

    fn origin() -> BackupOrigin {
        BackupOrigin {
            migration_id: "mig-1".into(),
            source_org_ref: "org".into(),
            target_env_ref: "env".into(),
        }
    }

    #[test]
    fn test_medium_compression_example() {
        let components = vec![
            ComponentSummary::new(Component::Users, 120, 2_048_576),
            ComponentSummary::new(Component::Queues, 14, 1_024_000),
        ];
        let manifest = BackupManifest::new(
            "bk-1".into(),
            origin(),
            components,
            CompressionLevel::Medium,
            Checksums::compute(b""),
            Utc::now(),
            Duration::days(30),
        );

        assert_eq!(manifest.original_size_bytes, 3_072_576);
        assert_eq!(manifest.compressed_size_bytes, 1_843_546);
        assert_eq!(manifest.expires_at - manifest.created_at, Duration::days(30));
        assert_eq!(manifest.record_count(), 134);
    }

    #[test]
    fn test_compression_ratios() {
        assert_eq!(CompressionLevel::Low.compressed_size(1000), 800);
        assert_eq!(CompressionLevel::Medium.compressed_size(1000), 600);
        assert_eq!(CompressionLevel::High.compressed_size(1000), 400);
        assert_eq!("HIGH".parse::<CompressionLevel>().unwrap(), CompressionLevel::High);
        assert!("ultra".parse::<CompressionLevel>().is_err());
    }

    #[test]
    fn test_component_parsing_and_order() {
        let parsed = Component::parse_list(&["bots", "Users", "queue", "FLOWS"]).unwrap();
        assert_eq!(
            Component::ordered(&parsed),
            vec![Component::Users, Component::Queues, Component::Flows, Component::Bots]
        );
        assert!("skills".parse::<Component>().is_err());
        assert_eq!(Component::Bots.entity_type(), EntityType::Bot);
    }

    #[test]
    fn test_checksums_are_hex() {
        let sums = Checksums::compute(b"hello");
        assert_eq!(sums.md5, "5d41402abc4b2a76b9719d911017c592");
        assert_eq!(
            sums.sha256,
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn test_snapshot_payload_survives_compression() {
        let snapshot = Snapshot {
            target_env_ref: "env".into(),
            captured_at: Utc::now(),
            components: vec![ComponentSnapshot {
                component: Component::Queues,
                records: vec![SnapshotRecord {
                    entity: TargetEntity {
                        id: "q-1".into(),
                        entity_type: EntityType::Queue,
                        name: "Sales".into(),
                        email: None,
                        description: None,
                        status: TargetStatus::Active,
                        source_type: None,
                    },
                    associations: Associations::default(),
                }],
            }],
        };

        let raw = snapshot.to_bytes().unwrap();
        let packed = compress(&raw, CompressionLevel::High).unwrap();
        let unpacked = decompress(&packed).unwrap();
        assert_eq!(Checksums::compute(&raw), Checksums::compute(&unpacked));
        assert_eq!(Snapshot::from_bytes(&unpacked).unwrap(), snapshot);
    }

    #[test]
    fn test_expiry() {
        let created = Utc::now();
        let manifest = BackupManifest::new(
            "bk-1".into(),
            origin(),
            vec![ComponentSummary::new(Component::Users, 0, 10)],
            CompressionLevel::Low,
            Checksums::compute(b""),
            created,
            Duration::days(30),
        );

        assert_eq!(manifest.components[0].status, ComponentStatus::Empty);
        assert!(!manifest.is_expired_at(created + Duration::days(29)));
        assert!(manifest.is_expired_at(created + Duration::days(30)));
    }
}
