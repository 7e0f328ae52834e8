//! Persistence for backup manifests, payloads and rollback runs.

use std::collections::HashMap;
use std::path::Path;

use parking_lot::RwLock;

use super::manifest::BackupManifest;
use super::rollback::RollbackRun;
use crate::error::Result;

/// Storage backend of the backup manager.
pub trait BackupStore: Send + Sync + 'static {
    /// Save a manifest together with its compressed payload.
    fn save_backup(&self, manifest: &BackupManifest, payload: &[u8]) -> Result<()>;

    /// Load a manifest.
    fn load_manifest(&self, backup_id: &str) -> Result<Option<BackupManifest>>;

    /// Load the compressed payload of a backup.
    fn load_payload(&self, backup_id: &str) -> Result<Option<Vec<u8>>>;

    /// List every manifest.
    fn list_manifests(&self) -> Result<Vec<BackupManifest>>;

    /// Save (or overwrite) a rollback run.
    fn save_run(&self, run: &RollbackRun) -> Result<()>;

    /// Load a rollback run.
    fn load_run(&self, rollback_id: &str) -> Result<Option<RollbackRun>>;

    /// List every rollback run.
    fn list_runs(&self) -> Result<Vec<RollbackRun>>;
}

/// In-memory backup store.
#[derive(Debug, Default)]
pub struct MemoryBackupStore {
    manifests: RwLock<HashMap<String, BackupManifest>>,
    payloads: RwLock<HashMap<String, Vec<u8>>>,
    runs: RwLock<HashMap<String, RollbackRun>>,
}

impl MemoryBackupStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the stored payload of a backup.
    pub fn replace_payload(&self, backup_id: &str, payload: Vec<u8>) {
        self.payloads.write().insert(backup_id.to_string(), payload);
    }

    /// Drop the stored payload of a backup, keeping its manifest.
    pub fn remove_payload(&self, backup_id: &str) {
        self.payloads.write().remove(backup_id);
    }
}

impl BackupStore for MemoryBackupStore {
    fn save_backup(&self, manifest: &BackupManifest, payload: &[u8]) -> Result<()> {
        self.manifests
            .write()
            .insert(manifest.backup_id.clone(), manifest.clone());
        self.payloads
            .write()
            .insert(manifest.backup_id.clone(), payload.to_vec());
        Ok(())
    }

    fn load_manifest(&self, backup_id: &str) -> Result<Option<BackupManifest>> {
        Ok(self.manifests.read().get(backup_id).cloned())
    }

    fn load_payload(&self, backup_id: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.payloads.read().get(backup_id).cloned())
    }

    fn list_manifests(&self) -> Result<Vec<BackupManifest>> {
        let mut manifests: Vec<_> = self.manifests.read().values().cloned().collect();
        manifests.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(manifests)
    }

    fn save_run(&self, run: &RollbackRun) -> Result<()> {
        self.runs.write().insert(run.rollback_id.clone(), run.clone());
        Ok(())
    }

    fn load_run(&self, rollback_id: &str) -> Result<Option<RollbackRun>> {
        Ok(self.runs.read().get(rollback_id).cloned())
    }

    fn list_runs(&self) -> Result<Vec<RollbackRun>> {
        let mut runs: Vec<_> = self.runs.read().values().cloned().collect();
        runs.sort_by(|a, b| a.started_at.cmp(&b.started_at));
        Ok(runs)
    }
}

/// Backup store on a sled tree.
///
/// Keys are prefixed by record kind: `manifest:{id}`, `payload:{id}` and
/// `rollback:{id}`. Manifests and runs are stored as JSON.
pub struct SledBackupStore {
    tree: sled::Tree,
}

impl SledBackupStore {
    /// Tree name for backup records.
    pub const TREE_NAME: &'static str = "ccbridge:backups";

    const MANIFEST_PREFIX: &'static str = "manifest:";
    const PAYLOAD_PREFIX: &'static str = "payload:";
    const ROLLBACK_PREFIX: &'static str = "rollback:";

    /// Open or create the store in an existing database.
    pub fn open(db: &sled::Db) -> Result<Self> {
        let tree = db.open_tree(Self::TREE_NAME)?;
        Ok(Self { tree })
    }

    /// Open or create a database at `path` and the store inside it.
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self> {
        let db = sled::open(path)?;
        Self::open(&db)
    }

    /// Flush pending writes to disk.
    pub fn flush(&self) -> Result<()> {
        self.tree.flush()?;
        Ok(())
    }

    fn key(prefix: &str, id: &str) -> Vec<u8> {
        format!("{prefix}{id}").into_bytes()
    }

    fn scan<T: serde::de::DeserializeOwned>(&self, prefix: &str) -> Result<Vec<T>> {
        let mut out = Vec::new();
        for entry in self.tree.scan_prefix(prefix.as_bytes()) {
            let (_, value) = entry?;
            out.push(serde_json::from_slice(&value)?);
        }
        Ok(out)
    }
}

impl BackupStore for SledBackupStore {
    fn save_backup(&self, manifest: &BackupManifest, payload: &[u8]) -> Result<()> {
        let value = serde_json::to_vec(manifest)?;
        self.tree
            .insert(Self::key(Self::PAYLOAD_PREFIX, &manifest.backup_id), payload)?;
        self.tree
            .insert(Self::key(Self::MANIFEST_PREFIX, &manifest.backup_id), value)?;
        Ok(())
    }

    fn load_manifest(&self, backup_id: &str) -> Result<Option<BackupManifest>> {
        match self.tree.get(Self::key(Self::MANIFEST_PREFIX, backup_id))? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn load_payload(&self, backup_id: &str) -> Result<Option<Vec<u8>>> {
        Ok(self
            .tree
            .get(Self::key(Self::PAYLOAD_PREFIX, backup_id))?
            .map(|bytes| bytes.to_vec()))
    }

    fn list_manifests(&self) -> Result<Vec<BackupManifest>> {
        let mut manifests: Vec<BackupManifest> = self.scan(Self::MANIFEST_PREFIX)?;
        manifests.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(manifests)
    }

    fn save_run(&self, run: &RollbackRun) -> Result<()> {
        let value = serde_json::to_vec(run)?;
        self.tree
            .insert(Self::key(Self::ROLLBACK_PREFIX, &run.rollback_id), value)?;
        Ok(())
    }

    fn load_run(&self, rollback_id: &str) -> Result<Option<RollbackRun>> {
        match self.tree.get(Self::key(Self::ROLLBACK_PREFIX, rollback_id))? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn list_runs(&self) -> Result<Vec<RollbackRun>> {
        let mut runs: Vec<RollbackRun> = self.scan(Self::ROLLBACK_PREFIX)?;
        runs.sort_by(|a, b| a.started_at.cmp(&b.started_at));
        Ok(runs)
    }
}
