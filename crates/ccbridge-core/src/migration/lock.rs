//! Advisory locks serializing overlapping migrate and rollback calls.
//!
//! A lock is keyed by `(source org, target environment, entity type)` and held
//! for the whole call. Migrate takes the key of its entity type; rollback takes
//! the keys of every component it restores, so the two exclude each other.
//! Entries are removed from the registry once the last holder or waiter is
//! gone.

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio_util::sync::CancellationToken;

use crate::config::LockPolicy;
use crate::error::{Error, Result};
use crate::model::EntityType;

/// Key of one advisory lock.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LockKey {
    pub source_ref: String,
    pub target_env: String,
    pub entity_type: EntityType,
}

impl LockKey {
    /// Lock key for writing one entity type into an environment.
    pub fn migration(source_ref: &str, target_env: &str, entity_type: EntityType) -> Self {
        Self {
            source_ref: source_ref.to_string(),
            target_env: target_env.to_string(),
            entity_type,
        }
    }
}

impl fmt::Display for LockKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {} ({})",
            self.source_ref, self.target_env, self.entity_type
        )
    }
}

/// Registry of advisory locks shared by every call of one engine.
#[derive(Debug, Clone, Default)]
pub struct LockRegistry {
    locks: Arc<DashMap<LockKey, Arc<Mutex<()>>>>,
}

impl LockRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the lock for `key`.
    ///
    /// With [`LockPolicy::Reject`] a held lock fails immediately with
    /// [`Error::InProgress`]. With [`LockPolicy::Wait`] the call waits until
    /// the lock is free or `cancel` fires.
    pub async fn acquire(
        &self,
        key: LockKey,
        policy: LockPolicy,
        cancel: &CancellationToken,
    ) -> Result<LockGuard> {
        let mutex = self
            .locks
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        let guard = match policy {
            LockPolicy::Reject => match mutex.clone().try_lock_owned() {
                Ok(guard) => guard,
                Err(_) => {
                    drop(mutex);
                    self.release_entry(&key);
                    return Err(Error::InProgress(key.to_string()));
                }
            },
            LockPolicy::Wait => {
                let acquired = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => None,
                    guard = mutex.clone().lock_owned() => Some(guard),
                };
                match acquired {
                    Some(guard) => guard,
                    None => {
                        drop(mutex);
                        self.release_entry(&key);
                        return Err(Error::Cancelled);
                    }
                }
            }
        };

        tracing::debug!(lock = %key, "advisory lock acquired");
        Ok(LockGuard {
            registry: self.clone(),
            key,
            guard: Some(guard),
        })
    }

    /// Acquire several locks at once.
    ///
    /// Keys are taken in sorted order with duplicates dropped, so two callers
    /// asking for overlapping sets cannot deadlock. On failure the locks
    /// already taken are released.
    pub async fn acquire_all(
        &self,
        keys: impl IntoIterator<Item = LockKey>,
        policy: LockPolicy,
        cancel: &CancellationToken,
    ) -> Result<Vec<LockGuard>> {
        let mut keys: Vec<LockKey> = keys.into_iter().collect();
        keys.sort();
        keys.dedup();

        let mut guards = Vec::with_capacity(keys.len());
        for key in keys {
            guards.push(self.acquire(key, policy, cancel).await?);
        }
        Ok(guards)
    }

    /// Whether a lock for `key` is currently held.
    pub fn is_locked(&self, key: &LockKey) -> bool {
        self.locks
            .get(key)
            .map(|m| m.try_lock().is_err())
            .unwrap_or(false)
    }

    /// Number of keys with a holder or waiter.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    /// True when no lock is held or awaited.
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }

    // Only the map itself references the mutex once every guard and waiter is gone.
    fn release_entry(&self, key: &LockKey) {
        self.locks
            .remove_if(key, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}

/// Holds an advisory lock until dropped.
#[derive(Debug)]
pub struct LockGuard {
    registry: LockRegistry,
    key: LockKey,
    guard: Option<OwnedMutexGuard<()>>,
}

impl LockGuard {
    /// Key of the held lock.
    pub fn key(&self) -> &LockKey {
        &self.key
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        // The owned guard holds a reference to the mutex; drop it first.
        self.guard.take();
        self.registry.release_entry(&self.key);
        tracing::debug!(lock = %self.key, "advisory lock released");
    }
}
