//! Engine configuration.

use std::time::Duration;

use crate::backup::CompressionLevel;

/// Default backup retention in days.
pub const DEFAULT_BACKUP_RETENTION_DAYS: u64 = 30;

/// What `migrate`/`rollback` do when another call holds the same advisory lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LockPolicy {
    /// Wait until the lock is released (or the call is cancelled).
    #[default]
    Wait,
    /// Fail immediately with [`Error::InProgress`](crate::Error::InProgress).
    Reject,
}

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// How long a backup stays eligible for rollback.
    pub backup_retention: Duration,

    /// Compression level used when a caller does not pick one.
    pub default_compression: CompressionLevel,

    /// Deadline for each individual connector call. None disables it.
    pub call_timeout: Option<Duration>,

    /// Behaviour when an advisory lock is already held.
    pub lock_policy: LockPolicy,
}

impl EngineConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self {
            backup_retention: Duration::from_secs(DEFAULT_BACKUP_RETENTION_DAYS * 24 * 60 * 60),
            default_compression: CompressionLevel::Medium,
            call_timeout: None,
            lock_policy: LockPolicy::Wait,
        }
    }

    /// Set the backup retention.
    pub fn with_backup_retention(mut self, retention: Duration) -> Self {
        self.backup_retention = retention;
        self
    }

    /// Set the default compression level.
    pub fn with_default_compression(mut self, level: CompressionLevel) -> Self {
        self.default_compression = level;
        self
    }

    /// Set the per-call connector timeout.
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = Some(timeout);
        self
    }

    /// Disable the per-call connector timeout.
    pub fn without_call_timeout(mut self) -> Self {
        self.call_timeout = None;
        self
    }

    /// Set the lock policy.
    pub fn with_lock_policy(mut self, policy: LockPolicy) -> Self {
        self.lock_policy = policy;
        self
    }

    /// Backup retention as a chrono duration.
    pub fn retention(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.backup_retention)
            .unwrap_or_else(|_| chrono::Duration::days(DEFAULT_BACKUP_RETENTION_DAYS as i64))
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.retention(), chrono::Duration::days(30));
        assert_eq!(config.default_compression, CompressionLevel::Medium);
        assert!(config.call_timeout.is_none());
        assert_eq!(config.lock_policy, LockPolicy::Wait);
    }

    #[test]
    fn test_config_builder() {
        let config = EngineConfig::new()
            .with_backup_retention(Duration::from_secs(3600))
            .with_default_compression(CompressionLevel::High)
            .with_call_timeout(Duration::from_secs(5))
            .with_lock_policy(LockPolicy::Reject);

        assert_eq!(config.retention(), chrono::Duration::hours(1));
        assert_eq!(config.default_compression, CompressionLevel::High);
        assert_eq!(config.call_timeout, Some(Duration::from_secs(5)));
        assert_eq!(config.lock_policy, LockPolicy::Reject);

        let config = config.without_call_timeout();
        assert!(config.call_timeout.is_none());
    }
}
