//! Command-line arguments.

use std::path::PathBuf;
use std::time::Duration;

use ccbridge_core::{CompressionLevel, EngineConfig, LockPolicy};
use clap::{Parser, Subcommand, ValueEnum};

/// Default directory of the sled backup store.
pub const DEFAULT_DATA_PATH: &str = "./ccbridge-data";

/// Default backup retention in days.
pub const DEFAULT_RETENTION_DAYS: u64 = 30;

/// Command-line arguments for the engine.
#[derive(Parser, Debug)]
#[command(name = "ccbridge")]
#[command(version, about = "Contact-center migration and reconciliation engine", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Path to the backup store directory.
    #[arg(short, long, global = true, default_value = DEFAULT_DATA_PATH)]
    pub data_path: PathBuf,

    /// Days a backup stays usable for rollback.
    #[arg(long, global = true, default_value_t = DEFAULT_RETENTION_DAYS)]
    pub retention_days: u64,

    /// Compression level used when a backup request names none.
    #[arg(long, global = true, value_enum, default_value = "medium")]
    pub compression: CompressionArg,

    /// Timeout for each connector call in seconds (0 disables).
    #[arg(long, global = true, default_value_t = 0)]
    pub call_timeout: u64,

    /// Fail instead of waiting when another migration holds the lock.
    #[arg(long, global = true)]
    pub reject_when_locked: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// List the registered operations and their input schemas.
    Operations,

    /// Run one operation against a fixture file.
    Invoke {
        /// Operation name, e.g. `migrate`.
        operation: String,

        /// Input JSON, or `@path` to read it from a file.
        #[arg(short, long, default_value = "{}")]
        input: String,

        /// JSON fixture holding the source and target entity sets.
        #[arg(short, long)]
        fixture: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CompressionArg {
    Low,
    Medium,
    High,
}

impl From<CompressionArg> for CompressionLevel {
    fn from(arg: CompressionArg) -> Self {
        match arg {
            CompressionArg::Low => CompressionLevel::Low,
            CompressionArg::Medium => CompressionLevel::Medium,
            CompressionArg::High => CompressionLevel::High,
        }
    }
}

impl Args {
    /// Convert arguments into an engine configuration.
    pub fn into_config(self) -> EngineConfig {
        let mut config = EngineConfig::new()
            .with_backup_retention(Duration::from_secs(self.retention_days * 24 * 60 * 60))
            .with_default_compression(self.compression.into());

        if self.call_timeout > 0 {
            config = config.with_call_timeout(Duration::from_secs(self.call_timeout));
        }

        if self.reject_when_locked {
            config = config.with_lock_policy(LockPolicy::Reject);
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["ccbridge", "operations"]);
        assert_eq!(args.data_path, PathBuf::from(DEFAULT_DATA_PATH));

        let config = args.into_config();
        assert_eq!(config.backup_retention, Duration::from_secs(30 * 86_400));
        assert_eq!(config.default_compression, CompressionLevel::Medium);
        assert!(config.call_timeout.is_none());
        assert_eq!(config.lock_policy, LockPolicy::Wait);
    }

    #[test]
    fn test_invoke_with_overrides() {
        let args = Args::parse_from([
            "ccbridge",
            "invoke",
            "migrate",
            "--fixture",
            "fixture.json",
            "--input",
            "@req.json",
            "--compression",
            "high",
            "--call-timeout",
            "10",
            "--reject-when-locked",
        ]);

        match &args.command {
            Command::Invoke {
                operation,
                input,
                fixture,
            } => {
                assert_eq!(operation, "migrate");
                assert_eq!(input, "@req.json");
                assert_eq!(fixture, &PathBuf::from("fixture.json"));
            }
            other => panic!("unexpected command: {other:?}"),
        }

        let config = args.into_config();
        assert_eq!(config.default_compression, CompressionLevel::High);
        assert_eq!(config.call_timeout, Some(Duration::from_secs(10)));
        assert_eq!(config.lock_policy, LockPolicy::Reject);
    }
}
