//! Backup integrity report types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Recommendation attached to a report whose overall status is `failed`.
pub const DO_NOT_USE: &str = "do not use this backup for rollback";

/// Which checks to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrityChecks {
    #[serde(default = "enabled")]
    pub checksum: bool,
    #[serde(default = "enabled")]
    pub structure: bool,
    #[serde(default)]
    pub test_restore: bool,
}

fn enabled() -> bool {
    true
}

impl IntegrityChecks {
    /// Every check, including the sandboxed test restore.
    pub fn all() -> Self {
        Self {
            checksum: true,
            structure: true,
            test_restore: true,
        }
    }

    /// True when no check is selected.
    pub fn is_empty(&self) -> bool {
        !self.checksum && !self.structure && !self.test_restore
    }
}

impl Default for IntegrityChecks {
    fn default() -> Self {
        Self {
            checksum: true,
            structure: true,
            test_restore: false,
        }
    }
}

/// Outcome of a check. Ordered from best to worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Passed,
    Warning,
    Failed,
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckStatus::Passed => write!(f, "passed"),
            CheckStatus::Warning => write!(f, "warning"),
            CheckStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Kind of integrity check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    Checksum,
    Structure,
    TestRestore,
}

/// Result of one check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckResult {
    pub check: CheckKind,
    pub status: CheckStatus,
    pub details: Vec<String>,
}

impl CheckResult {
    /// Build a result; the status is derived from the findings.
    pub fn new(check: CheckKind, failures: Vec<String>, warnings: Vec<String>) -> Self {
        let status = if !failures.is_empty() {
            CheckStatus::Failed
        } else if !warnings.is_empty() {
            CheckStatus::Warning
        } else {
            CheckStatus::Passed
        };
        let mut details = failures;
        details.extend(warnings);
        Self {
            check,
            status,
            details,
        }
    }
}

/// Result of `validate_backup_integrity`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub backup_id: String,
    pub migration_id: String,
    pub checks: Vec<CheckResult>,
    /// Worst status among the selected checks.
    pub status: CheckStatus,
    pub usable_for_rollback: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
    pub validated_at: DateTime<Utc>,
}

impl ValidationReport {
    /// Assemble a report from check results.
    pub fn new(backup_id: &str, migration_id: &str, checks: Vec<CheckResult>) -> Self {
        let status = checks
            .iter()
            .map(|c| c.status)
            .max()
            .unwrap_or(CheckStatus::Passed);
        let usable = status != CheckStatus::Failed;
        Self {
            backup_id: backup_id.to_string(),
            migration_id: migration_id.to_string(),
            checks,
            status,
            usable_for_rollback: usable,
            recommendation: (!usable).then(|| DO_NOT_USE.to_string()),
            validated_at: Utc::now(),
        }
    }

    /// Result of one check, if it was run.
    pub fn check(&self, kind: CheckKind) -> Option<&CheckResult> {
        self.checks.iter().find(|c| c.check == kind)
    }
}
