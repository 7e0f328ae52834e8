//! Rollback run state.
//!
//! A run holds one step per selected component in the fixed order
//! Users, Queues, Flows, Bots. The run is persisted after every step
//! transition so an interrupted rollback can be inspected and resumed.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::manifest::Component;
use crate::error::{Error, Result};

/// Which components a rollback restores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RollbackScope {
    /// Every component in the backup.
    #[default]
    Full,
    /// Only the listed components.
    Partial,
}

impl fmt::Display for RollbackScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RollbackScope::Full => write!(f, "full"),
            RollbackScope::Partial => write!(f, "partial"),
        }
    }
}

impl FromStr for RollbackScope {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "full" => Ok(RollbackScope::Full),
            "partial" => Ok(RollbackScope::Partial),
            _ => Err(Error::validation(format!("unknown rollback scope '{s}'"))),
        }
    }
}

/// Status of one rollback step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    /// Not started.
    Pending,
    /// In progress.
    Running,
    /// Every record restored without issues.
    Completed,
    /// Completed with itemized issues.
    Warning,
    /// Could not complete at all.
    Failed,
    /// Not attempted because an earlier step failed.
    Skipped,
    /// Dry run; nothing written.
    Simulated,
}

impl StepStatus {
    /// Whether the step does not need to run again.
    pub fn is_done(&self) -> bool {
        matches!(
            self,
            StepStatus::Completed | StepStatus::Warning | StepStatus::Simulated
        )
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepStatus::Pending => write!(f, "pending"),
            StepStatus::Running => write!(f, "running"),
            StepStatus::Completed => write!(f, "completed"),
            StepStatus::Warning => write!(f, "warning"),
            StepStatus::Failed => write!(f, "failed"),
            StepStatus::Skipped => write!(f, "skipped"),
            StepStatus::Simulated => write!(f, "simulated"),
        }
    }
}

/// Overall status of a rollback run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RollbackStatus {
    Pending,
    Running,
    Completed,
    CompletedWithWarnings,
    Failed,
    DryRunCompleted,
}

impl fmt::Display for RollbackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RollbackStatus::Pending => write!(f, "pending"),
            RollbackStatus::Running => write!(f, "running"),
            RollbackStatus::Completed => write!(f, "completed"),
            RollbackStatus::CompletedWithWarnings => write!(f, "completed_with_warnings"),
            RollbackStatus::Failed => write!(f, "failed"),
            RollbackStatus::DryRunCompleted => write!(f, "dry_run_completed"),
        }
    }
}

/// One component step of a rollback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollbackStep {
    pub component: Component,
    pub status: StepStatus,
    pub records_processed: usize,
    /// Wall time of the step, e.g. "0.4s".
    pub duration_label: String,
    pub issues: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    /// Why the step failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RollbackStep {
    /// Create a pending step.
    pub fn new(component: Component) -> Self {
        Self {
            component,
            status: StepStatus::Pending,
            records_processed: 0,
            duration_label: String::new(),
            issues: Vec::new(),
            started_at: None,
            completed_at: None,
            error: None,
        }
    }

    /// Mark the step as started, clearing results of an earlier attempt.
    pub fn start(&mut self) {
        self.status = StepStatus::Running;
        self.started_at = Some(Utc::now());
        self.completed_at = None;
        self.records_processed = 0;
        self.issues.clear();
        self.error = None;
    }

    /// Mark the step as finished. Any issue turns it into a warning.
    pub fn complete(&mut self, records_processed: usize, issues: Vec<String>) {
        self.status = if issues.is_empty() {
            StepStatus::Completed
        } else {
            StepStatus::Warning
        };
        self.records_processed = records_processed;
        self.issues = issues;
        self.finish();
    }

    /// Mark the step as simulated by a dry run.
    pub fn simulate(&mut self, records: usize, issues: Vec<String>) {
        self.status = StepStatus::Simulated;
        self.records_processed = records;
        self.issues = issues;
        self.finish();
    }

    /// Mark the step as failed.
    pub fn fail(&mut self, error: impl Into<String>) {
        self.status = StepStatus::Failed;
        self.error = Some(error.into());
        self.finish();
    }

    /// Mark the step as skipped.
    pub fn skip(&mut self) {
        self.status = StepStatus::Skipped;
        self.duration_label = "0.0s".to_string();
    }

    fn finish(&mut self) {
        let now = Utc::now();
        self.completed_at = Some(now);
        let elapsed = self
            .started_at
            .map(|start| (now - start).num_milliseconds().max(0))
            .unwrap_or(0);
        self.duration_label = format!("{:.1}s", elapsed as f64 / 1000.0);
    }
}

/// Persistent state of one rollback invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollbackRun {
    pub rollback_id: String,
    pub backup_id: String,
    pub migration_id: String,
    pub target_env_ref: String,
    pub scope: RollbackScope,
    pub dry_run: bool,
    pub steps: Vec<RollbackStep>,
    pub status: RollbackStatus,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl RollbackRun {
    /// Create a pending run. Steps are put into rollback order.
    pub fn new(
        rollback_id: impl Into<String>,
        backup_id: impl Into<String>,
        migration_id: impl Into<String>,
        target_env_ref: impl Into<String>,
        scope: RollbackScope,
        components: &[Component],
        dry_run: bool,
    ) -> Self {
        Self {
            rollback_id: rollback_id.into(),
            backup_id: backup_id.into(),
            migration_id: migration_id.into(),
            target_env_ref: target_env_ref.into(),
            scope,
            dry_run,
            steps: Component::ordered(components)
                .into_iter()
                .map(RollbackStep::new)
                .collect(),
            status: RollbackStatus::Pending,
            started_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Start (or restart) the run.
    pub fn start(&mut self) {
        self.status = RollbackStatus::Running;
        self.completed_at = None;
    }

    /// Resolve the overall status from the step statuses.
    pub fn finish(&mut self) {
        self.status = overall_status(&self.steps, self.dry_run);
        self.completed_at = Some(Utc::now());
    }

    /// Whether the run reached a final status.
    pub fn is_terminal(&self) -> bool {
        !matches!(self.status, RollbackStatus::Pending | RollbackStatus::Running)
    }

    /// Whether `resume` has anything left to do.
    pub fn can_resume(&self) -> bool {
        !self.dry_run && self.steps.iter().any(|s| !s.status.is_done())
    }

    /// Step of a component.
    pub fn step(&self, component: Component) -> Option<&RollbackStep> {
        self.steps.iter().find(|s| s.component == component)
    }

    /// Components in step order.
    pub fn components(&self) -> Vec<Component> {
        self.steps.iter().map(|s| s.component).collect()
    }
}

/// Overall status of a set of resolved steps.
///
/// `completed_with_warnings` iff at least one step warned and none failed.
pub fn overall_status(steps: &[RollbackStep], dry_run: bool) -> RollbackStatus {
    if dry_run {
        return RollbackStatus::DryRunCompleted;
    }
    if steps.iter().any(|s| s.status == StepStatus::Failed) {
        return RollbackStatus::Failed;
    }
    if steps.iter().any(|s| s.status == StepStatus::Warning) {
        return RollbackStatus::CompletedWithWarnings;
    }
    RollbackStatus::Completed
}
