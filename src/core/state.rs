//! Execution state models

use crate::core::step::StepKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use uuid::Uuid;

/// Why a step failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureCode {
    NotARepository,
    CheckoutFailed,
    MergeFailed,
    DependencyInstallFailed,
    CacheClearFailed,
    MigrationFailed,
    RestartFailed,
}

impl FailureCode {
    /// Operator-facing headline for the failure
    pub fn headline(&self) -> &'static str {
        match self {
            FailureCode::NotARepository => "The target directory is not a git repository",
            FailureCode::CheckoutFailed => "Error while checking out the git version",
            FailureCode::MergeFailed => "Error while updating the git branch",
            FailureCode::DependencyInstallFailed => "Error while installing dependencies",
            FailureCode::CacheClearFailed => "Error while clearing the cache",
            FailureCode::MigrationFailed => "Error while running the database update",
            FailureCode::RestartFailed => "Error while restarting the worker",
        }
    }
}

impl fmt::Display for FailureCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Final state of a single step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum StepStatus {
    /// Every command of the step succeeded
    Success,
    /// The step decided not to run anything; counts as success
    Skipped { reason: String },
    /// A command failed; the pipeline stops here
    Failed { code: FailureCode, message: String },
}

impl StepStatus {
    pub fn is_failure(&self) -> bool {
        matches!(self, StepStatus::Failed { .. })
    }
}

/// Outcome of one step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub step: StepKind,
    pub status: StepStatus,

    /// Exit code of the last command run, if one ran
    pub exit_code: Option<i32>,

    /// Last command line run, rendered for display
    pub command: Option<String>,

    /// Captured combined output of the last command
    pub output: Vec<String>,

    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl StepResult {
    /// Result of a step that ran nothing
    pub fn skipped(step: StepKind, reason: impl Into<String>, started_at: DateTime<Utc>) -> Self {
        Self {
            step,
            status: StepStatus::Skipped {
                reason: reason.into(),
            },
            exit_code: None,
            command: None,
            output: Vec::new(),
            started_at,
            finished_at: Utc::now(),
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self.status, StepStatus::Skipped { .. })
    }

    /// Failure code, when the step failed
    pub fn failure_code(&self) -> Option<FailureCode> {
        match self.status {
            StepStatus::Failed { code, .. } => Some(code),
            _ => None,
        }
    }
}

/// Aggregate result of a pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineOutcome {
    /// Unique run ID, used to correlate log lines
    pub run_id: Uuid,
    pub reference: String,
    pub path: PathBuf,
    pub dry_run: bool,
    pub success: bool,

    /// Step that stopped the pipeline
    pub failed_step: Option<StepKind>,

    /// Results in execution order
    pub results: Vec<StepResult>,

    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl PipelineOutcome {
    /// Start an outcome for a new run
    pub fn begin(reference: &str, path: PathBuf, dry_run: bool) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            reference: reference.to_string(),
            path,
            dry_run,
            success: false,
            failed_step: None,
            results: Vec::new(),
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Record a step result
    ///
    /// Returns `false` when the result is a failure and the run must stop.
    pub fn record(&mut self, result: StepResult) -> bool {
        let failed = result.status.is_failure();
        if failed {
            self.failed_step = Some(result.step);
        }
        self.results.push(result);
        !failed
    }

    /// Seal the outcome
    pub fn finish(&mut self) {
        self.success = self.failed_step.is_none();
        self.finished_at = Some(Utc::now());
    }

    /// Result of the failing step
    pub fn failure(&self) -> Option<&StepResult> {
        self.results.iter().find(|r| r.status.is_failure())
    }

    /// Result of a given step, if it ran
    pub fn result_for(&self, step: StepKind) -> Option<&StepResult> {
        self.results.iter().find(|r| r.step == step)
    }

    /// Process exit code for this outcome
    pub fn exit_code(&self) -> i32 {
        if self.success {
            0
        } else {
            1
        }
    }
}
