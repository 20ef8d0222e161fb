//! Step domain model

use crate::core::state::FailureCode;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The deployment steps, in the order the pipeline runs them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepKind {
    /// Fetch and check out the requested tag or branch
    GitUpdate,
    /// Install backend dependencies
    DependencyInstall,
    /// Install and build the frontend toolchain
    FrontendBuild,
    /// Gracefully reload the web server, dropping its opcode cache
    ServiceReload,
    /// Clear the application cache directory
    CacheInvalidate,
    /// Run the schema migration
    DatabaseMigrate,
    /// Restart a supervised worker
    WorkerRestart,
}

impl StepKind {
    /// Fixed execution order
    pub const ORDER: [StepKind; 7] = [
        StepKind::GitUpdate,
        StepKind::DependencyInstall,
        StepKind::FrontendBuild,
        StepKind::ServiceReload,
        StepKind::CacheInvalidate,
        StepKind::DatabaseMigrate,
        StepKind::WorkerRestart,
    ];

    /// Stable identifier, also used as the config section name
    pub fn id(&self) -> &'static str {
        match self {
            StepKind::GitUpdate => "git-update",
            StepKind::DependencyInstall => "dependency-install",
            StepKind::FrontendBuild => "frontend-build",
            StepKind::ServiceReload => "service-reload",
            StepKind::CacheInvalidate => "cache-invalidate",
            StepKind::DatabaseMigrate => "database-migrate",
            StepKind::WorkerRestart => "worker-restart",
        }
    }

    /// Human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            StepKind::GitUpdate => "Source update",
            StepKind::DependencyInstall => "Dependency installation",
            StepKind::FrontendBuild => "Frontend build",
            StepKind::ServiceReload => "Service reload",
            StepKind::CacheInvalidate => "Cache invalidation",
            StepKind::DatabaseMigrate => "Database migration",
            StepKind::WorkerRestart => "Worker restart",
        }
    }

    /// Code reported when a command of this step fails
    ///
    /// The git step reports finer codes through `GitError`; this is the
    /// fallback for failures that are not git-specific, like a spawn error.
    pub fn failure_code(&self) -> FailureCode {
        match self {
            StepKind::GitUpdate => FailureCode::CheckoutFailed,
            StepKind::DependencyInstall | StepKind::FrontendBuild => {
                FailureCode::DependencyInstallFailed
            }
            StepKind::ServiceReload | StepKind::CacheInvalidate => FailureCode::CacheClearFailed,
            StepKind::DatabaseMigrate => FailureCode::MigrationFailed,
            StepKind::WorkerRestart => FailureCode::RestartFailed,
        }
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
