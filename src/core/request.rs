//! Deployment request - the immutable input of a pipeline run

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// How much the pipeline reports while it runs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    /// Only failures
    Quiet,
    /// Milestone messages
    #[default]
    Normal,
    /// Milestones plus every command line executed
    Verbose,
}

/// Operator intent for an optional step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision<T> {
    /// Decided up front by a flag
    Forced(T),
    /// Explicitly turned off by a flag
    Forbidden,
    /// Nothing given, ask when the step is reached
    AskOperator,
}

impl<T> Default for Decision<T> {
    fn default() -> Self {
        Decision::AskOperator
    }
}

impl<T> Decision<T> {
    /// Build a decision from a pair of force/forbid flags
    pub fn from_flags(forced: Option<T>, forbidden: bool) -> Self {
        match (forced, forbidden) {
            (_, true) => Decision::Forbidden,
            (Some(value), false) => Decision::Forced(value),
            (None, false) => Decision::AskOperator,
        }
    }
}

/// Errors raised while building a request
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("The reference to deploy must not be empty")]
    EmptyReference,

    #[error("Invalid reference '{0}': it must not start with '-' or contain whitespace")]
    InvalidReference(String),
}

/// Everything one deployment run needs to know
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeploymentRequest {
    reference: String,
    path: PathBuf,
    dry_run: bool,
    verbosity: Verbosity,
    update_database: Decision<bool>,
    restart_worker: Decision<String>,
}

impl DeploymentRequest {
    /// Create a request for `reference` deployed into `path`
    ///
    /// The reference ends up as a positional git argument, so anything that
    /// git could read as an option is rejected here.
    pub fn new(reference: impl Into<String>, path: impl Into<PathBuf>) -> Result<Self, RequestError> {
        let reference = reference.into();
        validate_reference(&reference)?;

        Ok(Self {
            reference,
            path: path.into(),
            dry_run: false,
            verbosity: Verbosity::default(),
            update_database: Decision::AskOperator,
            restart_worker: Decision::AskOperator,
        })
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    pub fn with_database_update(mut self, decision: Decision<bool>) -> Self {
        self.update_database = decision;
        self
    }

    pub fn with_worker_restart(mut self, decision: Decision<String>) -> Self {
        self.restart_worker = decision;
        self
    }

    /// Tag or branch to deploy
    pub fn reference(&self) -> &str {
        &self.reference
    }

    /// Application checkout the deployment targets
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    pub fn update_database(&self) -> &Decision<bool> {
        &self.update_database
    }

    pub fn restart_worker(&self) -> &Decision<String> {
        &self.restart_worker
    }
}

fn validate_reference(reference: &str) -> Result<(), RequestError> {
    if reference.is_empty() {
        return Err(RequestError::EmptyReference);
    }
    if reference.starts_with('-') || reference.chars().any(|c| c.is_whitespace() || c == '\0') {
        return Err(RequestError::InvalidReference(reference.to_string()));
    }
    Ok(())
}
