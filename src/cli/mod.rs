//! Command-line interface

pub mod output;

use crate::core::request::{Decision, DeploymentRequest, RequestError, Verbosity};
use clap::{ArgAction, Parser};
use std::ffi::OsString;
use std::path::PathBuf;

/// Deploy a tag or branch of an application checkout
#[derive(Debug, Parser, Clone)]
#[command(name = "deploy")]
#[command(version = "0.1.0")]
#[command(about = "Deploy a tag or branch to an application checkout", long_about = None)]
pub struct Cli {
    /// Tag or branch to deploy
    pub reference: String,

    /// Target checkout (defaults to the current directory)
    pub path: Option<PathBuf>,

    /// Show what would run without changing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Run the database update without asking
    #[arg(long, conflicts_with = "no_update_db")]
    pub update_db: bool,

    /// Never run the database update
    #[arg(long)]
    pub no_update_db: bool,

    /// Restart this worker without asking
    #[arg(long, value_name = "NAME", conflicts_with = "no_restart_worker")]
    pub restart_worker: Option<String>,

    /// Never restart a worker
    #[arg(long)]
    pub no_restart_worker: bool,

    /// Show every command (-vv also enables debug logs)
    #[arg(short, long, action = ArgAction::Count, conflicts_with = "quiet")]
    pub verbose: u8,

    /// Only report failures
    #[arg(short, long)]
    pub quiet: bool,

    /// Deployment configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print the outcome as JSON
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    /// Parse CLI arguments from environment
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Parse CLI arguments from a slice
    pub fn try_parse_from<I, T>(itr: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(itr)
    }

    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else if self.verbose > 0 {
            Verbosity::Verbose
        } else {
            Verbosity::Normal
        }
    }

    /// Target path, falling back to the current directory
    pub fn target(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(|| PathBuf::from("."))
    }

    /// Build the immutable request for this invocation
    pub fn to_request(&self) -> Result<DeploymentRequest, RequestError> {
        let update_database = Decision::from_flags(self.update_db.then_some(true), self.no_update_db);
        let restart_worker = Decision::from_flags(self.restart_worker.clone(), self.no_restart_worker);

        Ok(DeploymentRequest::new(self.reference.clone(), self.target())?
            .with_dry_run(self.dry_run)
            .with_verbosity(self.verbosity())
            .with_database_update(update_database)
            .with_worker_restart(restart_worker))
    }
}
