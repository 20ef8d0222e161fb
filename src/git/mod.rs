//! Git reference synchronization
//!
//! Brings a working copy to the requested tag or branch: probe, fetch,
//! checkout, then fast-forward through a merge when the checkout left HEAD on
//! a branch. Tags and raw commits are left exactly as checked out.

pub mod state;

use crate::core::{
    event::{DeployEvent, EventEmitter},
    state::FailureCode,
    step::StepKind,
};
use crate::process::{CommandExecutor, CommandLine, CommandOutput};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

pub use state::GitState;

/// Error types for git synchronization
#[derive(Debug, Clone, Error)]
pub enum GitError {
    #[error("The directory {} is not a git repository", path.display())]
    NotARepository {
        path: PathBuf,
        command: String,
        exit_code: Option<i32>,
        output: Vec<String>,
    },

    #[error("'{command}' failed{}", exit_suffix(*exit_code))]
    CheckoutFailed {
        command: String,
        exit_code: Option<i32>,
        output: Vec<String>,
    },

    #[error("'{command}' failed{}", exit_suffix(*exit_code))]
    MergeFailed {
        command: String,
        exit_code: Option<i32>,
        output: Vec<String>,
    },
}

fn exit_suffix(exit_code: Option<i32>) -> String {
    exit_code
        .map(|code| format!(" with exit code {}", code))
        .unwrap_or_default()
}

impl GitError {
    pub fn code(&self) -> FailureCode {
        match self {
            GitError::NotARepository { .. } => FailureCode::NotARepository,
            GitError::CheckoutFailed { .. } => FailureCode::CheckoutFailed,
            GitError::MergeFailed { .. } => FailureCode::MergeFailed,
        }
    }

    /// Command that failed, rendered for display
    pub fn command(&self) -> &str {
        match self {
            GitError::NotARepository { command, .. }
            | GitError::CheckoutFailed { command, .. }
            | GitError::MergeFailed { command, .. } => command,
        }
    }

    pub fn exit_code(&self) -> Option<i32> {
        match self {
            GitError::NotARepository { exit_code, .. }
            | GitError::CheckoutFailed { exit_code, .. }
            | GitError::MergeFailed { exit_code, .. } => *exit_code,
        }
    }

    /// Captured output of the failing command
    pub fn output(&self) -> &[String] {
        match self {
            GitError::NotARepository { output, .. }
            | GitError::CheckoutFailed { output, .. }
            | GitError::MergeFailed { output, .. } => output,
        }
    }
}

/// What a successful update did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitUpdate {
    /// HEAD after checkout; `None` in dry-run, where nothing was checked out
    pub state: Option<GitState>,

    /// Whether a merge against the remote branch ran
    pub merged: bool,

    /// Last command run and its result
    pub last_command: String,
    pub last_output: CommandOutput,
}

/// Result of one git invocation, or the reason it could not run
enum Invocation {
    Finished(CommandOutput),
    NotStarted(String),
}

/// Brings a working copy to a requested reference
#[derive(Clone)]
pub struct GitReferenceUpdater {
    executor: Arc<dyn CommandExecutor>,
    remote: String,
}

impl GitReferenceUpdater {
    pub fn new(executor: Arc<dyn CommandExecutor>, remote: impl Into<String>) -> Self {
        Self {
            executor,
            remote: remote.into(),
        }
    }

    pub fn remote(&self) -> &str {
        &self.remote
    }

    /// Fetch, check out `reference` and fast-forward it when it is a branch
    pub async fn update(
        &self,
        path: &Path,
        reference: &str,
        dry_run: bool,
        events: &EventEmitter,
    ) -> Result<GitUpdate, GitError> {
        // Read-only, so it runs for real even in dry-run
        self.probe(path, events).await?;

        let fetch = git(path, ["fetch", self.remote.as_str()]);
        self.run_step(&fetch, dry_run, events).await?;

        let checkout = git(path, ["checkout", reference]);
        let checkout_output = self.run_step(&checkout, dry_run, events).await?;

        if dry_run {
            debug!("Dry run, skipping HEAD classification for {}", reference);
            return Ok(GitUpdate {
                state: None,
                merged: false,
                last_command: checkout.to_string(),
                last_output: checkout_output,
            });
        }

        let state = match self.inspect(path, events).await? {
            GitState::NotARepository => {
                return Err(not_a_repository(path, &checkout, None, Vec::new()))
            }
            state => state,
        };
        info!("Checked out {} ({})", reference, state);

        if !state.is_attached() {
            return Ok(GitUpdate {
                state: Some(state),
                merged: false,
                last_command: checkout.to_string(),
                last_output: checkout_output,
            });
        }

        let upstream = format!("{}/{}", self.remote, reference);
        let merge = git(path, ["merge", upstream.as_str()]);
        events.emit(DeployEvent::CommandStarted {
            step: StepKind::GitUpdate,
            command: merge.to_string(),
        });
        let merge_output = match self.invoke(&merge, false).await {
            Invocation::Finished(output) if output.success() => output,
            Invocation::Finished(output) => {
                return Err(GitError::MergeFailed {
                    command: merge.to_string(),
                    exit_code: Some(output.exit_code),
                    output: output.lines,
                })
            }
            Invocation::NotStarted(reason) => {
                return Err(GitError::MergeFailed {
                    command: merge.to_string(),
                    exit_code: None,
                    output: vec![reason],
                })
            }
        };

        Ok(GitUpdate {
            state: Some(state),
            merged: true,
            last_command: merge.to_string(),
            last_output: merge_output,
        })
    }

    /// Read the current state of `path` without changing anything
    pub async fn inspect(&self, path: &Path, events: &EventEmitter) -> Result<GitState, GitError> {
        if self.probe(path, events).await.is_err() {
            return Ok(GitState::NotARepository);
        }

        let listing = git(path, ["branch", "--no-color"]);
        events.emit(DeployEvent::CommandStarted {
            step: StepKind::GitUpdate,
            command: listing.to_string(),
        });
        match self.invoke(&listing, false).await {
            Invocation::Finished(output) if output.success() => {
                Ok(GitState::from_branch_listing(&output.lines.join("\n")))
            }
            Invocation::Finished(output) => Err(GitError::CheckoutFailed {
                command: listing.to_string(),
                exit_code: Some(output.exit_code),
                output: output.lines,
            }),
            Invocation::NotStarted(reason) => Err(GitError::CheckoutFailed {
                command: listing.to_string(),
                exit_code: None,
                output: vec![reason],
            }),
        }
    }

    async fn probe(&self, path: &Path, events: &EventEmitter) -> Result<(), GitError> {
        let probe = git(path, ["rev-parse", "--git-dir"]);
        events.emit(DeployEvent::CommandStarted {
            step: StepKind::GitUpdate,
            command: probe.to_string(),
        });
        match self.invoke(&probe, false).await {
            Invocation::Finished(output) if output.success() => Ok(()),
            Invocation::Finished(output) => Err(not_a_repository(
                path,
                &probe,
                Some(output.exit_code),
                output.lines,
            )),
            Invocation::NotStarted(reason) => Err(not_a_repository(path, &probe, None, vec![reason])),
        }
    }

    /// Run a fetch or checkout, mapping any failure to `CheckoutFailed`
    async fn run_step(
        &self,
        command: &CommandLine,
        dry_run: bool,
        events: &EventEmitter,
    ) -> Result<CommandOutput, GitError> {
        events.emit(DeployEvent::CommandStarted {
            step: StepKind::GitUpdate,
            command: command.to_string(),
        });
        match self.invoke(command, dry_run).await {
            Invocation::Finished(output) if output.success() => Ok(output),
            Invocation::Finished(output) => Err(GitError::CheckoutFailed {
                command: command.to_string(),
                exit_code: Some(output.exit_code),
                output: output.lines,
            }),
            Invocation::NotStarted(reason) => Err(GitError::CheckoutFailed {
                command: command.to_string(),
                exit_code: None,
                output: vec![reason],
            }),
        }
    }

    async fn invoke(&self, command: &CommandLine, dry_run: bool) -> Invocation {
        match self.executor.run(command, dry_run).await {
            Ok(output) => Invocation::Finished(output),
            Err(e) => Invocation::NotStarted(e.to_string()),
        }
    }
}

/// A git command run in `path`
///
/// Forced to the C locale: HEAD classification reads the `git branch`
/// markers, which git translates.
fn git<'a>(path: &Path, args: impl IntoIterator<Item = &'a str>) -> CommandLine {
    CommandLine::new("git", args).in_dir(path).with_env("LC_ALL", "C")
}

fn not_a_repository(
    path: &Path,
    command: &CommandLine,
    exit_code: Option<i32>,
    output: Vec<String>,
) -> GitError {
    GitError::NotARepository {
        path: path.to_path_buf(),
        command: command.to_string(),
        exit_code,
        output,
    }
}
