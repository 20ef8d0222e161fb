//! deploy - Deploy a tag or branch to an application checkout

pub mod cli;
pub mod core;
pub mod execution;
pub mod git;
pub mod process;
pub mod prompt;

// Re-export commonly used types
pub use core::{
    Decision, DeployConfig, DeployEvent, DeploymentRequest, FailureCode, PipelineOutcome,
    StepKind, StepResult, StepStatus, Verbosity,
};
pub use execution::PipelineRunner;
pub use git::{GitError, GitReferenceUpdater, GitState};
pub use process::{CommandExecutor, CommandLine, CommandOutput, ExecutorError, ProcessExecutor};
pub use prompt::{ConfirmationGate, Prompter, TerminalPrompter};
