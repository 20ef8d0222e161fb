//! Step executor - runs one deployment step against the target checkout

use crate::{
    core::{
        config::{DeployConfig, StepCommands},
        event::{DeployEvent, EventEmitter},
        request::DeploymentRequest,
        state::{StepResult, StepStatus},
        step::StepKind,
    },
    git::GitReferenceUpdater,
    process::{CommandExecutor, CommandLine},
    prompt::ConfirmationGate,
};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::{debug, info};

const DATABASE_QUESTION: &str = "Run the database update?";
const WORKER_QUESTION: &str = "Name of the worker to restart (leave empty to skip step):";

/// Executes single steps with the collaborators of one pipeline run
pub struct StepExecutor<'a> {
    executor: &'a dyn CommandExecutor,
    git: &'a GitReferenceUpdater,
    gate: &'a ConfirmationGate,
    config: &'a DeployConfig,
    events: &'a EventEmitter,
}

impl<'a> StepExecutor<'a> {
    pub fn new(
        executor: &'a dyn CommandExecutor,
        git: &'a GitReferenceUpdater,
        gate: &'a ConfirmationGate,
        config: &'a DeployConfig,
        events: &'a EventEmitter,
    ) -> Self {
        Self {
            executor,
            git,
            gate,
            config,
            events,
        }
    }

    /// Execute a step and return its result
    pub async fn execute(&self, kind: StepKind, request: &DeploymentRequest) -> StepResult {
        let started_at = Utc::now();
        debug!("Executing step: {}", kind.id());

        let Some(commands) = self.config.commands_for(kind) else {
            return self.git_update(request, started_at).await;
        };

        if let Some(reason) = skip_reason(commands, request) {
            info!("Skipping {}: {}", kind.id(), reason);
            return StepResult::skipped(kind, reason, started_at);
        }

        let mut variables = template_variables(self.config, request);
        match kind {
            StepKind::DatabaseMigrate => {
                if !self.gate.confirm(request.update_database(), DATABASE_QUESTION).await {
                    return StepResult::skipped(kind, "database update not requested", started_at);
                }
            }
            StepKind::WorkerRestart => {
                match self.gate.choose_name(request.restart_worker(), WORKER_QUESTION).await {
                    Some(worker) => {
                        variables.insert("worker".to_string(), worker);
                    }
                    None => return StepResult::skipped(kind, "no worker to restart", started_at),
                }
            }
            _ => {}
        }

        self.events.emit(DeployEvent::StepStarted {
            step: kind,
            message: milestone(kind, &variables),
        });

        self.run_commands(kind, commands, &variables, request, started_at).await
    }

    async fn git_update(&self, request: &DeploymentRequest, started_at: DateTime<Utc>) -> StepResult {
        let kind = StepKind::GitUpdate;
        self.events.emit(DeployEvent::StepStarted {
            step: kind,
            message: milestone(kind, &template_variables(self.config, request)),
        });

        match self
            .git
            .update(request.path(), request.reference(), request.dry_run(), self.events)
            .await
        {
            Ok(update) => StepResult {
                step: kind,
                status: StepStatus::Success,
                exit_code: Some(update.last_output.exit_code),
                command: Some(update.last_command),
                output: update.last_output.lines,
                started_at,
                finished_at: Utc::now(),
            },
            Err(e) => StepResult {
                step: kind,
                status: StepStatus::Failed {
                    code: e.code(),
                    message: e.to_string(),
                },
                exit_code: e.exit_code(),
                command: Some(e.command().to_string()),
                output: e.output().to_vec(),
                started_at,
                finished_at: Utc::now(),
            },
        }
    }

    /// Run the step's commands in order, stopping at the first failure
    async fn run_commands(
        &self,
        kind: StepKind,
        commands: &StepCommands,
        variables: &HashMap<String, String>,
        request: &DeploymentRequest,
        started_at: DateTime<Utc>,
    ) -> StepResult {
        let mut last: Option<(String, i32, Vec<String>)> = None;

        for argv in commands.render(variables) {
            let Some(command) = CommandLine::from_argv(&argv) else {
                continue;
            };
            let command = command.in_dir(request.path());
            let rendered = command.to_string();

            self.events.emit(DeployEvent::CommandStarted {
                step: kind,
                command: rendered.clone(),
            });

            let failure = match self.executor.run(&command, request.dry_run()).await {
                Ok(output) if output.success() => {
                    last = Some((rendered, output.exit_code, output.lines));
                    continue;
                }
                Ok(output) => (
                    format!("'{}' failed with exit code {}", rendered, output.exit_code),
                    Some(output.exit_code),
                    output.lines,
                ),
                Err(e) => (e.to_string(), None, vec![e.to_string()]),
            };

            let (message, exit_code, output) = failure;
            return StepResult {
                step: kind,
                status: StepStatus::Failed {
                    code: kind.failure_code(),
                    message,
                },
                exit_code,
                command: Some(rendered),
                output,
                started_at,
                finished_at: Utc::now(),
            };
        }

        let (command, exit_code, output) = match last {
            Some((command, exit_code, output)) => (Some(command), Some(exit_code), output),
            None => (None, None, Vec::new()),
        };

        StepResult {
            step: kind,
            status: StepStatus::Success,
            exit_code,
            command,
            output,
            started_at,
            finished_at: Utc::now(),
        }
    }
}

/// Reason to skip a step before anything runs, if there is one
///
/// Only looks at the filesystem, so it is evaluated the same way in dry-run.
fn skip_reason(commands: &StepCommands, request: &DeploymentRequest) -> Option<String> {
    if !commands.enabled {
        return Some("disabled in configuration".to_string());
    }

    let required = commands.requires.as_deref()?;
    if request.path().join(required).exists() {
        None
    } else {
        Some(format!("{} not found", required))
    }
}

fn template_variables(config: &DeployConfig, request: &DeploymentRequest) -> HashMap<String, String> {
    let path = request.path();
    let cache_dir = match config.cache.requires.as_deref() {
        Some(dir) => path.join(dir),
        None => path.to_path_buf(),
    };

    let mut variables = HashMap::new();
    variables.insert("path".to_string(), path.display().to_string());
    variables.insert("ref".to_string(), request.reference().to_string());
    variables.insert("cache_dir".to_string(), cache_dir.display().to_string());
    variables
}

fn milestone(kind: StepKind, variables: &HashMap<String, String>) -> String {
    match kind {
        StepKind::GitUpdate => format!(
            "Checking out the {} branch or tag",
            variables.get("ref").map(String::as_str).unwrap_or_default()
        ),
        StepKind::DependencyInstall => "Installing project dependencies".to_string(),
        StepKind::FrontendBuild => "Building frontend assets".to_string(),
        StepKind::ServiceReload => "Reloading the web server".to_string(),
        StepKind::CacheInvalidate => "Clearing the cache".to_string(),
        StepKind::DatabaseMigrate => "Updating the database".to_string(),
        StepKind::WorkerRestart => match variables.get("worker") {
            Some(worker) => format!("Restarting the worker '{}'", worker),
            None => "Restarting the worker".to_string(),
        },
    }
}
