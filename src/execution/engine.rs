//! Pipeline runner - drives the deployment steps in order

use crate::{
    core::{
        config::DeployConfig,
        event::{DeployEvent, EventEmitter, EventHandler},
        request::DeploymentRequest,
        state::{PipelineOutcome, StepResult, StepStatus},
        step::StepKind,
    },
    execution::StepExecutor,
    git::GitReferenceUpdater,
    process::CommandExecutor,
    prompt::ConfirmationGate,
};
use std::sync::Arc;
use tracing::{error, info};

/// Runs a deployment against one checkout
pub struct PipelineRunner {
    executor: Arc<dyn CommandExecutor>,
    git: GitReferenceUpdater,
    gate: ConfirmationGate,
    config: DeployConfig,
    event_handlers: Vec<EventHandler>,
}

impl PipelineRunner {
    pub fn new(
        executor: Arc<dyn CommandExecutor>,
        git: GitReferenceUpdater,
        gate: ConfirmationGate,
        config: DeployConfig,
    ) -> Self {
        Self {
            executor,
            git,
            gate,
            config,
            event_handlers: Vec::new(),
        }
    }

    /// Add an event handler
    pub fn add_event_handler<F>(&mut self, handler: F)
    where
        F: Fn(&DeployEvent) + Send + Sync + 'static,
    {
        self.event_handlers.push(Arc::new(handler));
    }

    pub fn config(&self) -> &DeployConfig {
        &self.config
    }

    /// Run every step in order, stopping at the first failure
    pub async fn run(&self, request: &DeploymentRequest) -> PipelineOutcome {
        let events = EventEmitter::new(self.event_handlers.clone(), request.verbosity());
        let mut outcome = PipelineOutcome::begin(
            request.reference(),
            request.path().to_path_buf(),
            request.dry_run(),
        );

        info!(
            "Starting deployment {} of {} to {}{}",
            outcome.run_id,
            request.reference(),
            request.path().display(),
            if request.dry_run() { " (dry run)" } else { "" }
        );
        events.emit(DeployEvent::PipelineStarted {
            run_id: outcome.run_id,
            reference: request.reference().to_string(),
            path: request.path().to_path_buf(),
            dry_run: request.dry_run(),
        });

        let steps = StepExecutor::new(
            self.executor.as_ref(),
            &self.git,
            &self.gate,
            &self.config,
            &events,
        );

        for kind in StepKind::ORDER {
            let result = steps.execute(kind, request).await;
            report(&events, &result);
            if !outcome.record(result) {
                error!("Deployment {} stopped at step {}", outcome.run_id, kind.id());
                break;
            }
        }

        outcome.finish();
        info!(
            "Deployment {} finished (success: {})",
            outcome.run_id, outcome.success
        );
        events.emit(DeployEvent::PipelineCompleted {
            run_id: outcome.run_id,
            success: outcome.success,
        });

        outcome
    }
}

fn report(events: &EventEmitter, result: &StepResult) {
    let event = match &result.status {
        StepStatus::Success => DeployEvent::StepCompleted { step: result.step },
        StepStatus::Skipped { reason } => DeployEvent::StepSkipped {
            step: result.step,
            reason: reason.clone(),
        },
        StepStatus::Failed { code, message } => DeployEvent::StepFailed {
            step: result.step,
            code: *code,
            message: message.clone(),
            command: result.command.clone(),
            output: result.output.clone(),
        },
    };
    events.emit(event);
}
