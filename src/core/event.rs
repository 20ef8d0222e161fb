//! Progress events emitted while a deployment runs

use crate::core::{
    request::Verbosity,
    state::FailureCode,
    step::StepKind,
};
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

/// Events that can occur during a deployment
#[derive(Debug, Clone, PartialEq)]
pub enum DeployEvent {
    PipelineStarted {
        run_id: Uuid,
        reference: String,
        path: PathBuf,
        dry_run: bool,
    },
    StepStarted {
        step: StepKind,
        message: String,
    },
    CommandStarted {
        step: StepKind,
        command: String,
    },
    StepSkipped {
        step: StepKind,
        reason: String,
    },
    StepCompleted {
        step: StepKind,
    },
    StepFailed {
        step: StepKind,
        code: FailureCode,
        message: String,
        command: Option<String>,
        output: Vec<String>,
    },
    PipelineCompleted {
        run_id: Uuid,
        success: bool,
    },
}

impl DeployEvent {
    /// Lowest verbosity at which the event is shown
    pub fn min_verbosity(&self) -> Verbosity {
        match self {
            DeployEvent::StepFailed { .. } => Verbosity::Quiet,
            DeployEvent::PipelineCompleted { success: false, .. } => Verbosity::Quiet,
            DeployEvent::CommandStarted { .. } | DeployEvent::StepCompleted { .. } => {
                Verbosity::Verbose
            }
            _ => Verbosity::Normal,
        }
    }
}

/// Type for event handlers
pub type EventHandler = Arc<dyn Fn(&DeployEvent) + Send + Sync>;

/// Delivers events to handlers, filtered by the run's verbosity
#[derive(Clone)]
pub struct EventEmitter {
    handlers: Vec<EventHandler>,
    verbosity: Verbosity,
}

impl EventEmitter {
    pub fn new(handlers: Vec<EventHandler>, verbosity: Verbosity) -> Self {
        Self {
            handlers,
            verbosity,
        }
    }

    /// Emitter that drops everything
    pub fn silent() -> Self {
        Self::new(Vec::new(), Verbosity::Quiet)
    }

    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    /// Emit an event to all handlers, if the verbosity allows it
    pub fn emit(&self, event: DeployEvent) {
        if event.min_verbosity() > self.verbosity {
            return;
        }
        for handler in &self.handlers {
            handler(&event);
        }
    }
}

impl std::fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventEmitter")
            .field("handlers", &self.handlers.len())
            .field("verbosity", &self.verbosity)
            .finish()
    }
}
