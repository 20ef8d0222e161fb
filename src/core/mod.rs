//! Core domain models for a deployment
//!
//! This module defines the request, steps, results and events that the
//! rest of the crate passes around.

pub mod config;
pub mod event;
pub mod request;
pub mod state;
pub mod step;

pub use config::DeployConfig;
pub use event::{DeployEvent, EventEmitter, EventHandler};
pub use request::{Decision, DeploymentRequest, RequestError, Verbosity};
pub use state::{FailureCode, PipelineOutcome, StepResult, StepStatus};
pub use step::StepKind;
