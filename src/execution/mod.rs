//! Pipeline execution

pub mod engine;
pub mod steps;

pub use engine::PipelineRunner;
pub use steps::StepExecutor;
