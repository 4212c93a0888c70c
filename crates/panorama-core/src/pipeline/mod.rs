pub mod config;
mod orchestrator;
mod types;

pub use orchestrator::{run_pipeline, run_pipeline_reported};
pub use types::{NoOpReporter, PipelineOutput, PipelineStage, ProgressReporter};
