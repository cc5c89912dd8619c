//! Build orchestration.

pub mod pipeline;

pub use pipeline::{BuildPipeline, BuildReport, BuildStage, PipelineOptions, PlannedBuild};
