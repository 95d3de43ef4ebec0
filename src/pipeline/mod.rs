// file: src/pipeline/mod.rs
// description: pipeline module exports and public api
// reference: pipeline orchestration

mod builder;
mod progress;
mod run;

pub use builder::{BuildOutput, EmbeddingBuilder, check_uniform_dimension};
pub use progress::{BuildStats, ProgressTracker};
pub use run::{BuildReport, run_build};
