// file: src/lib.rs
// description: library entry point and public api exports
// reference: rust library patterns
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/readme.md"))]

pub mod config;
pub mod embedding;
pub mod error;
pub mod exporter;
pub mod models;
pub mod pipeline;
pub mod search;
pub mod source;
pub mod storage;
pub mod utils;

pub use crate::config::{Config, EmbeddingConfig, PathsConfig, RetryConfig, SearchConfig};
pub use embedding::{Embedder, EmbeddingClient, RetryPolicy};
pub use error::{PipelineError, Result};
pub use exporter::{ExportSummary, JsonExporter};
pub use models::{EmbeddingRecord, SearchHit, SearchOutcome, SourceRow};
pub use pipeline::{
    BuildOutput, BuildReport, BuildStats, EmbeddingBuilder, ProgressTracker, run_build,
};
pub use search::KnowledgeIndex;
pub use storage::{read_records, write_records};
pub use utils::{OperationTimer, PerformanceMetrics, Validator};
