// file: src/models/mod.rs
// description: data models module exports
// reference: internal module structure

pub mod record;
pub mod search_result;

pub use record::{EmbeddingRecord, SourceRow};
pub use search_result::{SearchHit, SearchOutcome};
