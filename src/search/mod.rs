// file: src/search/mod.rs
// description: semantic search module exports
// reference: internal module structure

mod index;

pub use index::{KnowledgeIndex, cosine, l2_normalize};
