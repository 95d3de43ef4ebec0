// file: src/storage/mod.rs
// description: columnar storage module exports
// reference: internal module structure

pub mod columnar;
pub mod schema;

pub use columnar::{read_records, write_records};
pub use schema::{EMBEDDING_COLUMN, ID_COLUMN, SEARCH_TEXT_COLUMN, embedding_schema};
