// file: src/source/mod.rs
// description: tabular input module exports
// reference: internal module structure

mod csv_reader;

pub use csv_reader::{REQUIRED_COLUMNS, read_answers, read_rows, texts};
