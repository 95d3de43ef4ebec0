// file: src/storage/schema.rs
// description: Arrow schema for the embeddings table
// reference: https://docs.rs/arrow-schema

use arrow_schema::{DataType, Field, Schema, SchemaRef};
use std::sync::Arc;

pub const ID_COLUMN: &str = "id";
pub const SEARCH_TEXT_COLUMN: &str = "search_text";
pub const EMBEDDING_COLUMN: &str = "embedding";

/// Item field of the embedding list column.
pub fn embedding_item_field() -> Arc<Field> {
    Arc::new(Field::new("item", DataType::Float64, true))
}

/// Variable-length list so files stay readable by pandas/pyarrow as a plain
/// list-of-floats column.
pub fn embedding_type() -> DataType {
    DataType::List(embedding_item_field())
}

pub fn embedding_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new(ID_COLUMN, DataType::Utf8, false),
        Field::new(SEARCH_TEXT_COLUMN, DataType::Utf8, false),
        Field::new(EMBEDDING_COLUMN, embedding_type(), false),
    ]))
}
