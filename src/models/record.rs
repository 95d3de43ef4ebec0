// file: src/models/record.rs
// description: knowledge-base row and embedding record models
// reference: internal data structures

use serde::{Deserialize, Serialize};

/// One input row. Absent cells are stored as empty strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRow {
    pub id: String,
    pub search_text: String,
}

impl SourceRow {
    pub fn new(id: impl Into<String>, search_text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            search_text: search_text.into(),
        }
    }
}

/// A row paired with its embedding vector. This is the shape of every entry
/// in the JSON index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingRecord {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub search_text: String,
    #[serde(default)]
    pub embedding: Vec<f64>,
}

impl EmbeddingRecord {
    pub fn from_row(row: SourceRow, embedding: Vec<f64>) -> Self {
        Self {
            id: row.id,
            search_text: row.search_text,
            embedding,
        }
    }

    pub fn dimension(&self) -> usize {
        self.embedding.len()
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    // Indexes written by other tools may carry numeric ids.
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    })
}
