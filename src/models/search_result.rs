// file: src/models/search_result.rs
// description: Search result model with similarity scores
// reference: Used for vector similarity search results

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    /// Record id from the index
    pub id: String,

    /// Text the embedding was built from
    pub search_text: String,

    /// Cosine similarity against the query (higher is more similar)
    pub score: f64,

    /// Answer joined from the answers table, empty when unknown
    #[serde(default)]
    pub answer: String,
}

impl SearchHit {
    pub fn new(id: String, search_text: String, score: f64) -> Self {
        Self {
            id,
            search_text,
            score,
            answer: String::new(),
        }
    }

    /// Format as a summary string for display
    pub fn format_summary(&self, max_content_len: usize) -> String {
        let text = preview(&self.search_text, max_content_len);

        let mut out = format!("Score: {:.4} | id {}\n{}\n", self.score, self.id, text);
        if !self.answer.is_empty() {
            out.push_str(&format!("Answer: {}\n", preview(&self.answer, max_content_len)));
        }
        out
    }
}

fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{}...", cut)
    } else {
        text.to_string()
    }
}

/// Ranked hits plus whether the best one is confident enough to answer from
/// the knowledge base.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchOutcome {
    pub hits: Vec<SearchHit>,
    pub use_knowledge_base: bool,
}

impl SearchOutcome {
    pub fn from_hits(hits: Vec<SearchHit>, threshold: f64) -> Self {
        let use_knowledge_base = hits.first().is_some_and(|best| best.score >= threshold);
        Self {
            hits,
            use_knowledge_base,
        }
    }

    pub fn best(&self) -> Option<&SearchHit> {
        self.hits.first()
    }
}
