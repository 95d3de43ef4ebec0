// file: src/search/index.rs
// description: in-memory cosine similarity search over a JSON embeddings index

use crate::embedding::Embedder;
use crate::error::{PipelineError, Result};
use crate::models::{EmbeddingRecord, SearchHit, SearchOutcome};
use crate::source::read_answers;
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::{debug, info, warn};

const NORM_FLOOR: f64 = 1e-12;

pub struct KnowledgeIndex {
    records: Vec<EmbeddingRecord>,
    answers: HashMap<String, String>,
}

impl KnowledgeIndex {
    /// Builds an index from records, normalising each vector to unit length.
    pub fn new(mut records: Vec<EmbeddingRecord>) -> Self {
        for record in &mut records {
            l2_normalize(&mut record.embedding);
        }
        Self {
            records,
            answers: HashMap::new(),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| PipelineError::file(path, e))?;
        let records: Vec<EmbeddingRecord> = serde_json::from_reader(BufReader::new(file))?;
        info!("Loaded {} index records from {}", records.len(), path.display());
        Ok(Self::new(records))
    }

    pub fn with_answers(mut self, path: &Path) -> Result<Self> {
        self.answers = read_answers(path)?;
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Ranks all records by cosine similarity against `query` and keeps the
    /// best `top_k`. Records whose dimension differs from the query are
    /// skipped.
    pub fn search_by_vector(&self, query: &[f64], top_k: usize) -> Vec<SearchHit> {
        let mut query = query.to_vec();
        l2_normalize(&mut query);

        let mut scored: Vec<(usize, f64)> = Vec::with_capacity(self.records.len());
        let mut skipped = 0usize;
        for (idx, record) in self.records.iter().enumerate() {
            if record.embedding.len() != query.len() {
                skipped += 1;
                continue;
            }
            scored.push((idx, cosine(&query, &record.embedding)));
        }
        if skipped > 0 {
            warn!("Skipped {} records with mismatched dimension", skipped);
        }

        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored
            .into_iter()
            .take(top_k)
            .map(|(idx, score)| {
                let record = &self.records[idx];
                let mut hit = SearchHit::new(record.id.clone(), record.search_text.clone(), score);
                if let Some(answer) = self.answers.get(&record.id) {
                    hit.answer = answer.clone();
                }
                hit
            })
            .collect()
    }

    /// Embeds `query` (with `prefix` prepended) and searches the index.
    pub async fn search<E: Embedder>(
        &self,
        embedder: &E,
        query: &str,
        prefix: &str,
        top_k: usize,
        threshold: f64,
    ) -> Result<SearchOutcome> {
        let text = format!("{}{}", prefix, query);
        let mut vectors = embedder.embed_batch(&[text.as_str()]).await?;
        let vector = vectors.pop().ok_or(PipelineError::EmbeddingCountMismatch {
            expected: 1,
            actual: 0,
        })?;
        debug!("Query embedded with dimension {}", vector.len());

        let hits = self.search_by_vector(&vector, top_k);
        Ok(SearchOutcome::from_hits(hits, threshold))
    }
}

pub fn l2_normalize(vec: &mut [f64]) {
    let sum: f64 = vec.iter().map(|v| v * v).sum();
    let inv = 1.0 / sum.max(NORM_FLOOR).sqrt();
    for v in vec.iter_mut() {
        *v *= inv;
    }
}

/// Dot product; equals cosine similarity for unit vectors.
pub fn cosine(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}
