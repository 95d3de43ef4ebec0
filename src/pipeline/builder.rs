// file: src/pipeline/builder.rs
// description: batch-sequential embedding of source rows with integrity checks
// reference: pipeline orchestration

use crate::embedding::Embedder;
use crate::error::{PipelineError, Result};
use crate::models::{EmbeddingRecord, SourceRow};
use crate::pipeline::progress::{BuildStats, ProgressTracker};
use crate::source::texts;
use tracing::{debug, info};

pub struct BuildOutput {
    pub records: Vec<EmbeddingRecord>,
    pub stats: BuildStats,
}

pub struct EmbeddingBuilder<'a, E: Embedder> {
    embedder: &'a E,
    batch_size: usize,
    show_progress: bool,
    colored: bool,
}

impl<'a, E: Embedder> EmbeddingBuilder<'a, E> {
    pub fn new(embedder: &'a E, batch_size: usize) -> Self {
        Self {
            embedder,
            batch_size: batch_size.max(1),
            show_progress: false,
            colored: true,
        }
    }

    pub fn with_progress(mut self, show_progress: bool, colored: bool) -> Self {
        self.show_progress = show_progress;
        self.colored = colored;
        self
    }

    /// Embeds every row, one request per contiguous batch, and pairs the
    /// vectors back with their rows in input order.
    pub async fn build(&self, rows: Vec<SourceRow>) -> Result<BuildOutput> {
        let batch_count = rows.len().div_ceil(self.batch_size);
        info!(
            "Building embeddings for {} rows using model '{}' (batch={})",
            rows.len(),
            self.embedder.model(),
            self.batch_size
        );

        let tracker = if self.show_progress {
            ProgressTracker::with_color(batch_count, rows.len(), self.colored)
        } else {
            ProgressTracker::hidden(batch_count, rows.len())
        };

        let all_texts = texts(&rows);
        let mut embeddings: Vec<Vec<f64>> = Vec::with_capacity(rows.len());

        for (batch_idx, batch) in all_texts.chunks(self.batch_size).enumerate() {
            debug!("Embedding batch {}/{} ({} rows)", batch_idx + 1, batch_count, batch.len());
            let vectors = self.embedder.embed_batch(batch).await?;
            embeddings.extend(vectors);
            tracker.inc_batch(batch.len());
        }
        tracker.finish();

        if embeddings.len() != rows.len() {
            return Err(PipelineError::EmbeddingCountMismatch {
                expected: rows.len(),
                actual: embeddings.len(),
            });
        }

        let records: Vec<EmbeddingRecord> = rows
            .into_iter()
            .zip(embeddings)
            .map(|(row, embedding)| EmbeddingRecord::from_row(row, embedding))
            .collect();

        let dimension = check_uniform_dimension(&records)?;

        let mut stats = tracker.get_stats();
        stats.dimension = dimension;
        info!(
            "Embedded {} rows in {:.2}s ({:.1} rows/sec), vector dimension {}",
            stats.rows_embedded,
            stats.duration_secs,
            stats.rows_per_second(),
            dimension
        );

        Ok(BuildOutput { records, stats })
    }
}

/// Returns the shared embedding length, or 0 for an empty set.
pub fn check_uniform_dimension(records: &[EmbeddingRecord]) -> Result<usize> {
    let Some(first) = records.first() else {
        return Ok(0);
    };
    let expected = first.dimension();

    for (index, record) in records.iter().enumerate().skip(1) {
        if record.dimension() != expected {
            return Err(PipelineError::DimensionMismatch {
                index,
                expected,
                actual: record.dimension(),
            });
        }
    }

    Ok(expected)
}
