// file: src/pipeline/run.rs
// description: end-to-end build from configuration: credential, csv, embeddings, parquet
// reference: pipeline orchestration

use crate::config::Config;
use crate::embedding::EmbeddingClient;
use crate::error::Result;
use crate::pipeline::builder::EmbeddingBuilder;
use crate::pipeline::progress::BuildStats;
use crate::source::read_rows;
use crate::storage::write_records;
use crate::utils::{OperationTimer, Validator};
use std::path::PathBuf;

pub struct BuildReport {
    pub records: usize,
    pub stats: BuildStats,
    /// Requests the client had to retry.
    pub retries: usize,
    pub output: PathBuf,
}

/// Runs a full build from `config`. The credential is resolved before the
/// CSV is opened, and the CSV columns are checked before the first request;
/// the Parquet file is only written once every row has a vector.
pub async fn run_build(config: &Config, show_progress: bool, colored: bool) -> Result<BuildReport> {
    Validator::validate_batch_size(config.embedding.batch_size)?;
    Validator::validate_model_name(&config.embedding.model)?;
    config.validate()?;

    let api_key = config.api_key()?;

    let input = &config.paths.input_csv;
    Validator::validate_file_path(input)?;
    let rows = read_rows(input)?;

    let timer = OperationTimer::new("build embeddings");
    let client = EmbeddingClient::new(api_key, &config.embedding)?;
    let output = EmbeddingBuilder::new(&client, config.embedding.batch_size)
        .with_progress(show_progress, colored)
        .build(rows)
        .await?;

    write_records(&config.paths.parquet, &output.records)?;
    timer.finish_with_count(output.records.len());

    Ok(BuildReport {
        records: output.records.len(),
        stats: output.stats,
        retries: client.retries(),
        output: config.paths.parquet.clone(),
    })
}
