// file: src/exporter/json.rs
// description: json index export for embedding records

use crate::error::{PipelineError, Result};
use crate::models::EmbeddingRecord;
use crate::pipeline::check_uniform_dimension;
use crate::storage::read_records;
use chrono::Utc;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Clone, Default)]
pub struct JsonExporter {
    pretty: bool,
}

#[derive(Debug, Serialize)]
pub struct ExportSummary {
    pub exported_at: String,
    pub records: usize,
    pub dimension: usize,
    pub path: PathBuf,
}

impl JsonExporter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    /// Writes `records` as a single JSON array. Non-ASCII text is written
    /// verbatim as UTF-8. JSON has no NaN or infinity, so a record holding
    /// one is rejected before the file is created.
    pub fn export(&self, records: &[EmbeddingRecord], out: &Path) -> Result<ExportSummary> {
        if let Some(index) = records
            .iter()
            .position(|r| r.embedding.iter().any(|v| !v.is_finite()))
        {
            return Err(PipelineError::Validation(format!(
                "non-finite value inside embedding of record {}",
                index
            )));
        }

        if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| PipelineError::file(parent, e))?;
        }

        let dimension = match check_uniform_dimension(records) {
            Ok(dim) => dim,
            Err(err) => {
                warn!("Exporting index with mixed dimensions: {}", err);
                records.first().map(EmbeddingRecord::dimension).unwrap_or(0)
            }
        };

        let file = File::create(out).map_err(|e| PipelineError::file(out, e))?;
        let mut writer = BufWriter::new(file);
        if self.pretty {
            serde_json::to_writer_pretty(&mut writer, records)?;
        } else {
            serde_json::to_writer(&mut writer, records)?;
        }
        writer.flush().map_err(|e| PipelineError::file(out, e))?;

        let summary = ExportSummary {
            exported_at: Utc::now().to_rfc3339(),
            records: records.len(),
            dimension,
            path: out.to_path_buf(),
        };

        info!("Wrote {} records to {}", summary.records, out.display());
        Ok(summary)
    }

    /// Reads a Parquet embeddings file and writes it out as a JSON index.
    pub fn export_file(&self, parquet: &Path, out: &Path) -> Result<ExportSummary> {
        info!("Converting {} to JSON", parquet.display());
        let records = read_records(parquet)?;
        self.export(&records, out)
    }
}
