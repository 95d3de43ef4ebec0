// file: src/source/csv_reader.rs
// description: CSV loading for knowledge-base rows with required-column checks
// reference: https://docs.rs/csv

use crate::error::{PipelineError, Result};
use crate::models::SourceRow;
use csv::{ReaderBuilder, StringRecord};
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

pub const REQUIRED_COLUMNS: [&str; 2] = ["id", "search_text"];

/// Answer columns in order of preference.
pub const ANSWER_COLUMNS: [&str; 2] = ["answer", "cleaned_answer"];

/// Sent in place of a blank `search_text`; the embeddings API rejects empty
/// strings.
pub const BLANK_TEXT_PLACEHOLDER: &str = " ";

/// Reads every row of the knowledge-base CSV in file order.
///
/// Headers are checked before any record is parsed, so a file missing `id`
/// or `search_text` fails without touching the rest of the pipeline.
pub fn read_rows(path: &Path) -> Result<Vec<SourceRow>> {
    let file = File::open(path).map_err(|e| PipelineError::file(path, e))?;
    let rows = read_rows_from(file)?;
    info!("Loaded {} rows from {}", rows.len(), path.display());
    Ok(rows)
}

pub(crate) fn read_rows_from<R: Read>(reader: R) -> Result<Vec<SourceRow>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    let [id_idx, text_idx] = REQUIRED_COLUMNS.map(|name| column_index(&headers, name));
    let (id_idx, text_idx) = (id_idx?, text_idx?);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(SourceRow {
            id: cell(&record, id_idx),
            search_text: cell(&record, text_idx),
        });
    }

    debug!("Parsed {} CSV records", rows.len());
    Ok(rows)
}

/// Loads an id to answer lookup table. Each row takes the first non-empty
/// cell of `answer` then `cleaned_answer`; rows with an empty id or no
/// answer are skipped.
pub fn read_answers(path: &Path) -> Result<HashMap<String, String>> {
    let file = File::open(path).map_err(|e| PipelineError::file(path, e))?;
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(file);

    let headers = reader.headers()?.clone();
    let id_idx = column_index(&headers, "id")?;
    let answer_idxs: Vec<usize> = ANSWER_COLUMNS
        .iter()
        .filter_map(|name| column_index(&headers, name).ok())
        .collect();
    if answer_idxs.is_empty() {
        return Err(PipelineError::MissingColumn(ANSWER_COLUMNS[0].to_string()));
    }

    let mut answers = HashMap::new();
    for record in reader.records() {
        let record = record?;
        let id = cell(&record, id_idx);
        let answer = answer_idxs
            .iter()
            .map(|&idx| cell(&record, idx))
            .find(|value| !value.is_empty());
        if let Some(answer) = answer.filter(|_| !id.is_empty()) {
            answers.insert(id, answer);
        }
    }

    info!("Loaded {} answers from {}", answers.len(), path.display());
    Ok(answers)
}

/// Request texts for `rows`, with blank cells swapped for a placeholder.
/// The stored rows keep their original text.
pub fn texts(rows: &[SourceRow]) -> Vec<&str> {
    rows.iter()
        .map(|row| {
            if row.search_text.trim().is_empty() {
                BLANK_TEXT_PLACEHOLDER
            } else {
                row.search_text.as_str()
            }
        })
        .collect()
}

fn column_index(headers: &StringRecord, name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h.trim_start_matches('\u{feff}').trim() == name)
        .ok_or_else(|| PipelineError::MissingColumn(name.to_string()))
}

fn cell(record: &StringRecord, idx: usize) -> String {
    record.get(idx).unwrap_or_default().to_string()
}
