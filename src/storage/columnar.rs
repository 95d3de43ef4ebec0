// file: src/storage/columnar.rs
// description: Parquet persistence for embedding records
// reference: https://docs.rs/parquet

use crate::error::{PipelineError, Result};
use crate::models::EmbeddingRecord;
use crate::storage::schema::{
    EMBEDDING_COLUMN, ID_COLUMN, SEARCH_TEXT_COLUMN, embedding_schema, embedding_type,
};
use arrow::array::AsArray;
use arrow::compute::cast;
use arrow::datatypes::Float64Type;
use arrow_array::{Array, ArrayRef, ListArray, RecordBatch, StringArray};
use arrow_schema::DataType;
use parquet::arrow::ArrowWriter;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use std::fs::{self, File};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Writes all records as a single row group, in order.
pub fn write_records(path: &Path, records: &[EmbeddingRecord]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| PipelineError::file(parent, e))?;
    }

    let batch = to_record_batch(records)?;
    let file = File::create(path).map_err(|e| PipelineError::file(path, e))?;
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();

    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))?;
    writer.write(&batch)?;
    writer.close()?;

    info!("Saved {} records to {}", records.len(), path.display());
    Ok(())
}

/// Reads every row group back into records.
///
/// Text columns of any castable type are accepted, with nulls read as empty
/// strings. The embedding column may be a list, large list or fixed-size
/// list of floats; a null list reads as an empty vector.
pub fn read_records(path: &Path) -> Result<Vec<EmbeddingRecord>> {
    let file = File::open(path).map_err(|e| PipelineError::file(path, e))?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;

    let mut records = Vec::new();
    for batch in reader {
        let batch = batch?;
        debug!("Decoding batch of {} rows", batch.num_rows());
        decode_batch(&batch, records.len(), &mut records)?;
    }

    info!("Read {} records from {}", records.len(), path.display());
    Ok(records)
}

fn to_record_batch(records: &[EmbeddingRecord]) -> Result<RecordBatch> {
    let ids: StringArray = records.iter().map(|r| Some(r.id.as_str())).collect();
    let texts: StringArray = records
        .iter()
        .map(|r| Some(r.search_text.as_str()))
        .collect();
    let embeddings = ListArray::from_iter_primitive::<Float64Type, _, _>(
        records
            .iter()
            .map(|r| Some(r.embedding.iter().copied().map(Some))),
    );

    let columns: Vec<ArrayRef> = vec![Arc::new(ids), Arc::new(texts), Arc::new(embeddings)];
    Ok(RecordBatch::try_new(embedding_schema(), columns)?)
}

fn decode_batch(
    batch: &RecordBatch,
    offset: usize,
    out: &mut Vec<EmbeddingRecord>,
) -> Result<()> {
    let ids = string_column(batch, ID_COLUMN)?;
    let texts = string_column(batch, SEARCH_TEXT_COLUMN)?;
    let embeddings = embedding_column(batch, offset)?;

    out.extend(
        ids.into_iter()
            .zip(texts)
            .zip(embeddings)
            .map(|((id, search_text), embedding)| EmbeddingRecord {
                id,
                search_text,
                embedding,
            }),
    );
    Ok(())
}

fn string_column(batch: &RecordBatch, name: &str) -> Result<Vec<String>> {
    let Some(column) = batch.column_by_name(name) else {
        return Ok(vec![String::new(); batch.num_rows()]);
    };

    let strings = cast(column, &DataType::Utf8)?;
    Ok(strings
        .as_string::<i32>()
        .iter()
        .map(|value| value.unwrap_or_default().to_string())
        .collect())
}

fn embedding_column(batch: &RecordBatch, offset: usize) -> Result<Vec<Vec<f64>>> {
    let column = batch
        .column_by_name(EMBEDDING_COLUMN)
        .ok_or_else(|| PipelineError::MissingColumn(EMBEDDING_COLUMN.to_string()))?;

    let lists = cast(column, &embedding_type())?;
    let lists = lists.as_list::<i32>();

    let mut vectors = Vec::with_capacity(lists.len());
    for row in 0..lists.len() {
        if lists.is_null(row) {
            vectors.push(Vec::new());
            continue;
        }

        let values = lists.value(row);
        let values = values.as_primitive::<Float64Type>();
        if values.null_count() > 0 {
            return Err(PipelineError::Validation(format!(
                "null value inside embedding of record {}",
                offset + row
            )));
        }
        if values.values().iter().any(|v| !v.is_finite()) {
            return Err(PipelineError::Validation(format!(
                "non-finite value inside embedding of record {}",
                offset + row
            )));
        }
        vectors.push(values.values().to_vec());
    }

    Ok(vectors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow_array::{FixedSizeListArray, Float32Array, Int64Array};
    use arrow_schema::{Field, Schema};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn record(id: &str, text: &str, embedding: Vec<f64>) -> EmbeddingRecord {
        EmbeddingRecord {
            id: id.to_string(),
            search_text: text.to_string(),
            embedding,
        }
    }

    fn write_raw(path: &Path, batch: RecordBatch) {
        let file = File::create(path).unwrap();
        let mut writer = ArrowWriter::try_new(file, batch.schema(), None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();
    }

    #[test]
    fn test_write_then_read_preserves_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/kb_embeddings.parquet");
        let records = vec![
            record("3", "third", vec![0.25, -1.5]),
            record("1", "first", vec![0.125, 2.0]),
            record("2", "", vec![1e-7, 0.0]),
        ];

        write_records(&path, &records).unwrap();
        let back = read_records(&path).unwrap();

        assert_eq!(back, records);
    }

    #[test]
    fn test_empty_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.parquet");

        write_records(&path, &[]).unwrap();
        assert!(read_records(&path).unwrap().is_empty());
    }

    #[test]
    fn test_reads_foreign_layout_with_nulls() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("foreign.parquet");

        let item = Arc::new(Field::new("item", DataType::Float32, true));
        let schema = Arc::new(Schema::new(vec![
            Field::new("id", DataType::Int64, true),
            Field::new("search_text", DataType::Utf8, true),
            Field::new("embedding", DataType::FixedSizeList(item.clone(), 2), true),
        ]));
        let ids = Int64Array::from(vec![Some(10), None]);
        let texts = StringArray::from(vec![None, Some("hello")]);
        let values = Float32Array::from(vec![0.5, 1.0, -0.5, 2.0]);
        let embeddings = FixedSizeListArray::try_new(item, 2, Arc::new(values), None).unwrap();
        let batch = RecordBatch::try_new(
            schema,
            vec![Arc::new(ids), Arc::new(texts), Arc::new(embeddings)],
        )
        .unwrap();
        write_raw(&path, batch);

        let back = read_records(&path).unwrap();
        assert_eq!(
            back,
            vec![
                record("10", "", vec![0.5, 1.0]),
                record("", "hello", vec![-0.5, 2.0]),
            ]
        );
    }

    #[test]
    fn test_non_finite_values_are_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nan.parquet");
        let records = vec![
            record("1", "ok", vec![0.5, 0.5]),
            record("2", "bad", vec![f64::NAN, 1.0]),
        ];
        write_records(&path, &records).unwrap();

        let err = read_records(&path).unwrap_err();
        assert!(
            matches!(err, PipelineError::Validation(ref msg) if msg.contains("record 1")),
            "{err}"
        );
    }

    #[test]
    fn test_missing_embedding_column() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("no_embedding.parquet");

        let schema = Arc::new(Schema::new(vec![Field::new("id", DataType::Utf8, false)]));
        let batch =
            RecordBatch::try_new(schema, vec![Arc::new(StringArray::from(vec!["a"]))]).unwrap();
        write_raw(&path, batch);

        let err = read_records(&path).unwrap_err();
        assert!(matches!(err, PipelineError::MissingColumn(ref c) if c == "embedding"));
    }
}
