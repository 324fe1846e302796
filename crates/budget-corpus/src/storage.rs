//! Dataset readers for the historical project corpus
//!
//! The dataset is a table with one row per project: metadata columns plus two
//! embedding columns. It is read through Arrow from either Parquet or CSV, and
//! converted into typed [`ProjectRecord`]s and raw embedding rows.

use std::fs::File;
use std::io::Seek;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::{Array, ArrayRef, AsArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Field, Float32Type, Float64Type, Schema};
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use crate::config::ColumnMapping;
use crate::embeddings::parse_vector_literal;
use crate::error::{CorpusError, Result};
use crate::project::{ProjectRecord, MISSING_OVERVIEW};

/// On-disk format of a dataset file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetFormat {
    Parquet,
    Csv,
}

impl DatasetFormat {
    /// Pick the format from the file extension; anything but `.parquet` is CSV
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("parquet") => DatasetFormat::Parquet,
            _ => DatasetFormat::Csv,
        }
    }
}

/// Parsed dataset: metadata rows and the raw (not yet normalized) embeddings,
/// all index-aligned
#[derive(Debug, Default)]
pub struct DatasetTable {
    pub rows: Vec<ProjectRecord>,
    pub overview_vectors: Vec<Vec<f32>>,
    pub situation_vectors: Vec<Vec<f32>>,
}

impl DatasetTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Return the first candidate path that exists
pub fn locate(candidates: &[PathBuf]) -> Result<PathBuf> {
    candidates
        .iter()
        .find(|p| p.is_file())
        .cloned()
        .ok_or_else(|| CorpusError::DataNotFound {
            candidates: candidates.to_vec(),
        })
}

/// Read and parse a dataset file
///
/// Fails on the first row whose embedding cannot be parsed; a partially read
/// table is never returned.
pub fn read_dataset(path: &Path, columns: &ColumnMapping) -> Result<DatasetTable> {
    let format = DatasetFormat::from_path(path);
    tracing::debug!("Reading {:?} dataset from {}", format, path.display());

    let batches = match format {
        DatasetFormat::Parquet => read_parquet(path)?,
        DatasetFormat::Csv => read_csv(path)?,
    };

    let mut table = DatasetTable::default();
    for batch in &batches {
        append_batch(&mut table, batch, columns)?;
    }

    Ok(table)
}

fn read_parquet(path: &Path) -> Result<Vec<RecordBatch>> {
    let file = File::open(path)?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;
    let batches = reader.collect::<std::result::Result<Vec<_>, ArrowError>>()?;
    Ok(batches)
}

fn read_csv(path: &Path) -> Result<Vec<RecordBatch>> {
    use arrow::csv::reader::Format;
    use arrow::csv::ReaderBuilder;

    let mut file = File::open(path)?;
    let format = Format::default().with_header(true);
    let (inferred, _) = format.infer_schema(&mut file, Some(1))?;
    file.rewind()?;

    // Read every column as text so identifiers keep leading zeros; typed
    // columns are cast later.
    let schema = Schema::new(
        inferred
            .fields()
            .iter()
            .map(|f| Field::new(f.name(), DataType::Utf8, true))
            .collect::<Vec<_>>(),
    );

    let reader = ReaderBuilder::new(Arc::new(schema))
        .with_format(format)
        .build(file)?;
    let batches = reader.collect::<std::result::Result<Vec<_>, ArrowError>>()?;
    Ok(batches)
}

/// Convert one record batch into rows, appending to `table`
fn append_batch(table: &mut DatasetTable, batch: &RecordBatch, columns: &ColumnMapping) -> Result<()> {
    let offset = table.len();

    let ids = cast(required_column(batch, &columns.project_id)?, &DataType::Utf8)?;
    let names = optional_column(batch, &columns.project_name, &DataType::Utf8)?;
    let ministries = optional_column(batch, &columns.ministry, &DataType::Utf8)?;
    let budgets = optional_column(batch, &columns.initial_budget, &DataType::Float64)?;
    let overviews = optional_column(batch, &columns.overview, &DataType::Utf8)?;
    let urls = optional_column(batch, &columns.url, &DataType::Utf8)?;
    let overview_vectors = vector_column(batch, &columns.overview_embedding)?;
    let situation_vectors = vector_column(batch, &columns.situation_embedding)?;

    for i in 0..batch.num_rows() {
        let row = offset + i;

        let overview_vec = read_vector(&overview_vectors, i).map_err(|e| {
            CorpusError::load(format!(
                "row {} column '{}': {}",
                row, columns.overview_embedding, e
            ))
        })?;
        let situation_vec = read_vector(&situation_vectors, i).map_err(|e| {
            CorpusError::load(format!(
                "row {} column '{}': {}",
                row, columns.situation_embedding, e
            ))
        })?;

        let budget = budgets.as_ref().and_then(|b| {
            let values = b.as_primitive::<Float64Type>();
            (!values.is_null(i)).then(|| values.value(i))
        });

        let record = ProjectRecord::new(text_at(Some(&ids), i).unwrap_or_default())
            .with_name(text_at(names.as_ref(), i).unwrap_or_default())
            .with_ministry(text_at(ministries.as_ref(), i).unwrap_or_default())
            .with_budget(budget)
            .with_overview(
                text_at(overviews.as_ref(), i).unwrap_or_else(|| MISSING_OVERVIEW.to_string()),
            )
            .with_url(text_at(urls.as_ref(), i).unwrap_or_default());

        table.rows.push(record);
        table.overview_vectors.push(overview_vec);
        table.situation_vectors.push(situation_vec);
    }

    Ok(())
}

fn required_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a ArrayRef> {
    batch
        .column_by_name(name)
        .ok_or_else(|| CorpusError::load(format!("missing required column '{}'", name)))
}

/// Look up a column and cast it; invalid values become nulls
fn optional_column(batch: &RecordBatch, name: &str, to: &DataType) -> Result<Option<ArrayRef>> {
    match batch.column_by_name(name) {
        Some(column) => Ok(Some(cast(column, to)?)),
        None => Ok(None),
    }
}

/// Embedding column, with any string flavor cast to plain Utf8
fn vector_column(batch: &RecordBatch, name: &str) -> Result<ArrayRef> {
    let column = required_column(batch, name)?;
    match column.data_type() {
        DataType::Utf8 => Ok(Arc::clone(column)),
        DataType::LargeUtf8 | DataType::Utf8View => Ok(cast(column, &DataType::Utf8)?),
        DataType::List(_) | DataType::LargeList(_) | DataType::FixedSizeList(_, _) => {
            Ok(Arc::clone(column))
        }
        other => Err(CorpusError::load(format!(
            "column '{}' has type {} and cannot hold embeddings",
            name, other
        ))),
    }
}

/// Non-null, non-blank text at `row`
fn text_at(column: Option<&ArrayRef>, row: usize) -> Option<String> {
    let strings = column?.as_string::<i32>();
    if strings.is_null(row) {
        return None;
    }
    let value = strings.value(row);
    (!value.trim().is_empty()).then(|| value.to_string())
}

fn read_vector(column: &ArrayRef, row: usize) -> std::result::Result<Vec<f32>, String> {
    if column.is_null(row) {
        return Err("missing vector".to_string());
    }

    let values = match column.data_type() {
        DataType::Utf8 => {
            let text = column.as_string::<i32>().value(row);
            return parse_vector_literal(text).map_err(|e| match e {
                CorpusError::Load { message, .. } => message,
                other => other.to_string(),
            });
        }
        DataType::List(_) => column.as_list::<i32>().value(row),
        DataType::LargeList(_) => column.as_list::<i64>().value(row),
        DataType::FixedSizeList(_, _) => column.as_fixed_size_list().value(row),
        other => return Err(format!("unsupported vector type {}", other)),
    };

    let floats = cast(&values, &DataType::Float32).map_err(|e| e.to_string())?;
    let floats = floats.as_primitive::<Float32Type>();
    if floats.is_empty() {
        return Err("empty vector".to_string());
    }
    if floats.null_count() > 0 {
        return Err("vector contains null elements".to_string());
    }

    Ok(floats.values().to_vec())
}
