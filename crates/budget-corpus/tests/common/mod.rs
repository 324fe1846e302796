//! Shared fixtures for budget-corpus integration tests

#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::{
    ArrayRef, FixedSizeListBuilder, Float32Builder, Float64Array, Float64Builder, Int64Array,
    LargeStringArray, ListBuilder, StringArray,
};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

/// One fixture project row
pub struct FixtureRow {
    pub id: String,
    pub name: String,
    pub budget: Option<f64>,
    pub overview: Vec<f32>,
    pub situation: Vec<f32>,
}

impl FixtureRow {
    pub fn new(id: &str, budget: Option<f64>, overview: Vec<f32>, situation: Vec<f32>) -> Self {
        Self {
            id: id.to_string(),
            name: format!("事業{}", id),
            budget,
            overview,
            situation,
        }
    }
}

/// `n` rows with distinct 3-dimensional vectors
pub fn numbered_rows(n: usize) -> Vec<FixtureRow> {
    (0..n)
        .map(|i| {
            let x = i as f32 + 1.0;
            FixtureRow::new(
                &format!("{:04}", i),
                Some(100.0 * x as f64),
                vec![x, 1.0, 0.5],
                vec![1.0, x, 0.0],
            )
        })
        .collect()
}

fn vector_literal(v: &[f32]) -> String {
    let parts: Vec<String> = v.iter().map(|x| format!("{:?}", x)).collect();
    format!("[{}]", parts.join(", "))
}

pub fn write_csv(dir: &Path, name: &str, rows: &[FixtureRow]) -> PathBuf {
    let path = dir.join(name);
    let mut file = File::create(&path).unwrap();
    writeln!(
        file,
        "予算事業ID,事業名,府省庁,当初予算,事業の概要,事業概要URL,embedding_sum,embedding_ass"
    )
    .unwrap();
    for row in rows {
        writeln!(
            file,
            "{},{},総務省,{},概要{},https://example.go.jp/{},\"{}\",\"{}\"",
            row.id,
            row.name,
            row.budget.map(|b| b.to_string()).unwrap_or_default(),
            row.id,
            row.id,
            vector_literal(&row.overview),
            vector_literal(&row.situation),
        )
        .unwrap();
    }
    path
}

pub fn write_parquet(dir: &Path, name: &str, rows: &[FixtureRow]) -> PathBuf {
    let path = dir.join(name);

    let ids: ArrayRef = Arc::new(StringArray::from(
        rows.iter().map(|r| r.id.as_str()).collect::<Vec<_>>(),
    ));
    let names: ArrayRef = Arc::new(StringArray::from(
        rows.iter().map(|r| r.name.as_str()).collect::<Vec<_>>(),
    ));
    let budgets: ArrayRef = Arc::new(Float64Array::from(
        rows.iter().map(|r| r.budget).collect::<Vec<_>>(),
    ));

    let mut overview = ListBuilder::new(Float32Builder::new());
    let mut situation = ListBuilder::new(Float32Builder::new());
    for row in rows {
        overview.values().append_slice(&row.overview);
        overview.append(true);
        situation.values().append_slice(&row.situation);
        situation.append(true);
    }
    let overview: ArrayRef = Arc::new(overview.finish());
    let situation: ArrayRef = Arc::new(situation.finish());

    write_batch(
        &path,
        vec![
            ("予算事業ID", ids),
            ("事業名", names),
            ("当初予算", budgets),
            ("embedding_sum", overview),
            ("embedding_ass", situation),
        ],
    );
    path
}

/// Parquet file with non-text storage types: Int64 ids and budgets,
/// `FixedSizeList<Float64>` overview vectors and `LargeUtf8` situation literals
pub fn write_typed_parquet(dir: &Path, name: &str, rows: &[(i64, i64, [f64; 2], &str)]) -> PathBuf {
    let path = dir.join(name);

    let ids: ArrayRef = Arc::new(Int64Array::from(
        rows.iter().map(|r| r.0).collect::<Vec<_>>(),
    ));
    let budgets: ArrayRef = Arc::new(Int64Array::from(
        rows.iter().map(|r| r.1).collect::<Vec<_>>(),
    ));

    let mut overview = FixedSizeListBuilder::new(Float64Builder::new(), 2);
    for row in rows {
        overview.values().append_slice(&row.2);
        overview.append(true);
    }
    let overview: ArrayRef = Arc::new(overview.finish());
    let situation: ArrayRef = Arc::new(LargeStringArray::from(
        rows.iter().map(|r| r.3).collect::<Vec<_>>(),
    ));

    write_batch(
        &path,
        vec![
            ("予算事業ID", ids),
            ("当初予算", budgets),
            ("embedding_sum", overview),
            ("embedding_ass", situation),
        ],
    );
    path
}

/// Parquet file whose overview column holds a null list at `null_row`
pub fn write_parquet_with_null_vector(dir: &Path, name: &str, rows: usize, null_row: usize) -> PathBuf {
    let path = dir.join(name);

    let ids: ArrayRef = Arc::new(StringArray::from(
        (0..rows).map(|i| format!("{:04}", i)).collect::<Vec<_>>(),
    ));

    let mut overview = ListBuilder::new(Float32Builder::new());
    let mut situation = ListBuilder::new(Float32Builder::new());
    for i in 0..rows {
        if i == null_row {
            overview.append(false);
        } else {
            overview.values().append_slice(&[1.0, 0.0]);
            overview.append(true);
        }
        situation.values().append_slice(&[0.0, 1.0]);
        situation.append(true);
    }
    let overview: ArrayRef = Arc::new(overview.finish());
    let situation: ArrayRef = Arc::new(situation.finish());

    write_batch(
        &path,
        vec![
            ("予算事業ID", ids),
            ("embedding_sum", overview),
            ("embedding_ass", situation),
        ],
    );
    path
}

fn write_batch(path: &Path, columns: Vec<(&str, ArrayRef)>) {
    let batch = RecordBatch::try_from_iter(columns).unwrap();

    let file = File::create(path).unwrap();
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None).unwrap();
    writer.write(&batch).unwrap();
    writer.close().unwrap();
}

/// Write `body` verbatim; for CSV layouts the row fixtures cannot express
pub fn write_raw(dir: &Path, name: &str, body: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, body).unwrap();
    path
}

pub fn norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}
