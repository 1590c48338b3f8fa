//! Parquet persistence of the denormalized table
//!
//! The output location is a directory that is cleared and rewritten on every
//! run. It holds a single data file and a `_SUCCESS` marker written last.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use parquet::arrow::ArrowWriter;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use serde::Serialize;

use crate::dataset::Dataset;
use crate::error::util::{reset_directory, safe_open_file};
use crate::error::{PipelineError, Result};
use crate::utils::logging::{log_operation_complete, log_operation_start};

/// Name of the data file inside the output directory
pub const DATA_FILE: &str = "part-00000.parquet";
/// Marker written once the data file is complete
pub const SUCCESS_MARKER: &str = "_SUCCESS";

/// What the writer produced
#[derive(Debug, Clone, Serialize)]
pub struct WriteSummary {
    pub path: PathBuf,
    pub rows: usize,
    pub bytes: u64,
}

/// Write `dataset` to `dir`, replacing anything already there
pub fn write_parquet(dataset: &Dataset, dir: &Path) -> Result<WriteSummary> {
    log_operation_start(&format!("Writing {}", dataset.name()), dir);
    let start = Instant::now();

    reset_directory(dir)?;

    let path = dir.join(DATA_FILE);
    let file = File::create(&path)
        .map_err(|e| PipelineError::io(&path, e))
        .with_context(|| format!("Failed to create {}", path.display()))?;

    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();
    let mut writer = ArrowWriter::try_new(file, dataset.schema(), Some(props))
        .with_context(|| format!("Failed to create parquet writer for {}", path.display()))?;
    for batch in dataset.batches() {
        writer
            .write(batch)
            .with_context(|| format!("Failed to write batch to {}", path.display()))?;
    }
    writer
        .close()
        .with_context(|| format!("Failed to finalize {}", path.display()))?;

    let marker = dir.join(SUCCESS_MARKER);
    File::create(&marker).map_err(|e| PipelineError::io(&marker, e))?;

    let bytes = fs::metadata(&path)
        .map_err(|e| PipelineError::io(&path, e))?
        .len();
    let rows = dataset.num_rows();
    log_operation_complete("wrote", &path, rows, Some(start.elapsed()));

    Ok(WriteSummary { path, rows, bytes })
}

/// Read a directory written by [`write_parquet`] back into a dataset
pub fn read_parquet_dir(dir: &Path) -> Result<Dataset> {
    let path = dir.join(DATA_FILE);
    let file = safe_open_file(&path, "reading denormalized output")?;

    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .with_context(|| format!("Failed to read parquet file: {}", path.display()))?;
    let schema = builder.schema().clone();
    let reader = builder
        .build()
        .with_context(|| format!("Failed to build parquet reader for {}", path.display()))?;

    let batches = reader
        .collect::<std::result::Result<Vec<_>, _>>()
        .with_context(|| format!("Failed to read record batch from {}", path.display()))?;
    let schema = batches.first().map_or(schema, |b| b.schema());
    Dataset::try_new("denormalized", schema, batches)
}
