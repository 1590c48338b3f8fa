//! Delimited file loading
//!
//! Files are parsed positionally against the registry: the header row is
//! skipped, every field is first read as text and then coerced to its
//! declared type, so malformed values end up as nulls instead of errors.
//! Rows may be shorter or longer than the registered column list. Missing
//! trailing fields are null and surplus fields are ignored.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use arrow::array::{ArrayRef, StringBuilder};
use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;
use csv::{ByteRecord, ReaderBuilder};

use crate::config::{InputPaths, LoaderConfig};
use crate::dataset::Dataset;
use crate::error::Result;
use crate::error::util::safe_open_file;
use crate::schema::{ATTENDANCE, CAMPS, PROFILES, SourceSchema, coerce_batch};
use crate::utils::logging::{log_operation_complete, log_operation_start, log_warning};

/// The three loaded input datasets
#[derive(Debug, Clone)]
pub struct LoadedSources {
    pub camps: Dataset,
    pub attendance: Dataset,
    pub profiles: Dataset,
}

/// Read one delimited file into a typed dataset
pub fn load_source(path: &Path, source: &SourceSchema, config: &LoaderConfig) -> Result<Dataset> {
    log_operation_start(&format!("Loading {}", source.name), path);
    let start = Instant::now();

    let file = safe_open_file(path, &format!("loading {}", source.name))?;
    let delimiter = u8::try_from(config.delimiter)
        .with_context(|| format!("Delimiter '{}' is not a single byte", config.delimiter))?;

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(file);

    let width = source.columns.len();
    let raw_schema = source.raw_schema();
    let mut builders = text_builders(width, config.batch_size);
    let mut pending = 0;
    let mut overlong = 0;
    let mut batches = Vec::new();
    let mut record = ByteRecord::new();

    while reader
        .read_byte_record(&mut record)
        .with_context(|| format!("Failed to read record from {}", path.display()))?
    {
        if record.len() > width {
            overlong += 1;
        }
        for (idx, builder) in builders.iter_mut().enumerate() {
            match record.get(idx).filter(|field| !field.is_empty()) {
                Some(field) => builder.append_value(String::from_utf8_lossy(field)),
                None => builder.append_null(),
            }
        }

        pending += 1;
        if pending == config.batch_size {
            batches.push(flush_batch(&mut builders, &raw_schema, source)?);
            pending = 0;
        }
    }
    if pending > 0 {
        batches.push(flush_batch(&mut builders, &raw_schema, source)?);
    }

    if overlong > 0 {
        log::debug!(
            "Ignored surplus fields on {overlong} {} rows in {}",
            source.name,
            path.display()
        );
    }

    let dataset = Dataset::try_new(source.name, source.arrow_schema(), batches)?;
    if dataset.is_empty() {
        log_warning(&format!("No {} rows found", source.name), Some(path));
    }
    log_operation_complete("loaded", path, dataset.num_rows(), Some(start.elapsed()));
    Ok(dataset)
}

fn text_builders(width: usize, capacity: usize) -> Vec<StringBuilder> {
    (0..width)
        .map(|_| StringBuilder::with_capacity(capacity, capacity * 8))
        .collect()
}

/// Drain the builders into an all-text batch and coerce it to declared types
fn flush_batch(
    builders: &mut [StringBuilder],
    raw_schema: &SchemaRef,
    source: &SourceSchema,
) -> Result<RecordBatch> {
    let columns: Vec<ArrayRef> = builders
        .iter_mut()
        .map(|builder| Arc::new(builder.finish()) as ArrayRef)
        .collect();
    let raw = RecordBatch::try_new(Arc::clone(raw_schema), columns)
        .with_context(|| format!("Failed to assemble {} batch", source.name))?;
    coerce_batch(&raw, source)
}

/// Load all three sources and mark each one for reuse
///
/// The loads run in parallel; the first failure aborts the whole load.
pub fn load_sources(paths: &InputPaths, config: &LoaderConfig) -> Result<LoadedSources> {
    let (camps, (attendance, profiles)) = rayon::join(
        || load_source(&paths.camps, &CAMPS, config),
        || {
            rayon::join(
                || load_source(&paths.attendance, &ATTENDANCE, config),
                || load_source(&paths.profiles, &PROFILES, config),
            )
        },
    );

    Ok(LoadedSources {
        camps: camps?.retain()?,
        attendance: attendance?.retain()?,
        profiles: profiles?.retain()?,
    })
}
