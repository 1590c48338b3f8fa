//! Utilities for working with Arrow arrays.
//!
//! Checked column lookup and downcasting, plus a `with_column` helper that
//! adds or replaces a column while keeping the rest of the batch intact.

use std::sync::Arc;

use anyhow::Context;
use arrow::array::{Array, ArrayRef, Float64Array, Int32Array, Int64Array, StringArray};
use arrow::datatypes::{Field, Schema};
use arrow::record_batch::RecordBatch;

use crate::error::{PipelineError, Result};

/// Get a column from a record batch by name
pub fn get_column<'a>(batch: &'a RecordBatch, column_name: &str) -> Result<&'a ArrayRef> {
    let idx = batch
        .schema()
        .index_of(column_name)
        .map_err(|_| PipelineError::column_not_found(column_name))?;
    Ok(batch.column(idx))
}

/// Downcast a column to a specific array type with clear error messages
pub fn downcast_array<'a, A: Array + 'static>(
    array: &'a ArrayRef,
    column_name: &str,
    expected_type_name: &str,
) -> Result<&'a A> {
    array
        .as_any()
        .downcast_ref::<A>()
        .ok_or_else(|| PipelineError::column_type(column_name, expected_type_name).into())
}

/// Get a `Utf8` column by name
pub fn string_column<'a>(batch: &'a RecordBatch, column_name: &str) -> Result<&'a StringArray> {
    downcast_array::<StringArray>(get_column(batch, column_name)?, column_name, "String")
}

/// Get an `Int64` column by name
pub fn int64_column<'a>(batch: &'a RecordBatch, column_name: &str) -> Result<&'a Int64Array> {
    downcast_array::<Int64Array>(get_column(batch, column_name)?, column_name, "Int64")
}

/// Get an `Int32` column by name
pub fn int32_column<'a>(batch: &'a RecordBatch, column_name: &str) -> Result<&'a Int32Array> {
    downcast_array::<Int32Array>(get_column(batch, column_name)?, column_name, "Int32")
}

/// Get a `Float64` column by name
pub fn float64_column<'a>(batch: &'a RecordBatch, column_name: &str) -> Result<&'a Float64Array> {
    downcast_array::<Float64Array>(get_column(batch, column_name)?, column_name, "Float64")
}

/// Add a column to a batch, replacing any existing column of the same name
///
/// A replaced column keeps its position; a new one is appended.
pub fn with_column(batch: &RecordBatch, field: Field, array: ArrayRef) -> Result<RecordBatch> {
    let schema = batch.schema();
    let mut fields = schema.fields().to_vec();
    let mut columns = batch.columns().to_vec();

    match schema.index_of(field.name()) {
        Ok(idx) => {
            fields[idx] = Arc::new(field);
            columns[idx] = array;
        }
        Err(_) => {
            fields.push(Arc::new(field));
            columns.push(array);
        }
    }

    RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)
        .with_context(|| "Failed to create batch with derived column")
}

/// Keep only the named columns, in the given order
pub fn select_columns(batch: &RecordBatch, columns: &[&str]) -> Result<RecordBatch> {
    let indices = columns
        .iter()
        .map(|name| {
            batch
                .schema()
                .index_of(name)
                .map_err(|_| PipelineError::column_not_found(name).into())
        })
        .collect::<Result<Vec<_>>>()?;

    batch
        .project(&indices)
        .with_context(|| format!("Failed to project columns {columns:?}"))
}
