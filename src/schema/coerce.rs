//! Coercion of parsed text columns to their declared types.
//!
//! Values that do not parse as the declared type become null. Nothing is
//! rejected and no rejection count is surfaced beyond a debug log line.

use std::sync::Arc;

use anyhow::Context;
use arrow::array::{Array, ArrayRef, StringArray};
use arrow::compute::kernels::cast::{CastOptions, cast_with_options};
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use log::debug;

use crate::error::{PipelineError, Result};
use crate::schema::registry::{ColumnType, SourceSchema};

/// Convert a text array to the Arrow type of `ty`
///
/// Surrounding whitespace is trimmed before numeric parsing; anything that
/// still fails to parse is replaced by null.
pub fn coerce_column(array: &ArrayRef, ty: ColumnType) -> Result<ArrayRef> {
    let target = ty.arrow_type();
    if array.data_type() == &target {
        return Ok(array.clone());
    }

    let source: ArrayRef = match ty {
        ColumnType::String => array.clone(),
        ColumnType::Integer | ColumnType::Float => {
            let text = array
                .as_any()
                .downcast_ref::<StringArray>()
                .ok_or_else(|| PipelineError::column_type("<raw>", "Utf8"))?;
            Arc::new(
                text.iter()
                    .map(|v| v.map(str::trim).filter(|v| !v.is_empty()))
                    .collect::<StringArray>(),
            )
        }
    };

    let options = CastOptions {
        safe: true,
        ..Default::default()
    };
    cast_with_options(&source, &target, &options)
        .with_context(|| format!("Failed to cast column to {target:?}"))
}

/// Coerce a raw all-text batch to the typed schema of `source`
pub fn coerce_batch(batch: &RecordBatch, source: &SourceSchema) -> Result<RecordBatch> {
    let columns = source
        .columns
        .iter()
        .enumerate()
        .map(|(idx, def)| {
            let raw = batch.column(idx);
            let typed = coerce_column(raw, def.ty)
                .with_context(|| format!("Error processing column '{}'", def.name))?;

            let coerced_nulls = typed.null_count().saturating_sub(raw.null_count());
            if coerced_nulls > 0 {
                debug!(
                    "{}: {} malformed value(s) in '{}' coerced to null",
                    source.name, coerced_nulls, def.name
                );
            }
            if !def.nullable && typed.null_count() > 0 {
                debug!(
                    "{}: declared non-nullable column '{}' holds {} null(s)",
                    source.name,
                    def.name,
                    typed.null_count()
                );
            }
            Ok(typed)
        })
        .collect::<Result<Vec<_>>>()?;

    RecordBatch::try_new(source.arrow_schema(), columns)
        .with_context(|| format!("Failed to build typed batch for {}", source.name))
}
