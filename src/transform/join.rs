//! Inner equi-join of two datasets on a string key.
//!
//! The right side is indexed in a hash table and the left side probes it.
//! Output rows follow left row order, then right row order within a key, so
//! identical inputs always produce identical output. Null keys never match.

use std::sync::Arc;

use anyhow::Context;
use arrow::array::{ArrayRef, UInt32Array};
use arrow::compute::take;
use arrow::datatypes::Schema;
use arrow::record_batch::RecordBatch;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::dataset::Dataset;
use crate::error::{PipelineError, Result};
use crate::utils::arrow::string_column;

type RowIndex = FxHashMap<String, SmallVec<[u32; 4]>>;

fn index_rows(batch: &RecordBatch, key: &str) -> Result<RowIndex> {
    let keys = string_column(batch, key)?;
    let mut index = RowIndex::default();
    for (row, value) in keys.iter().enumerate() {
        if let Some(value) = value {
            let row = u32::try_from(row).context("Join input too large")?;
            index.entry(value.to_string()).or_default().push(row);
        }
    }
    Ok(index)
}

/// Schema of `left ⋈ right`: all left fields, then right fields minus the key
fn joined_schema(left: &Schema, right: &Schema, key: &str) -> Result<Schema> {
    let mut fields = left.fields().to_vec();
    for field in right.fields() {
        if field.name() == key {
            continue;
        }
        if left.field_with_name(field.name()).is_ok() {
            anyhow::bail!(
                "Column '{}' exists on both sides of the join on '{key}'",
                field.name()
            );
        }
        fields.push(field.clone());
    }
    Ok(Schema::new(fields))
}

/// Inner-join `left` to `right` on the string column `key`
pub fn inner_join(left: &Dataset, right: &Dataset, key: &str, name: &str) -> Result<Dataset> {
    let left_schema = left.schema();
    let right_schema = right.schema();
    for schema in [&left_schema, &right_schema] {
        if schema.index_of(key).is_err() {
            return Err(PipelineError::column_not_found(key).into());
        }
    }
    let schema = Arc::new(joined_schema(&left_schema, &right_schema, key)?);

    let left_batch = left.to_batch()?;
    let right_batch = right.to_batch()?;
    let index = index_rows(&right_batch, key)?;

    let left_keys = string_column(&left_batch, key)?;
    let mut left_rows = Vec::with_capacity(left_batch.num_rows());
    let mut right_rows = Vec::with_capacity(left_batch.num_rows());
    for (row, value) in left_keys.iter().enumerate() {
        let Some(matches) = value.and_then(|v| index.get(v)) else {
            continue;
        };
        let row = u32::try_from(row).context("Join input too large")?;
        for &right_row in matches {
            left_rows.push(row);
            right_rows.push(right_row);
        }
    }

    if left_rows.is_empty() {
        log::info!("Join on '{key}' produced no rows for '{name}'");
        return Ok(Dataset::empty(name, schema));
    }

    let left_rows = UInt32Array::from(left_rows);
    let right_rows = UInt32Array::from(right_rows);

    let mut columns: Vec<ArrayRef> = left_batch
        .columns()
        .iter()
        .map(|column| take(column.as_ref(), &left_rows, None))
        .collect::<std::result::Result<_, _>>()
        .context("Failed to gather left join rows")?;
    for (field, column) in right_schema.fields().iter().zip(right_batch.columns()) {
        if field.name() == key {
            continue;
        }
        columns.push(
            take(column.as_ref(), &right_rows, None)
                .with_context(|| format!("Failed to gather right join column '{}'", field.name()))?,
        );
    }

    let batch = RecordBatch::try_new(schema.clone(), columns)
        .with_context(|| format!("Failed to create joined batch '{name}'"))?;
    log::debug!(
        "Joined {} x {} rows on '{key}' into {} rows",
        left_batch.num_rows(),
        right_batch.num_rows(),
        batch.num_rows()
    );
    Dataset::try_new(name, schema, vec![batch])
}
