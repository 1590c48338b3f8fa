//! Label derivation and feature vector assembly
//!
//! `donation_label` is 1 when the donation exceeds the threshold and 0
//! otherwise; a null donation is not greater than anything and gets 0.
//! `features` is a fixed-size list of the numeric inputs, in order:
//! health score, age, category3, social media shares.

use std::sync::Arc;

use anyhow::Context;
use arrow::array::{Array, ArrayRef, BooleanArray, FixedSizeListArray, Float64Array, Int32Array};
use arrow::compute::{cast, filter_record_batch};
use arrow::datatypes::{DataType, Field, FieldRef};
use arrow::record_batch::RecordBatch;

use crate::config::{FeatureConfig, InvalidFeaturePolicy};
use crate::dataset::Dataset;
use crate::error::{PipelineError, Result};
use crate::schema::col;
use crate::utils::arrow::{downcast_array, get_column, int32_column, int64_column, with_column};

/// Numeric columns assembled into the feature vector, in vector order
pub const FEATURE_COLUMNS: [&str; 4] = [
    col::HEALTH_SCORE,
    col::AGE,
    col::CATEGORY3,
    col::SOCIAL_MEDIA_SHARES,
];

fn feature_item_field() -> FieldRef {
    Arc::new(Field::new("item", DataType::Float64, false))
}

/// Arrow type of the `features` column
#[must_use]
pub fn features_type() -> DataType {
    DataType::FixedSizeList(feature_item_field(), FEATURE_COLUMNS.len() as i32)
}

/// Add `donation_label` derived from `donation`
pub fn derive_label(batch: &RecordBatch, threshold: i64) -> Result<RecordBatch> {
    let label: Int32Array = int64_column(batch, col::DONATION)?
        .iter()
        .map(|donation| Some(i32::from(donation.is_some_and(|d| d > threshold))))
        .collect();
    with_column(
        batch,
        Field::new(col::DONATION_LABEL, DataType::Int32, false),
        Arc::new(label),
    )
}

fn feature_inputs(batch: &RecordBatch) -> Result<Vec<Float64Array>> {
    FEATURE_COLUMNS
        .iter()
        .map(|name| {
            let column = get_column(batch, name)?;
            let as_float = cast(column.as_ref(), &DataType::Float64)
                .with_context(|| format!("Error processing column '{name}'"))?;
            Ok(downcast_array::<Float64Array>(&as_float, name, "Float64")?.clone())
        })
        .collect()
}

/// Add the `features` column, applying `policy` to null inputs
///
/// `row_offset` is the index of the batch's first row within the dataset and
/// only affects error messages.
pub fn assemble_features(
    batch: &RecordBatch,
    policy: InvalidFeaturePolicy,
    row_offset: usize,
) -> Result<RecordBatch> {
    let inputs = feature_inputs(batch)?;

    let batch = match policy {
        InvalidFeaturePolicy::Error => {
            for (name, values) in FEATURE_COLUMNS.iter().zip(&inputs) {
                if let Some(row) = (0..values.len()).find(|&row| values.is_null(row)) {
                    return Err(PipelineError::InvalidFeature {
                        column: (*name).to_string(),
                        row: row_offset + row,
                    }
                    .into());
                }
            }
            batch.clone()
        }
        InvalidFeaturePolicy::Skip => {
            let keep: BooleanArray = (0..batch.num_rows())
                .map(|row| Some(inputs.iter().all(|values| values.is_valid(row))))
                .collect();
            let kept = filter_record_batch(batch, &keep)
                .context("Failed to drop rows with null features")?;
            return assemble_features(&kept, InvalidFeaturePolicy::Error, row_offset);
        }
        InvalidFeaturePolicy::Zero => batch.clone(),
    };

    let mut values = Vec::with_capacity(batch.num_rows() * FEATURE_COLUMNS.len());
    for row in 0..batch.num_rows() {
        for input in &inputs {
            values.push(if input.is_valid(row) { input.value(row) } else { 0.0 });
        }
    }

    let features = FixedSizeListArray::try_new(
        feature_item_field(),
        FEATURE_COLUMNS.len() as i32,
        Arc::new(Float64Array::from(values)) as ArrayRef,
        None,
    )
    .context("Failed to build feature vectors")?;

    with_column(
        &batch,
        Field::new(col::FEATURES, features_type(), false),
        Arc::new(features),
    )
}

/// Derive labels and feature vectors for the whole dataset
pub fn prepare_features(denormalized: &Dataset, config: &FeatureConfig) -> Result<Dataset> {
    let labeled = denormalized.map_batches("labeled", |batch| {
        derive_label(batch, config.donation_threshold)
    })?;

    // Row offsets are needed for error messages, so batches are assembled in order.
    let mut offset = 0;
    let mut batches = Vec::with_capacity(labeled.batches().len());
    for batch in labeled.batches() {
        batches.push(assemble_features(batch, config.invalid_policy, offset)?);
        offset += batch.num_rows();
    }

    let schema = match batches.first() {
        Some(batch) => batch.schema(),
        None => assemble_features(
            &RecordBatch::new_empty(labeled.schema()),
            config.invalid_policy,
            0,
        )?
        .schema(),
    };
    let batches = batches.into_iter().filter(|b| b.num_rows() > 0).collect();
    let dataset = Dataset::try_new("features", schema, batches)?;

    let dropped = denormalized.num_rows() - dataset.num_rows();
    if dropped > 0 {
        log::warn!("Dropped {dropped} rows with null feature inputs");
    }
    Ok(dataset)
}

/// Feature vectors of one batch as dense rows
pub fn feature_rows(batch: &RecordBatch, features_col: &str) -> Result<Vec<Vec<f64>>> {
    let features = downcast_array::<FixedSizeListArray>(
        get_column(batch, features_col)?,
        features_col,
        "FixedSizeList",
    )?;
    let values = downcast_array::<Float64Array>(features.values(), features_col, "Float64")?;
    let width = features.value_length() as usize;

    Ok((0..features.len())
        .map(|row| {
            let start = features.value_offset(row) as usize;
            values.values()[start..start + width].to_vec()
        })
        .collect())
}

/// Dense feature rows and labels read from the named columns
pub fn labelled_matrix(
    dataset: &Dataset,
    label_col: &str,
    features_col: &str,
) -> Result<(Vec<Vec<f64>>, Vec<i32>)> {
    let mut rows = Vec::with_capacity(dataset.num_rows());
    let mut labels = Vec::with_capacity(dataset.num_rows());

    for batch in dataset.batches() {
        rows.extend(feature_rows(batch, features_col)?);
        labels.extend(int32_column(batch, label_col)?.values().iter().copied());
    }

    Ok((rows, labels))
}

/// Dense feature rows and labels for the classifier
pub fn feature_matrix(dataset: &Dataset) -> Result<(Vec<Vec<f64>>, Vec<i32>)> {
    labelled_matrix(dataset, col::DONATION_LABEL, col::FEATURES)
}
