//! Column derivations applied by the transformer.
//!
//! Each step is a pure function of its input batch. The dataset-level
//! wrappers run the step over every batch in parallel.

use std::sync::Arc;

use arrow::array::{Array, ArrayRef, Int64Array, StringArray, StringBuilder, UInt32Array};
use arrow::compute::take;
use arrow::datatypes::{DataType, Field};
use arrow::record_batch::RecordBatch;
use anyhow::Context;
use itertools::Itertools;

use crate::dataset::Dataset;
use crate::error::Result;
use crate::schema::{SOCIAL_INDICATORS, col};
use crate::utils::arrow::{int64_column, select_columns, string_column, with_column};

/// Value of the constant camp status column
pub const ACTIVE_STATUS: &str = "Active";

/// Output columns of the denormalized table, in order
pub const DENORMALIZED_COLUMNS: [&str; 23] = [
    col::PATIENT_ID,
    col::CAMP_ID,
    col::DONATION,
    col::HEALTH_SCORE,
    col::START_DATE,
    col::END_DATE,
    col::CATEGORY1,
    col::CATEGORY2,
    col::CATEGORY3,
    col::STATUS,
    col::ONLINE_FOLLOWER,
    col::LINKEDIN_SHARED,
    col::TWITTER_SHARED,
    col::FACEBOOK_SHARED,
    col::SOCIAL_MEDIA_SHARES,
    col::INCOME,
    col::INCOME_LEVEL,
    col::EDUCATION_SCORE,
    col::AGE,
    col::FIRST_INTERACTION,
    col::CITY_TYPE,
    col::EMPLOYER_CATEGORY,
    col::EMPLOYER_CITY,
];

/// Add `status = "Active"` to every camp row
pub fn add_status(batch: &RecordBatch) -> Result<RecordBatch> {
    let status: ArrayRef = Arc::new(StringArray::from(vec![ACTIVE_STATUS; batch.num_rows()]));
    with_column(batch, Field::new(col::STATUS, DataType::Utf8, false), status)
}

/// Fan each profile row out into one row per social indicator
///
/// Row `i` becomes rows `4i..4i+4`, carrying the online-follower, LinkedIn,
/// Twitter and Facebook values in `social_media_shares`. Null indicators
/// still produce a row, with a null share.
pub fn explode_social_shares(batch: &RecordBatch) -> Result<RecordBatch> {
    let indicators = SOCIAL_INDICATORS
        .iter()
        .map(|name| int64_column(batch, name))
        .collect::<Result<Vec<_>>>()?;

    let fan_out = SOCIAL_INDICATORS.len();
    let rows = batch.num_rows();
    let row_count = u32::try_from(rows).context("Profile batch too large to fan out")?;

    let indices: UInt32Array = (0..row_count)
        .flat_map(|row| std::iter::repeat_n(row, fan_out))
        .collect::<Vec<_>>()
        .into();
    let shares: Int64Array = (0..rows)
        .flat_map(|row| {
            indicators
                .iter()
                .map(move |values| values.is_valid(row).then(|| values.value(row)))
        })
        .collect();

    let columns = batch
        .columns()
        .iter()
        .map(|column| take(column.as_ref(), &indices, None))
        .collect::<std::result::Result<Vec<_>, _>>()
        .context("Failed to repeat profile rows")?;
    let repeated = RecordBatch::try_new(batch.schema(), columns)
        .context("Failed to create fanned-out profile batch")?;

    with_column(
        &repeated,
        Field::new(col::SOCIAL_MEDIA_SHARES, DataType::Int64, true),
        Arc::new(shares),
    )
}

/// Replace null income values with 0
pub fn fill_null_income(batch: &RecordBatch) -> Result<RecordBatch> {
    let income: Int64Array = int64_column(batch, col::INCOME)?
        .iter()
        .map(|v| Some(v.unwrap_or(0)))
        .collect();
    with_column(
        batch,
        Field::new(col::INCOME, DataType::Int64, true),
        Arc::new(income),
    )
}

/// Derive `income_level`: "High" when income exceeds `threshold`, else "Low"
///
/// Null income (only possible when the fill step was skipped) is "Low".
pub fn derive_income_level(batch: &RecordBatch, threshold: i64) -> Result<RecordBatch> {
    let level: StringArray = int64_column(batch, col::INCOME)?
        .iter()
        .map(|v| Some(if v.is_some_and(|income| income > threshold) { "High" } else { "Low" }))
        .collect();
    with_column(
        batch,
        Field::new(col::INCOME_LEVEL, DataType::Utf8, false),
        Arc::new(level),
    )
}

/// Join the non-null parts with a single space; both null gives ""
fn concat_ws(parts: &[Option<&str>]) -> String {
    parts.iter().flatten().join(" ")
}

/// Derive `employer_city` and keep the fixed output column list
pub fn project_denormalized(batch: &RecordBatch) -> Result<RecordBatch> {
    let employer = string_column(batch, col::EMPLOYER_CATEGORY)?;
    let city = string_column(batch, col::CITY_TYPE)?;

    let mut builder = StringBuilder::with_capacity(batch.num_rows(), batch.num_rows() * 8);
    for (employer, city) in employer.iter().zip(city.iter()) {
        builder.append_value(concat_ws(&[employer, city]));
    }

    let with_city = with_column(
        batch,
        Field::new(col::EMPLOYER_CITY, DataType::Utf8, false),
        Arc::new(builder.finish()),
    )?;
    select_columns(&with_city, &DENORMALIZED_COLUMNS)
}

/// Camps with the constant status column
pub fn camps_with_status(camps: &Dataset) -> Result<Dataset> {
    camps.map_batches("camps_with_status", add_status)
}

/// Profiles fanned out, income defaulted and income level derived
pub fn prepare_profiles(profiles: &Dataset, income_threshold: i64) -> Result<Dataset> {
    profiles
        .map_batches("profiles_exploded", explode_social_shares)?
        .map_batches("profiles_income_filled", fill_null_income)?
        .map_batches("profiles", |batch| derive_income_level(batch, income_threshold))
}
