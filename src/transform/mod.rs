//! Transformation of the loaded sources into the denormalized table.
//!
//! The steps run in a fixed order: camp status, profile fan-out, income
//! defaulting, income level, the two inner joins, and the final projection.

pub mod join;
pub mod steps;

use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::config::TransformConfig;
use crate::dataset::Dataset;
use crate::error::Result;
use crate::loader::LoadedSources;
use crate::schema::col;
use crate::utils::logging::log_stage_complete;

pub use join::inner_join;
pub use steps::{
    ACTIVE_STATUS, DENORMALIZED_COLUMNS, add_status, camps_with_status, derive_income_level,
    explode_social_shares, fill_null_income, prepare_profiles, project_denormalized,
};

/// One row of the denormalized table, for reading it back with
/// [`Dataset::to_records`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenormalizedRecord {
    pub patient_id: String,
    pub camp_id: String,
    pub donation: Option<i64>,
    pub health_score: Option<f64>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub category1: Option<String>,
    pub category2: Option<String>,
    pub category3: Option<i64>,
    pub status: String,
    pub online_follower: Option<i64>,
    pub linkedin_shared: Option<i64>,
    pub twitter_shared: Option<i64>,
    pub facebook_shared: Option<i64>,
    pub social_media_shares: Option<i64>,
    pub income: i64,
    pub income_level: String,
    pub education_score: Option<String>,
    pub age: Option<i64>,
    pub first_interaction: Option<String>,
    pub city_type: Option<String>,
    pub employer_category: Option<String>,
    pub employer_city: String,
}

/// Datasets produced by the transformer
#[derive(Debug, Clone)]
pub struct TransformOutput {
    /// Fanned-out profiles with income defaulted and levelled
    pub profiles: Dataset,
    /// The denormalized table
    pub denormalized: Dataset,
}

/// Build the denormalized table from the loaded sources
pub fn denormalize(sources: LoadedSources, config: &TransformConfig) -> Result<TransformOutput> {
    let start = Instant::now();
    let LoadedSources {
        camps,
        attendance,
        profiles,
    } = sources;

    let camps = camps_with_status(&camps)?;
    let profiles = prepare_profiles(&profiles, config.income_threshold)?.retain()?;
    log::info!(
        "Prepared {} profile rows (fan-out x{})",
        profiles.num_rows(),
        crate::schema::SOCIAL_INDICATORS.len()
    );

    let attended = inner_join(&attendance, &camps, col::CAMP_ID, "attendance_camps")?;
    let joined = inner_join(&attended, &profiles, col::PATIENT_ID, "joined")?.retain()?;
    log::info!(
        "Joined {} attendance rows into {} rows",
        attendance.num_rows(),
        joined.num_rows()
    );

    let denormalized = joined
        .map_batches("denormalized", project_denormalized)?
        .retain()?;
    log_stage_complete("Transform", denormalized.num_rows(), start.elapsed());

    Ok(TransformOutput {
        profiles,
        denormalized,
    })
}
