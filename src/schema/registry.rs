//! Column definitions for the three input sources
//!
//! Each source is an ordered list of `(name, type, nullable)` triples. Files
//! are matched positionally against these lists, so the order here is the
//! order of the delimited columns on disk.

use std::sync::Arc;

use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use itertools::Itertools;

/// Column names shared by the loader, transformer and feature preparer
pub mod col {
    pub const CAMP_ID: &str = "camp_id";
    pub const START_DATE: &str = "start_date";
    pub const END_DATE: &str = "end_date";
    pub const CATEGORY1: &str = "category1";
    pub const CATEGORY2: &str = "category2";
    pub const CATEGORY3: &str = "category3";
    pub const STATUS: &str = "status";

    pub const PATIENT_ID: &str = "patient_id";
    pub const DONATION: &str = "donation";
    pub const HEALTH_SCORE: &str = "health_score";

    pub const ONLINE_FOLLOWER: &str = "online_follower";
    pub const LINKEDIN_SHARED: &str = "linkedin_shared";
    pub const TWITTER_SHARED: &str = "twitter_shared";
    pub const FACEBOOK_SHARED: &str = "facebook_shared";
    pub const INCOME: &str = "income";
    pub const EDUCATION_SCORE: &str = "education_score";
    pub const AGE: &str = "age";
    pub const FIRST_INTERACTION: &str = "first_interaction";
    pub const CITY_TYPE: &str = "city_type";
    pub const EMPLOYER_CATEGORY: &str = "employer_category";

    pub const SOCIAL_MEDIA_SHARES: &str = "social_media_shares";
    pub const INCOME_LEVEL: &str = "income_level";
    pub const EMPLOYER_CITY: &str = "employer_city";

    pub const DONATION_LABEL: &str = "donation_label";
    pub const FEATURES: &str = "features";
    pub const PREDICTION: &str = "prediction";
    pub const PROBABILITY: &str = "probability";
}

/// Semantic type of a source column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    String,
    Integer,
    Float,
}

impl ColumnType {
    /// Arrow type the column is coerced to after parsing
    #[must_use]
    pub fn arrow_type(self) -> DataType {
        match self {
            Self::String => DataType::Utf8,
            Self::Integer => DataType::Int64,
            Self::Float => DataType::Float64,
        }
    }
}

/// A single column definition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: &'static str,
    pub ty: ColumnType,
    pub nullable: bool,
}

const fn column(name: &'static str, ty: ColumnType, nullable: bool) -> ColumnDef {
    ColumnDef { name, ty, nullable }
}

/// Ordered schema of one input source
#[derive(Debug, Clone, Copy)]
pub struct SourceSchema {
    pub name: &'static str,
    pub columns: &'static [ColumnDef],
}

impl SourceSchema {
    /// Typed Arrow schema for the loaded dataset
    ///
    /// Every field is nullable: malformed values are coerced to null rather
    /// than rejected, whatever the declared nullability.
    #[must_use]
    pub fn arrow_schema(&self) -> SchemaRef {
        Arc::new(Schema::new(
            self.columns
                .iter()
                .map(|c| Field::new(c.name, c.ty.arrow_type(), true))
                .collect_vec(),
        ))
    }

    /// All-text schema used while parsing the delimited file
    #[must_use]
    pub fn raw_schema(&self) -> SchemaRef {
        Arc::new(Schema::new(
            self.columns
                .iter()
                .map(|c| Field::new(c.name, DataType::Utf8, true))
                .collect_vec(),
        ))
    }
}

/// Health camp metadata
pub const CAMPS: SourceSchema = SourceSchema {
    name: "camps",
    columns: &[
        column(col::CAMP_ID, ColumnType::String, false),
        column(col::START_DATE, ColumnType::String, true),
        column(col::END_DATE, ColumnType::String, true),
        column(col::CATEGORY1, ColumnType::String, true),
        column(col::CATEGORY2, ColumnType::String, true),
        column(col::CATEGORY3, ColumnType::Integer, true),
    ],
};

/// Attendance and donation records
pub const ATTENDANCE: SourceSchema = SourceSchema {
    name: "attendance",
    columns: &[
        column(col::PATIENT_ID, ColumnType::String, false),
        column(col::CAMP_ID, ColumnType::String, false),
        column(col::DONATION, ColumnType::Integer, true),
        column(col::HEALTH_SCORE, ColumnType::Float, true),
    ],
};

/// Patient profiles
pub const PROFILES: SourceSchema = SourceSchema {
    name: "profiles",
    columns: &[
        column(col::PATIENT_ID, ColumnType::String, false),
        column(col::ONLINE_FOLLOWER, ColumnType::Integer, true),
        column(col::LINKEDIN_SHARED, ColumnType::Integer, true),
        column(col::TWITTER_SHARED, ColumnType::Integer, true),
        column(col::FACEBOOK_SHARED, ColumnType::Integer, true),
        column(col::INCOME, ColumnType::Integer, true),
        column(col::EDUCATION_SCORE, ColumnType::String, true),
        column(col::AGE, ColumnType::Integer, true),
        column(col::FIRST_INTERACTION, ColumnType::String, true),
        column(col::CITY_TYPE, ColumnType::String, true),
        column(col::EMPLOYER_CATEGORY, ColumnType::String, true),
    ],
};

/// The social-engagement indicators fanned out into `social_media_shares`,
/// in fan-out order
pub const SOCIAL_INDICATORS: [&str; 4] = [
    col::ONLINE_FOLLOWER,
    col::LINKEDIN_SHARED,
    col::TWITTER_SHARED,
    col::FACEBOOK_SHARED,
];
