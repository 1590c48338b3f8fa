use arrow::array::Array;
use camp_donations::config::{FeatureConfig, LoaderConfig, TransformConfig};
use camp_donations::schema::col;
use camp_donations::transform::DENORMALIZED_COLUMNS;
use camp_donations::utils::arrow::{int32_column, int64_column, string_column};
use camp_donations::{denormalize, feature_matrix, load_sources, prepare_features};
use camp_donations::{DenormalizedRecord, read_parquet_dir, write_parquet};

use crate::utils::single_patient;

/// One camp, one attendance row and one profile fan out into four rows
#[test]
fn test_single_patient_denormalizes_to_four_rows() -> camp_donations::Result<()> {
    let fixture = single_patient();
    let sources = load_sources(&fixture.inputs, &LoaderConfig::default())?;
    assert!(sources.camps.is_retained());
    assert!(sources.attendance.is_retained());
    assert!(sources.profiles.is_retained());

    let output = denormalize(sources, &TransformConfig::default())?;
    assert!(output.profiles.is_retained());
    assert!(output.denormalized.is_retained());

    let denormalized = output.denormalized.to_batch()?;
    assert_eq!(denormalized.num_rows(), 4);

    let names: Vec<String> = denormalized
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    assert_eq!(names, DENORMALIZED_COLUMNS.to_vec());

    let level = string_column(&denormalized, col::INCOME_LEVEL)?;
    let employer_city = string_column(&denormalized, col::EMPLOYER_CITY)?;
    let status = string_column(&denormalized, col::STATUS)?;
    let income = int64_column(&denormalized, col::INCOME)?;
    let shares = int64_column(&denormalized, col::SOCIAL_MEDIA_SHARES)?;
    for row in 0..4 {
        assert_eq!(level.value(row), "Low");
        assert_eq!(employer_city.value(row), "IT B");
        assert_eq!(status.value(row), "Active");
        assert_eq!(income.value(row), 0);
    }
    assert_eq!(income.null_count(), 0);
    assert_eq!(shares.values().to_vec(), vec![1, 0, 0, 1]);

    let features = prepare_features(&output.denormalized, &FeatureConfig::default())?;
    let labels = int32_column(&features.to_batch()?, col::DONATION_LABEL)?.values().to_vec();
    assert_eq!(labels, vec![1; 4]);

    let (rows, _) = feature_matrix(&features)?;
    assert_eq!(rows[0], vec![4.5, 30.0, 2.0, 1.0]);
    assert_eq!(rows[1], vec![4.5, 30.0, 2.0, 0.0]);

    Ok(())
}

/// The persisted table reads back with the same rows
#[test]
fn test_single_patient_round_trips_through_parquet() -> camp_donations::Result<()> {
    let fixture = single_patient();
    let sources = load_sources(&fixture.inputs, &LoaderConfig::default())?;
    let output = denormalize(sources, &TransformConfig::default())?;

    let summary = write_parquet(&output.denormalized, &fixture.output_dir())?;
    assert_eq!(summary.rows, 4);

    let records: Vec<DenormalizedRecord> = read_parquet_dir(&fixture.output_dir())?.to_records()?;
    assert_eq!(records.len(), 4);

    let first = &records[0];
    assert_eq!(first.patient_id, "P1");
    assert_eq!(first.camp_id, "C1");
    assert_eq!(first.donation, Some(25));
    assert_eq!(first.health_score, Some(4.5));
    assert_eq!(first.category3, Some(2));
    assert_eq!(first.income, 0);
    assert_eq!(first.income_level, "Low");
    assert_eq!(first.employer_city, "IT B");

    let shares: Vec<_> = records.iter().map(|r| r.social_media_shares).collect();
    assert_eq!(shares, vec![Some(1), Some(0), Some(0), Some(1)]);
    Ok(())
}
