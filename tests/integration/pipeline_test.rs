use std::fs;

use camp_donations::schema::col;
use camp_donations::writer::{DATA_FILE, SUCCESS_MARKER};
use camp_donations::{InvalidFeaturePolicy, Pipeline, PipelineError, read_parquet_dir};

use crate::utils::population;

/// Full run over a population with both label classes
#[test]
fn test_full_run_produces_predictions_and_auc() -> camp_donations::Result<()> {
    let fixture = population(60);
    let summary = Pipeline::new(fixture.config()).run()?;

    assert_eq!(summary.rows.attendance, 60);
    assert_eq!(summary.rows.profiles_exploded, 240);
    assert_eq!(summary.rows.denormalized, 240);
    assert_eq!(summary.rows.train + summary.rows.test, 240);
    assert!((0.0..=1.0).contains(&summary.area_under_roc));
    assert_eq!(summary.coefficients.len(), 4);

    let schema = summary.predictions.schema();
    for name in [col::DONATION_LABEL, col::FEATURES, col::PREDICTION, col::PROBABILITY] {
        assert!(schema.index_of(name).is_ok(), "missing column {name}");
    }
    assert_eq!(summary.predictions.num_rows(), summary.rows.test);

    let output = fixture.output_dir();
    assert_eq!(summary.output_dir(), output);
    assert!(output.join(SUCCESS_MARKER).exists());
    assert_eq!(read_parquet_dir(&output)?.num_rows(), 240);

    let json = serde_json::to_value(&summary)?;
    assert_eq!(json["rows"]["denormalized"], 240);
    assert!(json.get("predictions").is_none());
    Ok(())
}

/// Two runs over the same inputs leave byte-identical output
#[test]
fn test_rerun_overwrites_with_identical_output() -> camp_donations::Result<()> {
    let fixture = population(30);
    let config = fixture.config();

    let first = Pipeline::new(config.clone()).run()?;
    let first_bytes = fs::read(fixture.output_dir().join(DATA_FILE))?;
    let second = Pipeline::new(config).run()?;
    let second_bytes = fs::read(fixture.output_dir().join(DATA_FILE))?;

    assert_eq!(first_bytes, second_bytes);
    assert_eq!(first.rows.train, second.rows.train);
    assert!((first.area_under_roc - second.area_under_roc).abs() < 1e-12);

    let entries = fs::read_dir(fixture.output_dir())?.count();
    assert_eq!(entries, 2);
    Ok(())
}

/// A null feature input aborts under the default policy and is dropped under `skip`
#[test]
fn test_null_feature_policy_applies_to_run() -> camp_donations::Result<()> {
    let base = population(40);
    let mut attendance = fs::read_to_string(&base.inputs.attendance)?;
    attendance.push_str("P0,C1,45,\n");
    fs::write(&base.inputs.attendance, attendance)?;

    let err = Pipeline::new(base.config()).run().unwrap_err();
    assert!(matches!(
        err.downcast_ref::<PipelineError>(),
        Some(PipelineError::InvalidFeature { .. })
    ));
    // The table is written before features are assembled
    assert!(base.output_dir().join(DATA_FILE).exists());

    let mut config = base.config();
    config.features.invalid_policy = InvalidFeaturePolicy::Skip;
    let summary = Pipeline::new(config).run()?;
    assert_eq!(summary.rows.denormalized, 164);
    assert_eq!(summary.rows.features, 160);
    Ok(())
}

#[test]
fn test_invalid_config_is_rejected() {
    let fixture = population(10);
    let mut config = fixture.config();
    config.model.train_ratio = 1.5;

    let err = Pipeline::new(config).run().unwrap_err();
    assert!(matches!(
        err.downcast_ref::<PipelineError>(),
        Some(PipelineError::Config(_))
    ));
}
