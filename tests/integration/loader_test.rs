use arrow::array::Array;
use camp_donations::config::LoaderConfig;
use camp_donations::schema::{ATTENDANCE, col};
use camp_donations::utils::arrow::{float64_column, int64_column};
use camp_donations::{Pipeline, PipelineError, load_source};

use crate::utils::{Fixture, write_csv, ATTENDANCE_HEADER};

/// Malformed numbers load as nulls instead of failing the run
#[test]
fn test_malformed_numbers_become_null() -> camp_donations::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = write_csv(
        dir.path(),
        "attendance.csv",
        ATTENDANCE_HEADER,
        &[
            "P1,C1,abc,4.5".to_string(),
            "P2,C1,12,n/a".to_string(),
            "P3,C1,,".to_string(),
        ],
    );

    let batch = load_source(&path, &ATTENDANCE, &LoaderConfig::default())?.to_batch()?;
    let donation = int64_column(&batch, col::DONATION)?;
    let score = float64_column(&batch, col::HEALTH_SCORE)?;

    assert_eq!(batch.num_rows(), 3);
    assert!(donation.is_null(0));
    assert_eq!(donation.value(1), 12);
    assert!(score.is_null(1));
    assert!(donation.is_null(2) && score.is_null(2));
    Ok(())
}

/// Export tools often append an unnamed trailing column
#[test]
fn test_trailing_export_column_loads() -> camp_donations::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = write_csv(
        dir.path(),
        "attendance.csv",
        &format!("{ATTENDANCE_HEADER},Unnamed"),
        &["P1,C1,25,4.5,".to_string(), "P2,C1,10,3.0,EXTRA".to_string()],
    );

    let batch = load_source(&path, &ATTENDANCE, &LoaderConfig::default())?.to_batch()?;
    assert_eq!(batch.num_columns(), ATTENDANCE.columns.len());
    assert_eq!(batch.num_rows(), 2);

    let donation = int64_column(&batch, col::DONATION)?;
    assert_eq!(donation.values().to_vec(), vec![25, 10]);
    assert_eq!(float64_column(&batch, col::HEALTH_SCORE)?.value(1), 3.0);
    Ok(())
}

/// A missing input aborts the pipeline before anything is written
#[test]
fn test_missing_input_file_fails_run() {
    let fixture = Fixture::new(&[], &[], &[]);
    let mut config = fixture.config();
    config.inputs.profiles = fixture.dir.path().join("does-not-exist.csv");

    let err = Pipeline::new(config).run().unwrap_err();
    let found = err
        .chain()
        .any(|cause| matches!(cause.downcast_ref::<PipelineError>(), Some(PipelineError::FileNotFound(_))));
    assert!(found, "unexpected error: {err:?}");
    assert!(!fixture.output_dir().exists());
}
