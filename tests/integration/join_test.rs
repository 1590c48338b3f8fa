use camp_donations::config::{LoaderConfig, TransformConfig};
use camp_donations::schema::col;
use camp_donations::utils::arrow::string_column;
use camp_donations::{denormalize, load_sources};

use crate::utils::Fixture;

/// Attendance rows without a matching camp or profile contribute nothing
#[test]
fn test_unmatched_attendance_is_dropped() -> camp_donations::Result<()> {
    let fixture = Fixture::new(
        &["C1,2023-01-01,2023-01-05,A,B,1".to_string()],
        &[
            "P1,C1,25,4.5".to_string(),
            "P2,C9,10,3.0".to_string(),
            "P9,C1,10,3.0".to_string(),
        ],
        &[
            "P1,1,0,0,1,5,Graduate,30,2022-06-01,B,IT".to_string(),
            "P2,1,1,1,1,5,Graduate,40,2022-06-01,A,Health".to_string(),
        ],
    );

    let sources = load_sources(&fixture.inputs, &LoaderConfig::default())?;
    let output = denormalize(sources, &TransformConfig::default())?;
    let batch = output.denormalized.to_batch()?;

    assert_eq!(batch.num_rows(), 4);
    let patients = string_column(&batch, col::PATIENT_ID)?;
    assert!(patients.iter().all(|p| p == Some("P1")));
    let level = string_column(&batch, col::INCOME_LEVEL)?;
    assert!(level.iter().all(|l| l == Some("High")));
    Ok(())
}

/// A join with no surviving rows yields an empty table, not an error
#[test]
fn test_empty_join_is_not_an_error() -> camp_donations::Result<()> {
    let fixture = Fixture::new(
        &["C1,2023-01-01,2023-01-05,A,B,1".to_string()],
        &["P1,C2,25,4.5".to_string()],
        &["P1,1,0,0,1,5,Graduate,30,2022-06-01,B,IT".to_string()],
    );

    let sources = load_sources(&fixture.inputs, &LoaderConfig::default())?;
    let output = denormalize(sources, &TransformConfig::default())?;
    assert!(output.denormalized.is_empty());
    assert_eq!(output.denormalized.schema().fields().len(), 23);
    Ok(())
}
