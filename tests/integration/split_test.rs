use camp_donations::config::{FeatureConfig, LoaderConfig, TransformConfig};
use camp_donations::schema::col;
use camp_donations::utils::arrow::string_column;
use camp_donations::{Dataset, denormalize, load_sources, prepare_features, random_split};

use crate::utils::population;

fn patient_ids(dataset: &Dataset) -> camp_donations::Result<Vec<String>> {
    let batch = dataset.to_batch()?;
    Ok(string_column(&batch, col::PATIENT_ID)?
        .iter()
        .map(|id| id.unwrap_or_default().to_string())
        .collect())
}

/// Seed 42 with a 0.7 ratio partitions the labelled table the same way every time
#[test]
fn test_split_is_reproducible() -> camp_donations::Result<()> {
    let fixture = population(50);
    let sources = load_sources(&fixture.inputs, &LoaderConfig::default())?;
    let denormalized = denormalize(sources, &TransformConfig::default())?.denormalized;
    let labelled = prepare_features(&denormalized, &FeatureConfig::default())?;

    let (train_a, test_a) = random_split(&labelled, 0.7, 42)?;
    let (train_b, test_b) = random_split(&labelled, 0.7, 42)?;

    assert_eq!(patient_ids(&train_a)?, patient_ids(&train_b)?);
    assert_eq!(patient_ids(&test_a)?, patient_ids(&test_b)?);
    assert_eq!(train_a.num_rows() + test_a.num_rows(), labelled.num_rows());
    assert!(!train_a.is_empty() && !test_a.is_empty());
    Ok(())
}
