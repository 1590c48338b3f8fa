//! Seeded random train/test split

use anyhow::Context;
use arrow::array::BooleanArray;
use arrow::compute::{filter_record_batch, not};
use arrow::record_batch::RecordBatch;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::dataset::Dataset;
use crate::error::{PipelineError, Result};

fn non_empty(batches: Vec<RecordBatch>) -> Vec<RecordBatch> {
    batches.into_iter().filter(|b| b.num_rows() > 0).collect()
}

/// Split `dataset` into `(train, test)`
///
/// One uniform draw is taken per row in dataset order; a row goes to the
/// training split when its draw is below `train_ratio`. The same seed over the
/// same input always gives the same partition.
pub fn random_split(dataset: &Dataset, train_ratio: f64, seed: u64) -> Result<(Dataset, Dataset)> {
    if !(train_ratio > 0.0 && train_ratio < 1.0) {
        return Err(PipelineError::Config(format!(
            "train ratio must be between 0 and 1 (exclusive), got {train_ratio}"
        ))
        .into());
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::with_capacity(dataset.batches().len());
    let mut test = Vec::with_capacity(dataset.batches().len());

    for batch in dataset.batches() {
        let mask: BooleanArray = (0..batch.num_rows())
            .map(|_| Some(rng.random::<f64>() < train_ratio))
            .collect();
        let inverse = not(&mask).context("Failed to invert split mask")?;

        train.push(filter_record_batch(batch, &mask).context("Failed to select training rows")?);
        test.push(filter_record_batch(batch, &inverse).context("Failed to select test rows")?);
    }

    let train = Dataset::try_new(
        format!("{}_train", dataset.name()),
        dataset.schema(),
        non_empty(train),
    )?;
    let test = Dataset::try_new(
        format!("{}_test", dataset.name()),
        dataset.schema(),
        non_empty(test),
    )?;

    log::info!(
        "Split {} rows into {} training and {} test rows (ratio {train_ratio}, seed {seed})",
        dataset.num_rows(),
        train.num_rows(),
        test.num_rows()
    );
    Ok((train, test))
}
