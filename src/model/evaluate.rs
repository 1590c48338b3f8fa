//! Area under the ROC curve for scored datasets

use smartcore::metrics::roc_auc_score;

use crate::dataset::Dataset;
use crate::error::{PipelineError, Result};
use crate::schema::col;
use crate::utils::arrow::{float64_column, int32_column};

/// Scores a binary classifier's output by ROC AUC
#[derive(Debug, Clone)]
pub struct BinaryClassificationEvaluator {
    pub label_col: String,
    pub probability_col: String,
}

impl Default for BinaryClassificationEvaluator {
    fn default() -> Self {
        Self {
            label_col: col::DONATION_LABEL.to_string(),
            probability_col: col::PROBABILITY.to_string(),
        }
    }
}

impl BinaryClassificationEvaluator {
    /// ROC AUC of `probability_col` against `label_col`
    ///
    /// Fails on an empty dataset and when only one class is present, since the
    /// curve is undefined in both cases.
    pub fn area_under_roc(&self, predictions: &Dataset) -> Result<f64> {
        let mut labels = Vec::with_capacity(predictions.num_rows());
        let mut probabilities = Vec::with_capacity(predictions.num_rows());
        for batch in predictions.batches() {
            labels.extend(
                int32_column(batch, &self.label_col)?
                    .values()
                    .iter()
                    .map(|&l| f64::from(l)),
            );
            probabilities.extend(
                float64_column(batch, &self.probability_col)?
                    .values()
                    .iter()
                    .copied(),
            );
        }

        if labels.is_empty() {
            return Err(PipelineError::Model("Cannot evaluate an empty dataset".into()).into());
        }
        let positives = labels.iter().filter(|&&l| l > 0.5).count();
        if positives == 0 || positives == labels.len() {
            return Err(PipelineError::Model(format!(
                "ROC AUC is undefined with a single label class ({} rows, {positives} positive)",
                labels.len()
            ))
            .into());
        }

        let auc: f64 = roc_auc_score(&labels, &probabilities);
        log::info!("Area under ROC over {} rows: {auc:.4}", labels.len());
        Ok(auc)
    }
}
