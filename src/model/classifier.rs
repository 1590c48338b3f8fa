//! Binary classifier fit and prediction
//!
//! Fitting is delegated to smartcore's logistic regression. The estimator
//! and model are thin adapters between [`Dataset`] columns and the dense
//! matrices the library works on.

use std::fmt::Write as _;
use std::sync::Arc;

use arrow::array::{Float64Array, Int32Array};
use arrow::datatypes::{DataType, Field};
use smartcore::linalg::basic::arrays::Array;
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::linear::logistic_regression::{LogisticRegression, LogisticRegressionParameters};

use crate::dataset::Dataset;
use crate::error::{PipelineError, Result};
use crate::features::{feature_rows, labelled_matrix};
use crate::schema::col;
use crate::utils::arrow::with_column;

type SmartcoreModel = LogisticRegression<f64, i32, DenseMatrix<f64>, Vec<i32>>;

/// Something that learns a model from labelled feature vectors
pub trait Estimator {
    type Model: Predictor;

    /// Fit on `dataset`, reading labels from `label_col` and vectors from `features_col`
    fn fit(&self, dataset: &Dataset, label_col: &str, features_col: &str) -> Result<Self::Model>;
}

/// A fitted model that scores datasets
pub trait Predictor {
    /// Return `dataset` with `prediction` and `probability` columns added
    fn predict(&self, dataset: &Dataset) -> Result<Dataset>;
}

/// Logistic regression with optional L2 regularization
#[derive(Debug, Clone, Default)]
pub struct LogisticRegressionEstimator {
    pub alpha: f64,
}

impl LogisticRegressionEstimator {
    #[must_use]
    pub fn new(alpha: f64) -> Self {
        Self { alpha }
    }
}

#[allow(clippy::ptr_arg)]
fn to_matrix(rows: &Vec<Vec<f64>>) -> Result<DenseMatrix<f64>> {
    DenseMatrix::from_2d_vec(rows)
        .map_err(|e| PipelineError::Model(format!("Failed to build feature matrix: {e}")).into())
}

impl Estimator for LogisticRegressionEstimator {
    type Model = LogisticRegressionModel;

    fn fit(&self, dataset: &Dataset, label_col: &str, features_col: &str) -> Result<Self::Model> {
        let (rows, labels) = labelled_matrix(dataset, label_col, features_col)?;
        if rows.is_empty() {
            return Err(PipelineError::Model("Training set is empty".into()).into());
        }

        let positives = labels.iter().filter(|&&l| l == 1).count();
        if positives == 0 || positives == labels.len() {
            return Err(PipelineError::Model(format!(
                "Training set has a single label class ({} rows, {positives} positive)",
                labels.len()
            ))
            .into());
        }

        let x = to_matrix(&rows)?;
        let params = LogisticRegressionParameters::default().with_alpha(self.alpha);
        let model = SmartcoreModel::fit(&x, &labels, params)
            .map_err(|e| PipelineError::Model(format!("Logistic regression failed: {e}")))?;

        let coefficients: Vec<f64> = model.coefficients().iterator(0).copied().collect();
        let intercept = model
            .intercept()
            .iterator(0)
            .next()
            .copied()
            .ok_or_else(|| PipelineError::Model("Fitted model has no intercept".into()))?;

        log::info!(
            "Fitted logistic regression on {} rows ({positives} positive)",
            labels.len()
        );
        Ok(LogisticRegressionModel {
            inner: model,
            coefficients,
            intercept,
        })
    }
}

/// A fitted logistic regression
#[derive(Debug)]
pub struct LogisticRegressionModel {
    inner: SmartcoreModel,
    coefficients: Vec<f64>,
    intercept: f64,
}

impl LogisticRegressionModel {
    #[must_use]
    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    #[must_use]
    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    /// Probability of the positive class for one feature vector
    #[must_use]
    pub fn probability(&self, features: &[f64]) -> f64 {
        let z = self.intercept
            + features
                .iter()
                .zip(&self.coefficients)
                .map(|(x, w)| x * w)
                .sum::<f64>();
        if z >= 0.0 {
            1.0 / (1.0 + (-z).exp())
        } else {
            let exp_z = z.exp();
            exp_z / (1.0 + exp_z)
        }
    }

    /// Human-readable weights, one line per feature
    #[must_use]
    pub fn summary(&self, feature_names: &[&str]) -> String {
        let mut out = String::from("Logistic regression weights:\n");
        for (name, weight) in feature_names.iter().zip(&self.coefficients) {
            let _ = writeln!(out, "  {name:<20} {weight:>12.6}");
        }
        let _ = write!(out, "  {:<20} {:>12.6}", "(intercept)", self.intercept);
        out
    }
}

impl Predictor for LogisticRegressionModel {
    fn predict(&self, dataset: &Dataset) -> Result<Dataset> {
        dataset
            .schema()
            .index_of(col::FEATURES)
            .map_err(|_| PipelineError::column_not_found(col::FEATURES))?;

        dataset.map_batches(format!("{}_predictions", dataset.name()), |batch| {
            let rows = feature_rows(batch, col::FEATURES)?;

            let (predictions, probabilities): (Vec<i32>, Vec<f64>) = if rows.is_empty() {
                (Vec::new(), Vec::new())
            } else {
                let x = to_matrix(&rows)?;
                let predictions = self
                    .inner
                    .predict(&x)
                    .map_err(|e| PipelineError::Model(format!("Prediction failed: {e}")))?;
                let probabilities = rows.iter().map(|r| self.probability(r)).collect();
                (predictions, probabilities)
            };

            let batch = with_column(
                batch,
                Field::new(col::PREDICTION, DataType::Int32, false),
                Arc::new(Int32Array::from(predictions)),
            )?;
            with_column(
                &batch,
                Field::new(col::PROBABILITY, DataType::Float64, false),
                Arc::new(Float64Array::from(probabilities)),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FeatureConfig;
    use crate::features::{FEATURE_COLUMNS, prepare_features};
    use crate::utils::arrow::{float64_column, int32_column};
    use arrow::array::{ArrayRef, Int64Array, StringArray};
    use arrow::record_batch::RecordBatch;

    /// Positive rows get a higher health score, with overlap between the classes
    fn labelled(n: usize) -> Dataset {
        let scores: Vec<f64> = (0..n).map(|i| i as f64 / n as f64 * 10.0).collect();
        let donations: Vec<i64> = (0..n).map(|i| if i % 2 == 0 { 40 } else { 5 }).collect();
        let scores: Vec<f64> = scores
            .iter()
            .zip(&donations)
            .map(|(s, d)| if *d > 20 { s + 5.0 } else { *s })
            .collect();
        let batch = RecordBatch::try_from_iter(vec![
            (
                col::PATIENT_ID,
                Arc::new(StringArray::from(vec!["P"; n])) as ArrayRef,
            ),
            (col::DONATION, Arc::new(Int64Array::from(donations)) as ArrayRef),
            (col::HEALTH_SCORE, Arc::new(Float64Array::from(scores)) as ArrayRef),
            (
                col::AGE,
                Arc::new(Int64Array::from_iter_values((0..n).map(|i| 20 + (i % 7) as i64)))
                    as ArrayRef,
            ),
            (col::CATEGORY3, Arc::new(Int64Array::from(vec![1; n])) as ArrayRef),
            (
                col::SOCIAL_MEDIA_SHARES,
                Arc::new(Int64Array::from(vec![0; n])) as ArrayRef,
            ),
        ])
        .unwrap();
        prepare_features(&Dataset::from_batch("d", batch), &FeatureConfig::default()).unwrap()
    }

    #[test]
    fn test_fit_and_predict_adds_columns() {
        let data = labelled(60);
        let model = LogisticRegressionEstimator::default()
            .fit(&data, col::DONATION_LABEL, col::FEATURES)
            .unwrap();
        assert_eq!(model.coefficients().len(), FEATURE_COLUMNS.len());

        let scored = model.predict(&data).unwrap();
        assert_eq!(scored.num_rows(), 60);
        let batch = scored.to_batch().unwrap();
        let predictions = int32_column(&batch, col::PREDICTION).unwrap();
        let probabilities = float64_column(&batch, col::PROBABILITY).unwrap();
        assert!(predictions.values().iter().all(|p| *p == 0 || *p == 1));
        assert!(probabilities.values().iter().all(|p| (0.0..=1.0).contains(p)));
        assert!(model.summary(&FEATURE_COLUMNS).contains("health_score"));
    }

    #[test]
    fn test_single_class_is_model_error() {
        let data = labelled(10);
        let positives = data
            .map_batches("pos", |b| {
                let labels = int32_column(b, col::DONATION_LABEL)?;
                let mask: arrow::array::BooleanArray =
                    labels.iter().map(|l| Some(l == Some(1))).collect();
                Ok(arrow::compute::filter_record_batch(b, &mask)?)
            })
            .unwrap();

        let err = LogisticRegressionEstimator::default()
            .fit(&positives, col::DONATION_LABEL, col::FEATURES)
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::Model(_))
        ));
    }

    #[test]
    fn test_empty_training_set_is_error() {
        let data = labelled(4);
        let empty = Dataset::empty("empty", data.schema());
        assert!(
            LogisticRegressionEstimator::default()
                .fit(&empty, col::DONATION_LABEL, col::FEATURES)
                .is_err()
        );
    }

    #[test]
    fn test_probability_is_sigmoid() {
        let data = labelled(40);
        let model = LogisticRegressionEstimator::new(0.5)
            .fit(&data, col::DONATION_LABEL, col::FEATURES)
            .unwrap();
        let zeros = vec![0.0; FEATURE_COLUMNS.len()];
        let expected = 1.0 / (1.0 + (-model.intercept()).exp());
        assert!((model.probability(&zeros) - expected).abs() < 1e-12);
    }
}
