//! Train/test split, classifier and evaluation

pub mod classifier;
pub mod evaluate;
pub mod split;

pub use classifier::{Estimator, LogisticRegressionEstimator, LogisticRegressionModel, Predictor};
pub use evaluate::BinaryClassificationEvaluator;
pub use split::random_split;
