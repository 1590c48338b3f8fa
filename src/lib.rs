//! Health camp donation pipeline: joins camp, attendance and patient profile
//! files into one denormalized Parquet table, then trains and evaluates a
//! classifier predicting whether a patient's donation exceeds a threshold.

pub mod config;
pub mod dataset;
pub mod error;
pub mod features;
pub mod loader;
pub mod model;
pub mod pipeline;
pub mod schema;
pub mod transform;
pub mod utils;
pub mod writer;

// Core types
pub use config::{InvalidFeaturePolicy, PipelineConfig};
pub use dataset::Dataset;
pub use error::{PipelineError, Result};
pub use pipeline::{Pipeline, RunSummary};

// Stage entry points
pub use features::{feature_matrix, prepare_features};
pub use loader::{LoadedSources, load_source, load_sources};
pub use model::{
    BinaryClassificationEvaluator, Estimator, LogisticRegressionEstimator, LogisticRegressionModel,
    Predictor, random_split,
};
pub use transform::{DenormalizedRecord, TransformOutput, denormalize, inner_join};
pub use writer::{WriteSummary, read_parquet_dir, write_parquet};

// Arrow types
pub use arrow::record_batch::RecordBatch;
