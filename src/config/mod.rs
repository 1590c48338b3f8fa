//! Configuration for the pipeline.
//!
//! Every stage takes its own section so it can be exercised on its own; the
//! orchestrator receives the whole [`PipelineConfig`].

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::util::safe_read_to_string;
use crate::error::{PipelineError, Result};

/// Default number of rows per parsed batch
pub const DEFAULT_BATCH_SIZE: usize = 16384;

/// Locations of the three delimited input files
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputPaths {
    pub camps: PathBuf,
    pub attendance: PathBuf,
    pub profiles: PathBuf,
}

/// Configuration for the loader
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Field delimiter of the input files
    pub delimiter: char,
    /// Number of rows per parsed batch
    pub batch_size: usize,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            delimiter: ',',
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

/// Configuration for the transformer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformConfig {
    /// Income strictly above this value is labelled "High"
    pub income_threshold: i64,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self { income_threshold: 2 }
    }
}

/// How null numeric inputs are handled when assembling feature vectors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvalidFeaturePolicy {
    /// Abort the run
    #[default]
    Error,
    /// Drop the row
    Skip,
    /// Substitute 0.0
    Zero,
}

impl std::str::FromStr for InvalidFeaturePolicy {
    type Err = PipelineError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "skip" => Ok(Self::Skip),
            "zero" => Ok(Self::Zero),
            other => Err(PipelineError::Config(format!(
                "unknown invalid-feature policy '{other}' (expected error, skip or zero)"
            ))),
        }
    }
}

impl fmt::Display for InvalidFeaturePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Error => "error",
            Self::Skip => "skip",
            Self::Zero => "zero",
        };
        f.write_str(name)
    }
}

/// Configuration for the feature preparer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Donation strictly above this value is labelled 1
    pub donation_threshold: i64,
    /// Null handling for the feature columns
    pub invalid_policy: InvalidFeaturePolicy,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            donation_threshold: 20,
            invalid_policy: InvalidFeaturePolicy::Error,
        }
    }
}

/// Configuration for the split, classifier and evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Share of rows assigned to the training split
    pub train_ratio: f64,
    /// Seed of the split's random generator
    pub seed: u64,
    /// L2 regularization strength
    pub alpha: f64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            train_ratio: 0.7,
            seed: 42,
            alpha: 0.0,
        }
    }
}

/// Configuration for a full pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub inputs: InputPaths,
    /// Parquet output directory, replaced on every run
    pub output_dir: PathBuf,
    pub loader: LoaderConfig,
    pub transform: TransformConfig,
    pub features: FeatureConfig,
    pub model: ModelConfig,
    /// Held-out rows shown in the console report
    pub show_rows: usize,
    /// Size of the worker pool for data-parallel stages
    pub worker_threads: usize,
    /// Show a stage progress bar on stderr
    pub show_progress: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            inputs: InputPaths::default(),
            output_dir: PathBuf::from("denormalized"),
            loader: LoaderConfig::default(),
            transform: TransformConfig::default(),
            features: FeatureConfig::default(),
            model: ModelConfig::default(),
            show_rows: 20,
            worker_threads: num_cpus::get(),
            show_progress: false,
        }
    }
}

impl PipelineConfig {
    /// Load a configuration from a JSON file; missing keys take defaults
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = safe_read_to_string(path, "reading pipeline configuration")?;
        let config: Self = serde_json::from_str(&content).map_err(|e| {
            PipelineError::Config(format!("invalid JSON in {}: {e}", path.display()))
        })?;
        Ok(config)
    }

    /// Check value ranges before running
    pub fn validate(&self) -> Result<()> {
        let ratio = self.model.train_ratio;
        if !(ratio > 0.0 && ratio < 1.0) {
            return Err(PipelineError::Config(format!(
                "train_ratio must be between 0 and 1 (exclusive), got {ratio}"
            ))
            .into());
        }
        if self.loader.batch_size == 0 {
            return Err(PipelineError::Config("batch_size must be positive".into()).into());
        }
        if !self.loader.delimiter.is_ascii() {
            return Err(PipelineError::Config(format!(
                "delimiter must be a single ASCII character, got '{}'",
                self.loader.delimiter
            ))
            .into());
        }
        if self.worker_threads == 0 {
            return Err(PipelineError::Config("worker_threads must be positive".into()).into());
        }
        Ok(())
    }
}

impl fmt::Display for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Pipeline Configuration:")?;
        writeln!(f, "  Camps: {}", self.inputs.camps.display())?;
        writeln!(f, "  Attendance: {}", self.inputs.attendance.display())?;
        writeln!(f, "  Profiles: {}", self.inputs.profiles.display())?;
        writeln!(f, "  Output: {}", self.output_dir.display())?;
        writeln!(f, "  Income Threshold: {}", self.transform.income_threshold)?;
        writeln!(f, "  Donation Threshold: {}", self.features.donation_threshold)?;
        writeln!(f, "  Invalid Features: {}", self.features.invalid_policy)?;
        writeln!(
            f,
            "  Split: {:.2}/{:.2} (seed {})",
            self.model.train_ratio,
            1.0 - self.model.train_ratio,
            self.model.seed
        )?;
        writeln!(f, "  Worker Threads: {}", self.worker_threads)?;
        Ok(())
    }
}
