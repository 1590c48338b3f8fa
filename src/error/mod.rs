//! Error handling for the pipeline.
//!
//! Typed failures are defined in [`PipelineError`]; the crate-wide [`Result`]
//! is an `anyhow` result so call sites can attach context with
//! [`anyhow::Context`] while callers can still `downcast_ref` the typed error.

pub mod util;

use std::io;
use std::path::PathBuf;

/// Errors raised by the pipeline stages
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// A file or directory could not be read or written
    #[error("IO error at {path}: {source}")]
    Io {
        /// Location being accessed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// An input file does not exist
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// A column expected by a stage is missing
    #[error("Column '{column}' not found")]
    ColumnNotFound {
        /// Missing column name
        column: String,
    },

    /// A column has an unexpected Arrow type
    #[error("Column '{column}' is not a {expected} array")]
    ColumnType {
        /// Column name
        column: String,
        /// Expected array type
        expected: String,
    },

    /// A feature input was null while assembling the feature vector
    #[error("Null value in feature column '{column}' at row {row}")]
    InvalidFeature {
        /// Feature column name
        column: String,
        /// Row index within the dataset
        row: usize,
    },

    /// The classifier could not be fitted, applied or evaluated
    #[error("Model error: {0}")]
    Model(String),

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Config(String),
}

impl PipelineError {
    /// Create an IO error for a path
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a column-not-found error
    pub fn column_not_found(column: &str) -> Self {
        Self::ColumnNotFound {
            column: column.to_string(),
        }
    }

    /// Create a column type error
    pub fn column_type(column: &str, expected: &str) -> Self {
        Self::ColumnType {
            column: column.to_string(),
            expected: expected.to_string(),
        }
    }
}

/// Result type for pipeline operations
pub type Result<T> = anyhow::Result<T>;
