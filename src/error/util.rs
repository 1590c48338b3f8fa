//! Utility functions for error handling
//!
//! File-system helpers that turn `std::io` failures into [`PipelineError`]s
//! carrying the offending path.

use std::fs;
use std::io;
use std::path::Path;

use anyhow::Context;

use crate::error::{PipelineError, Result};

/// Open a file for reading with rich error information
///
/// # Arguments
/// * `path` - The path to the file to open
/// * `purpose` - Why the file is being opened (for error context)
pub fn safe_open_file(path: &Path, purpose: &str) -> Result<fs::File> {
    if !path.exists() {
        return Err(PipelineError::FileNotFound(path.to_path_buf()))
            .with_context(|| format!("Needed for: {purpose}"));
    }

    if !path.is_file() {
        return Err(PipelineError::io(
            path,
            io::Error::new(io::ErrorKind::InvalidInput, "path is not a file"),
        ))
        .with_context(|| format!("Expected a file for: {purpose}"));
    }

    fs::File::open(path).map_err(|e| {
        let context = match e.kind() {
            io::ErrorKind::PermissionDenied => "Permission denied - check file permissions".to_string(),
            _ => format!("Failed to open file for: {purpose}"),
        };
        anyhow::Error::new(PipelineError::io(path, e)).context(context)
    })
}

/// Remove anything at `path` and recreate it as an empty directory
///
/// Used by the writer to give every run a clean output location.
pub fn reset_directory(path: &Path) -> Result<()> {
    if path.is_dir() {
        fs::remove_dir_all(path)
            .map_err(|e| PipelineError::io(path, e))
            .with_context(|| format!("Failed to clear output directory {}", path.display()))?;
    } else if path.exists() {
        fs::remove_file(path)
            .map_err(|e| PipelineError::io(path, e))
            .with_context(|| format!("Failed to remove existing file {}", path.display()))?;
    }

    fs::create_dir_all(path)
        .map_err(|e| PipelineError::io(path, e))
        .with_context(|| format!("Failed to create output directory {}", path.display()))
}

/// Safely read a file to string with rich error information
pub fn safe_read_to_string(path: &Path, purpose: &str) -> Result<String> {
    let mut file = safe_open_file(path, purpose)?;

    let mut content = String::new();
    io::Read::read_to_string(&mut file, &mut content).map_err(|e| {
        let context = match e.kind() {
            io::ErrorKind::InvalidData => {
                "File contains invalid UTF-8 data - cannot read as text".to_string()
            }
            _ => format!("Failed to read file content for: {purpose}"),
        };
        anyhow::Error::new(PipelineError::io(path, e)).context(context)
    })?;

    Ok(content)
}
