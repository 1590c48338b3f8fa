//! Logging utilities for output and progress tracking
//!
//! This module provides utilities for logging, the console report, and
//! stage progress tracking.

pub mod console;
pub mod log;
pub mod progress;

pub use console::{format_evaluation_report, print_evaluation_report};
pub use self::log::{log_operation_complete, log_operation_start, log_stage_complete, log_warning};
pub use progress::{begin_stage, create_stage_progress_bar, finish_progress_bar, finish_stage};
