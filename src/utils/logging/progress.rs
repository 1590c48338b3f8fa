//! Stage progress reporting using the indicatif crate.

use indicatif::{ProgressBar, ProgressStyle};

/// Template for the pipeline stage bar
pub const STAGE_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}";

/// Create a progress bar counting pipeline stages
///
/// Returns a hidden bar when `visible` is false so callers can tick it
/// unconditionally.
#[must_use]
pub fn create_stage_progress_bar(stages: u64, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(stages);
    if let Ok(style) = ProgressStyle::default_bar().template(STAGE_TEMPLATE) {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb
}

/// Mark the start of a stage on the bar
pub fn begin_stage(pb: &ProgressBar, stage: &str) {
    pb.set_message(stage.to_string());
}

/// Mark a stage as finished
pub fn finish_stage(pb: &ProgressBar) {
    pb.inc(1);
}

/// Finish a progress bar with a completion message
pub fn finish_progress_bar(pb: &ProgressBar, message: Option<&str>) {
    if let Some(msg) = message {
        pb.finish_with_message(msg.to_string());
    } else {
        pb.finish();
    }
}
