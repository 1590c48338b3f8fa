//! Console output utilities
//!
//! The evaluation report: the AUC line followed by a table of held-out rows.

use anyhow::Context;
use arrow::util::pretty::pretty_format_batches;

use crate::dataset::Dataset;
use crate::error::Result;
use crate::schema::col;

/// Columns shown in the report table, in order
pub const REPORT_COLUMNS: [&str; 6] = [
    col::CAMP_ID,
    col::PATIENT_ID,
    col::DONATION,
    col::DONATION_LABEL,
    col::PREDICTION,
    col::PROBABILITY,
];

/// Format the report for the first `show_rows` rows of `predictions`
pub fn format_evaluation_report(auc: f64, predictions: &Dataset, show_rows: usize) -> Result<String> {
    let selected = predictions.select(&REPORT_COLUMNS)?;

    let mut remaining = show_rows;
    let mut shown = Vec::new();
    for batch in selected.batches() {
        if remaining == 0 {
            break;
        }
        let take = remaining.min(batch.num_rows());
        shown.push(batch.slice(0, take));
        remaining -= take;
    }
    if shown.is_empty() {
        shown.push(arrow::record_batch::RecordBatch::new_empty(selected.schema()));
    }

    let table = pretty_format_batches(&shown).context("Failed to format prediction table")?;
    let total = predictions.num_rows();
    let mut report = format!("Model Accuracy: {auc}\n{table}");
    if total > show_rows {
        report.push_str(&format!("\nonly showing top {show_rows} rows"));
    }
    Ok(report)
}

/// Print the report to stdout
pub fn print_evaluation_report(auc: f64, predictions: &Dataset, show_rows: usize) -> Result<()> {
    println!("{}", format_evaluation_report(auc, predictions, show_rows)?);
    Ok(())
}
