//! Report artifacts: the flat orders export and the quarterly sales report.

mod orders_csv;
mod report;

use std::path::PathBuf;

pub use orders_csv::export_orders;
pub use report::{generate_quarterly_report, quarterly_sales, ReportRow};

/// Outcome of the flat orders export.
#[derive(Debug, Clone, PartialEq)]
pub enum ExportOutcome {
    /// The export file was written.
    Written {
        /// Path of the generated file.
        path: PathBuf,
        /// Data rows written (excluding the header).
        rows: usize,
    },
    /// The orders table was empty; no file was produced.
    NoData,
}

/// Outcome of the quarterly sales report.
#[derive(Debug, Clone, PartialEq)]
pub enum ReportOutcome {
    /// The report file was written.
    Written {
        /// Path of the generated file.
        path: PathBuf,
        /// Data rows written (excluding the header).
        rows: usize,
    },
    /// No orders matched the (state, year) filters; no file was produced.
    NoData {
        /// The state code that was requested (uppercased).
        state: String,
        /// The year that was requested.
        year: i32,
    },
}
