//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `order_geo` library that handles:
//! - Command-line argument parsing
//! - Environment variable loading (.env file)
//! - Logger initialization
//! - User-facing output formatting
//!
//! All core functionality is implemented in the library crate.

use anyhow::{Context, Result};
use clap::Parser;
use std::process;

use order_geo::initialization::init_logger_with;
use order_geo::{run_pipeline, Config, ExportOutcome, ReportOutcome};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env if present; lets GEO_API_KEY be
    // configured without exporting it manually
    let _ = dotenvy::dotenv();

    let config = Config::parse();

    let log_level = config.log_level.clone();
    let log_format = config.log_format.clone();
    init_logger_with(log_level.into(), log_format).context("Failed to initialize logger")?;

    match run_pipeline(config).await {
        Ok(report) => {
            match &report.export {
                Some(ExportOutcome::Written { path, rows }) => {
                    println!("Export file generated: {} ({} row(s))", path.display(), rows);
                }
                Some(ExportOutcome::NoData) => {
                    println!("No data found in orders table to export.");
                }
                None => {}
            }
            match &report.report {
                Some(ReportOutcome::Written { path, rows }) => {
                    println!("Sales report generated: {} ({} row(s))", path.display(), rows);
                }
                Some(ReportOutcome::NoData { state, year }) => {
                    println!("No sales data found for {} in {}.", state, year);
                }
                None => {}
            }
            println!(
                "Loaded {} order(s), resolved {} new IP(s) ({} cached, {} failed), enriched {} order(s) in {:.1}s",
                report.orders_loaded,
                report.enrichment.located,
                report.enrichment.cached,
                report.enrichment.failed,
                report.orders_enriched,
                report.elapsed_seconds
            );
            println!("Results saved in {}", report.db_path.display());
            Ok(())
        }
        Err(e) => {
            eprintln!("order_geo error: {:#}", e);
            process::exit(1);
        }
    }
}
