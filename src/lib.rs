//! order_geo library: order ingestion, IP geolocation enrichment, and sales
//! reporting.
//!
//! The pipeline loads orders and IP addresses from CSV files, resolves each
//! new IP against a geolocation provider (deduplicated against a persisted
//! cache, fanned out under a bounded worker pool), backfills order location
//! fields from the cache, and emits a flat order export plus a quarterly
//! per-state sales report.
//!
//! # Example
//!
//! ```no_run
//! use order_geo::{run_pipeline, Config};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config {
//!     orders_file: std::path::PathBuf::from("orders_file.csv"),
//!     ip_file: std::path::PathBuf::from("ip_addresses.csv"),
//!     max_concurrency: 50,
//!     ..Default::default()
//! };
//!
//! let report = run_pipeline(config).await?;
//! println!("Loaded {} orders, enriched {}", report.orders_loaded, report.orders_enriched);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod config;
mod error_handling;
pub mod export;
pub mod geolocate;
pub mod ingest;
pub mod initialization;
pub mod models;
pub mod storage;

// Re-export public API
pub use config::{Config, LogFormat, LogLevel};
pub use error_handling::{
    DatabaseError, IngestError, InitializationError, LookupErrorKind, LookupFailure, LookupStats,
    RetryPolicy,
};
pub use export::{ExportOutcome, ReportOutcome};
pub use geolocate::{enrich_ip_locations, EnrichmentSummary, GeoClient, IpLookup, LookupOutcome};
pub use run::{run_pipeline, PipelineReport};

// Internal run module (executes the pipeline steps in order)
mod run {
    use std::path::PathBuf;
    use std::sync::Arc;

    use anyhow::{Context, Result};
    use log::{error, info};

    use crate::config::Config;
    use crate::error_handling::LookupStats;
    use crate::export::{self, ExportOutcome, ReportOutcome};
    use crate::geolocate::{enrich_ip_locations, EnrichmentSummary, GeoClient};
    use crate::{ingest, storage};

    /// Results of one pipeline invocation.
    #[derive(Debug, Clone)]
    pub struct PipelineReport {
        /// Orders newly inserted from the orders file.
        pub orders_loaded: usize,
        /// Counters from the IP enrichment step.
        pub enrichment: EnrichmentSummary,
        /// Orders whose location fields the merge step filled in.
        pub orders_enriched: u64,
        /// Outcome of the flat export, or `None` if that step failed.
        pub export: Option<ExportOutcome>,
        /// Outcome of the sales report, or `None` if that step failed.
        pub report: Option<ReportOutcome>,
        /// Path to the SQLite database holding the pipeline state.
        pub db_path: PathBuf,
        /// Elapsed wall-clock time in seconds.
        pub elapsed_seconds: f64,
    }

    /// Runs the full pipeline with the provided configuration.
    ///
    /// Steps run in a fixed order: schema ensure → order ingestion → IP
    /// enrichment → location merge → flat export → quarterly report for the
    /// configured (state, year) pair.
    ///
    /// Errors are caught at each step boundary and logged with context; a
    /// failed step is skipped and the remaining steps proceed with whatever
    /// data is already persisted. Only store initialization failures abort
    /// the invocation.
    ///
    /// # Errors
    ///
    /// Returns an error if the database pool cannot be initialized or the
    /// schema cannot be ensured; everything downstream degrades per step.
    pub async fn run_pipeline(config: Config) -> Result<PipelineReport> {
        let start_time = std::time::Instant::now();

        let pool = storage::init_db_pool(&config.db_path)
            .await
            .context("Failed to initialize database pool")?;
        storage::ensure_schema(&pool)
            .await
            .context("Failed to ensure database schema")?;

        // Order ingestion. A malformed file aborts only this step.
        let orders_loaded = match ingest::load_orders_file(&config.orders_file) {
            Ok(orders) => match storage::orders::insert_orders(&pool, &orders).await {
                Ok(inserted) => {
                    info!(
                        "Inserted {} of {} parsed order(s)",
                        inserted,
                        orders.len()
                    );
                    inserted
                }
                Err(e) => {
                    error!(
                        "Failed to persist orders from {}: {}",
                        config.orders_file.display(),
                        e
                    );
                    0
                }
            },
            Err(e) => {
                error!(
                    "Error processing orders file {}: {}",
                    config.orders_file.display(),
                    e
                );
                0
            }
        };

        // IP enrichment. Individual lookup failures are handled inside the
        // orchestrator; anything surfacing here is fatal for the step only.
        let lookup_stats = LookupStats::new();
        let enrichment = match ingest::load_ip_file(&config.ip_file) {
            Ok(candidate_ips) => {
                match GeoClient::from_config(&config) {
                    Ok(client) => {
                        match enrich_ip_locations(
                            &pool,
                            Arc::new(client),
                            &candidate_ips,
                            config.max_concurrency,
                            config.cache_failures,
                            &lookup_stats,
                        )
                        .await
                        {
                            Ok(summary) => summary,
                            Err(e) => {
                                error!("IP enrichment aborted: {:#}", e);
                                EnrichmentSummary::default()
                            }
                        }
                    }
                    Err(e) => {
                        error!("Failed to initialize geolocation client: {}", e);
                        EnrichmentSummary::default()
                    }
                }
            }
            Err(e) => {
                error!(
                    "Error processing IP file {}: {}",
                    config.ip_file.display(),
                    e
                );
                EnrichmentSummary::default()
            }
        };
        lookup_stats.log_summary();

        // Location merge.
        let orders_enriched = match storage::orders::apply_cached_locations(&pool).await {
            Ok(updated) => {
                info!("Merged cached locations onto {} order(s)", updated);
                updated
            }
            Err(e) => {
                error!("Failed to merge cached locations onto orders: {}", e);
                0
            }
        };

        // Flat export.
        let export = match export::export_orders(&pool, &config.export_path).await {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                error!("Failed to generate orders export: {:#}", e);
                None
            }
        };

        // Quarterly report for the configured (state, year).
        let report = match export::generate_quarterly_report(
            &pool,
            &config.report_state,
            config.report_year,
            &config.report_dir,
        )
        .await
        {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                error!("Failed to generate sales report: {:#}", e);
                None
            }
        };

        Ok(PipelineReport {
            orders_loaded,
            enrichment,
            orders_enriched,
            export,
            report,
            db_path: config.db_path.clone(),
            elapsed_seconds: start_time.elapsed().as_secs_f64(),
        })
    }
}
