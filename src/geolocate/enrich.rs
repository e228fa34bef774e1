//! Deduplicating enrichment orchestrator.
//!
//! Determines which candidate IPs still need an external lookup, fans the
//! remainder out to a bounded worker pool, and writes all collected results
//! to the cache store in one batched operation after fan-in.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use futures::stream::FuturesUnordered;
use futures::StreamExt;
use log::{info, warn};
use sqlx::{Pool, Sqlite};
use tokio::sync::Semaphore;

use crate::error_handling::LookupStats;
use crate::models::GeoLocation;
use crate::storage::geolocations;

use super::{IpLookup, LookupOutcome};

/// Counters describing one enrichment invocation.
#[derive(Debug, Clone, Default)]
pub struct EnrichmentSummary {
    /// Distinct candidate IPs in this batch.
    pub candidates: usize,
    /// Candidates skipped because the cache already holds them.
    pub cached: usize,
    /// Lookups actually dispatched.
    pub attempted: usize,
    /// Lookups that produced location data.
    pub located: usize,
    /// Lookups abandoned after the retry budget.
    pub failed: usize,
    /// Cache rows written by the batched store write.
    pub written: usize,
}

/// Resolves the candidate IPs not yet in the cache and stores the results.
///
/// Only the set difference against the cache runs serially; every remaining
/// IP becomes an independent task under a semaphore bounding in-flight
/// lookups at `max_concurrency`. Individual failures are isolated: they are
/// logged, counted in `stats`, and (when `cache_failures` is set) recorded
/// as null-field rows so later runs skip the IP. The single batched write
/// happens strictly after every task has completed.
///
/// # Errors
///
/// Only failures of the dispatch mechanism itself (cache read, closed
/// semaphore) abort the invocation; the caller logs them and skips the rest
/// of the enrichment step.
pub async fn enrich_ip_locations(
    pool: &Pool<Sqlite>,
    lookup: Arc<dyn IpLookup>,
    candidate_ips: &[String],
    max_concurrency: usize,
    cache_failures: bool,
    stats: &LookupStats,
) -> Result<EnrichmentSummary> {
    let distinct: HashSet<&String> = candidate_ips.iter().collect();
    let candidates = distinct.len();

    let known = geolocations::known_ips(pool)
        .await
        .context("Failed to read cached IPs")?;
    let pending: Vec<String> = distinct
        .into_iter()
        .filter(|ip| !known.contains(ip.as_str()))
        .cloned()
        .collect();
    let cached = candidates - pending.len();

    if pending.is_empty() {
        info!(
            "All {} candidate IP(s) already cached; no lookups needed",
            candidates
        );
        return Ok(EnrichmentSummary {
            candidates,
            cached,
            ..Default::default()
        });
    }

    info!(
        "Geolocating {} new IP(s) ({} already cached, max {} in flight)",
        pending.len(),
        cached,
        max_concurrency
    );

    let attempted = pending.len();
    let semaphore = Arc::new(Semaphore::new(max_concurrency));
    let mut tasks = FuturesUnordered::new();

    for ip in pending {
        let permit = Arc::clone(&semaphore)
            .acquire_owned()
            .await
            .map_err(|_| anyhow!("Lookup semaphore closed before dispatching {}", ip))?;
        let lookup = Arc::clone(&lookup);
        tasks.push(tokio::spawn(async move {
            let _permit = permit;
            lookup.lookup(&ip).await
        }));
    }

    let mut rows: Vec<GeoLocation> = Vec::with_capacity(attempted);
    let mut located = 0usize;
    let mut failed = 0usize;

    while let Some(joined) = tasks.next().await {
        match joined {
            Ok(LookupOutcome::Located(location)) => {
                located += 1;
                rows.push(location);
            }
            Ok(LookupOutcome::Failed { ip_address, reason }) => {
                failed += 1;
                stats.increment(reason.kind());
                warn!("Error fetching location for IP {}: {}", ip_address, reason);
                if cache_failures {
                    // Recorded with null fields so the IP is not retried on
                    // subsequent runs.
                    rows.push(GeoLocation::unresolved(ip_address));
                }
            }
            Err(join_error) => {
                failed += 1;
                warn!("Lookup task panicked: {:?}", join_error);
            }
        }
    }

    let written = geolocations::insert_batch(pool, &rows).await;
    info!(
        "Enrichment complete: {} located, {} failed, {} cache row(s) written",
        located, failed, written
    );

    Ok(EnrichmentSummary {
        candidates,
        cached,
        attempted,
        located,
        failed,
        written,
    })
}
