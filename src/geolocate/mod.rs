//! IP geolocation: lookup client and deduplicating enrichment orchestrator.

mod client;
mod enrich;

use async_trait::async_trait;

use crate::error_handling::LookupFailure;
use crate::models::GeoLocation;

pub use client::GeoClient;
pub use enrich::{enrich_ip_locations, EnrichmentSummary};

/// Tagged result of one lookup attempt-sequence.
///
/// Each fan-out task carries its IP through to the result, so the collector
/// never needs a shared future-to-key map.
#[derive(Debug, Clone)]
pub enum LookupOutcome {
    /// The provider answered; fields may still be partially null.
    Located(GeoLocation),
    /// The lookup failed after the retry budget was spent.
    Failed {
        /// The IP address that was being resolved.
        ip_address: String,
        /// Why the lookup was abandoned.
        reason: LookupFailure,
    },
}

/// The lookup seam the orchestrator depends on.
///
/// [`GeoClient`] is the production implementation; tests substitute mocks to
/// observe call counts and in-flight concurrency.
#[async_trait]
pub trait IpLookup: Send + Sync {
    /// Resolves one IP address. Never fails from the caller's perspective:
    /// an exhausted retry budget yields [`LookupOutcome::Failed`].
    async fn lookup(&self, ip_address: &str) -> LookupOutcome;
}
