//! Enrichment orchestrator behavior: cache-based deduplication, the bounded
//! worker pool, and failure isolation.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::{Pool, Row, Sqlite};

use order_geo::models::GeoLocation;
use order_geo::storage::{ensure_schema, geolocations};
use order_geo::{enrich_ip_locations, IpLookup, LookupErrorKind, LookupFailure, LookupOutcome, LookupStats};

/// Scripted lookup that records call counts and the in-flight high-water mark.
struct MockLookup {
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    high_water: AtomicUsize,
    delay: Duration,
    fail: HashSet<String>,
}

impl MockLookup {
    fn new() -> Self {
        Self::with_delay(Duration::ZERO)
    }

    fn with_delay(delay: Duration) -> Self {
        MockLookup {
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            high_water: AtomicUsize::new(0),
            delay,
            fail: HashSet::new(),
        }
    }

    fn failing_for(ips: &[&str]) -> Self {
        let mut mock = Self::new();
        mock.fail = ips.iter().map(|ip| ip.to_string()).collect();
        mock
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn high_water(&self) -> usize {
        self.high_water.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IpLookup for MockLookup {
    async fn lookup(&self, ip_address: &str) -> LookupOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.high_water.fetch_max(now, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.fail.contains(ip_address) {
            LookupOutcome::Failed {
                ip_address: ip_address.to_string(),
                reason: LookupFailure::Timeout,
            }
        } else {
            LookupOutcome::Located(GeoLocation {
                ip_address: ip_address.to_string(),
                city: Some("Chicago".to_string()),
                state: Some("IL".to_string()),
                zip_code: Some("60601".to_string()),
            })
        }
    }
}

async fn test_pool() -> Pool<Sqlite> {
    let pool = sqlx::SqlitePool::connect("sqlite::memory:")
        .await
        .expect("Failed to create test pool");
    ensure_schema(&pool).await.expect("schema");
    pool
}

fn ips(addresses: &[&str]) -> Vec<String> {
    addresses.iter().map(|ip| ip.to_string()).collect()
}

#[tokio::test]
async fn test_cached_ips_issue_zero_lookups() {
    let pool = test_pool().await;
    geolocations::insert_batch(
        &pool,
        &[
            GeoLocation {
                ip_address: "1.1.1.1".to_string(),
                city: Some("Chicago".to_string()),
                state: Some("IL".to_string()),
                zip_code: None,
            },
            GeoLocation::unresolved("2.2.2.2".to_string()),
        ],
    )
    .await;

    let mock = Arc::new(MockLookup::new());
    let stats = LookupStats::new();
    let summary = enrich_ip_locations(
        &pool,
        Arc::clone(&mock) as Arc<dyn IpLookup>,
        &ips(&["1.1.1.1", "2.2.2.2"]),
        10,
        true,
        &stats,
    )
    .await
    .expect("enrichment");

    assert_eq!(mock.calls(), 0, "cached IPs must not reach the provider");
    assert_eq!(summary.cached, 2);
    assert_eq!(summary.attempted, 0);
    assert_eq!(summary.written, 0);
}

#[tokio::test]
async fn test_duplicate_candidates_looked_up_once() {
    let pool = test_pool().await;
    let mock = Arc::new(MockLookup::new());
    let stats = LookupStats::new();

    let summary = enrich_ip_locations(
        &pool,
        Arc::clone(&mock) as Arc<dyn IpLookup>,
        &ips(&["3.3.3.3", "3.3.3.3", "3.3.3.3", "4.4.4.4"]),
        10,
        true,
        &stats,
    )
    .await
    .expect("enrichment");

    assert_eq!(summary.candidates, 2);
    assert_eq!(mock.calls(), 2, "one lookup per distinct IP");
    assert_eq!(summary.written, 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_worker_pool_bounds_in_flight_lookups() {
    let pool = test_pool().await;
    let mock = Arc::new(MockLookup::with_delay(Duration::from_millis(25)));
    let stats = LookupStats::new();

    let candidates: Vec<String> = (1..=20).map(|n| format!("10.0.0.{}", n)).collect();
    let summary = enrich_ip_locations(
        &pool,
        Arc::clone(&mock) as Arc<dyn IpLookup>,
        &candidates,
        5,
        true,
        &stats,
    )
    .await
    .expect("enrichment");

    assert_eq!(mock.calls(), 20);
    assert!(
        mock.high_water() <= 5,
        "at most 5 lookups in flight, saw {}",
        mock.high_water()
    );
    assert_eq!(summary.located, 20);
    assert_eq!(summary.written, 20);
}

#[tokio::test]
async fn test_failed_lookup_recorded_as_null_row_without_aborting() {
    let pool = test_pool().await;
    let mock = Arc::new(MockLookup::failing_for(&["6.6.6.6"]));
    let stats = LookupStats::new();

    let summary = enrich_ip_locations(
        &pool,
        Arc::clone(&mock) as Arc<dyn IpLookup>,
        &ips(&["5.5.5.5", "6.6.6.6", "7.7.7.7"]),
        10,
        true,
        &stats,
    )
    .await
    .expect("a lookup failure must not abort the batch");

    assert_eq!(summary.located, 2);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.written, 3);
    assert_eq!(stats.count(LookupErrorKind::Timeout), 1);

    // Exactly one cache row for the failed IP, with null fields
    let count: (i64,) =
        sqlx::query_as("SELECT count(*) FROM geolocations WHERE ip_address = '6.6.6.6'")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(count.0, 1);
    let cached = geolocations::lookup_cached(&pool, "6.6.6.6")
        .await
        .unwrap()
        .expect("failure row cached");
    assert!(cached.is_empty());

    // Successful neighbors are unaffected
    let cached = geolocations::lookup_cached(&pool, "5.5.5.5")
        .await
        .unwrap()
        .expect("success row cached");
    assert_eq!(cached.city.as_deref(), Some("Chicago"));
}

#[tokio::test]
async fn test_failures_retried_next_run_when_caching_disabled() {
    let pool = test_pool().await;
    let mock = Arc::new(MockLookup::failing_for(&["6.6.6.6"]));
    let stats = LookupStats::new();
    let candidates = ips(&["5.5.5.5", "6.6.6.6"]);

    let summary = enrich_ip_locations(
        &pool,
        Arc::clone(&mock) as Arc<dyn IpLookup>,
        &candidates,
        10,
        false,
        &stats,
    )
    .await
    .expect("enrichment");
    assert_eq!(summary.written, 1);
    assert!(geolocations::lookup_cached(&pool, "6.6.6.6")
        .await
        .unwrap()
        .is_none());

    // The failed IP is still uncached, so a second invocation retries it
    // (and only it)
    enrich_ip_locations(
        &pool,
        Arc::clone(&mock) as Arc<dyn IpLookup>,
        &candidates,
        10,
        false,
        &stats,
    )
    .await
    .expect("enrichment");
    assert_eq!(mock.calls(), 3);
}

#[tokio::test]
async fn test_empty_candidate_list_is_a_noop() {
    let pool = test_pool().await;
    let mock = Arc::new(MockLookup::new());
    let stats = LookupStats::new();

    let summary = enrich_ip_locations(
        &pool,
        Arc::clone(&mock) as Arc<dyn IpLookup>,
        &[],
        10,
        true,
        &stats,
    )
    .await
    .expect("enrichment");

    assert_eq!(summary.candidates, 0);
    assert_eq!(mock.calls(), 0);

    let rows: (i64,) = sqlx::query_as("SELECT count(*) FROM geolocations")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(rows.0, 0);
}

#[tokio::test]
async fn test_partial_provider_fields_cached_as_given() {
    // A lookup that resolves only some fields still produces a usable row;
    // the merge step copies whatever is there.
    struct PartialLookup;

    #[async_trait]
    impl IpLookup for PartialLookup {
        async fn lookup(&self, ip_address: &str) -> LookupOutcome {
            LookupOutcome::Located(GeoLocation {
                ip_address: ip_address.to_string(),
                city: None,
                state: Some("IL".to_string()),
                zip_code: None,
            })
        }
    }

    let pool = test_pool().await;
    let stats = LookupStats::new();
    enrich_ip_locations(
        &pool,
        Arc::new(PartialLookup) as Arc<dyn IpLookup>,
        &ips(&["8.8.8.8"]),
        10,
        true,
        &stats,
    )
    .await
    .expect("enrichment");

    let row = sqlx::query("SELECT city, state FROM geolocations WHERE ip_address = '8.8.8.8'")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert!(row.get::<Option<String>, _>("city").is_none());
    assert_eq!(row.get::<Option<String>, _>("state").as_deref(), Some("IL"));
}
