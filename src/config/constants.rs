//! Configuration constants.
//!
//! Defaults for the worker pool, retry schedule, and store/provider endpoints.
//! All of these can be overridden from the CLI where a matching flag exists.

/// Maximum concurrent in-flight geolocation lookups (semaphore limit).
///
/// Bounds pressure on both the provider API and the local socket budget.
/// Individual lookups are short, so 50 slots drains large IP batches quickly
/// without tripping provider-side throttling.
pub const WORKER_POOL_SIZE: usize = 50;

/// Default SQLite database path.
pub const DB_PATH: &str = "./order_geo.db";

/// Default orders input file.
pub const DEFAULT_ORDERS_FILE: &str = "orders_file.csv";

/// Default IP addresses input file.
pub const DEFAULT_IP_FILE: &str = "ip_addresses.csv";

/// Default flat export output path.
pub const DEFAULT_EXPORT_PATH: &str = "orders_export.csv";

/// Default geolocation provider base URL (DB-IP style `{base}/{key}/{ip}`).
pub const DEFAULT_GEO_API_URL: &str = "https://api.db-ip.com/v2";

/// Default provider access token (DB-IP's free tier accepts "free").
pub const DEFAULT_GEO_API_KEY: &str = "free";

/// Per-attempt lookup timeout in seconds.
///
/// The only bounded-wait mechanism in the pipeline; there is no external
/// cancellation signal for a run.
pub const LOOKUP_TIMEOUT_SECS: u64 = 10;

// Retry strategy
/// Initial delay in milliseconds before the first retry.
pub const RETRY_INITIAL_DELAY_MS: u64 = 500;
/// Factor by which the retry delay is multiplied on each attempt.
pub const RETRY_FACTOR: u64 = 2;
/// Maximum delay between retries in seconds.
pub const RETRY_MAX_DELAY_SECS: u64 = 15;
/// Maximum number of lookup attempts per IP (initial attempt + retries).
pub const RETRY_MAX_ATTEMPTS: usize = 3;

/// Rows per multi-row INSERT statement.
///
/// SQLite caps bind variables per statement; 500 rows at up to 7 columns
/// stays well under the limit.
pub const INSERT_CHUNK_SIZE: usize = 500;
