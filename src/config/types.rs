//! Configuration types and CLI options.

use std::path::PathBuf;

use clap::{ArgAction, Parser, ValueEnum};

use crate::config::constants::{
    DB_PATH, DEFAULT_EXPORT_PATH, DEFAULT_GEO_API_KEY, DEFAULT_GEO_API_URL, DEFAULT_IP_FILE,
    DEFAULT_ORDERS_FILE, LOOKUP_TIMEOUT_SECS, RETRY_MAX_ATTEMPTS, WORKER_POOL_SIZE,
};

/// Logging level for the application.
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// Pipeline configuration.
///
/// Parsed from the CLI in the binary; constructible directly (via
/// `Default` + struct update) for library and test use.
///
/// # Examples
///
/// ```no_run
/// use order_geo::Config;
/// use std::path::PathBuf;
///
/// let config = Config {
///     orders_file: PathBuf::from("orders.csv"),
///     ip_file: PathBuf::from("ips.csv"),
///     max_concurrency: 50,
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone, Parser)]
#[command(
    name = "order_geo",
    about = "Load orders, geolocate their IP addresses, and generate sales reports"
)]
pub struct Config {
    /// CSV file of raw orders
    #[arg(long, default_value = DEFAULT_ORDERS_FILE)]
    pub orders_file: PathBuf,

    /// CSV file of IP addresses to geolocate
    #[arg(long, default_value = DEFAULT_IP_FILE)]
    pub ip_file: PathBuf,

    /// SQLite database path
    #[arg(long, default_value = DB_PATH)]
    pub db_path: PathBuf,

    /// State code for the quarterly sales report (e.g. IL)
    #[arg(long, default_value = "IL")]
    pub report_state: String,

    /// Calendar year for the quarterly sales report
    #[arg(long, default_value_t = 2021)]
    pub report_year: i32,

    /// Output path for the flat orders export
    #[arg(long, default_value = DEFAULT_EXPORT_PATH)]
    pub export_path: PathBuf,

    /// Directory the sales report file is written into
    #[arg(long, default_value = ".")]
    pub report_dir: PathBuf,

    /// Maximum concurrent geolocation lookups
    #[arg(long, default_value_t = WORKER_POOL_SIZE)]
    pub max_concurrency: usize,

    /// Per-attempt lookup timeout in seconds
    #[arg(long, default_value_t = LOOKUP_TIMEOUT_SECS)]
    pub lookup_timeout_secs: u64,

    /// Maximum lookup attempts per IP (initial attempt + retries)
    #[arg(long, default_value_t = RETRY_MAX_ATTEMPTS)]
    pub retry_max_attempts: usize,

    /// Geolocation provider base URL
    #[arg(long, default_value = DEFAULT_GEO_API_URL)]
    pub geo_api_url: String,

    /// Geolocation provider access token
    #[arg(long, env = "GEO_API_KEY", default_value = DEFAULT_GEO_API_KEY)]
    pub geo_api_key: String,

    /// Record failed lookups as empty cache rows so they are not retried
    /// on later runs (pass `false` to retry them every run)
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub cache_failures: bool,

    /// Log level
    #[arg(long, value_enum, default_value = "info")]
    pub log_level: LogLevel,

    /// Log format
    #[arg(long, value_enum, default_value = "plain")]
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            orders_file: PathBuf::from(DEFAULT_ORDERS_FILE),
            ip_file: PathBuf::from(DEFAULT_IP_FILE),
            db_path: PathBuf::from(DB_PATH),
            report_state: "IL".to_string(),
            report_year: 2021,
            export_path: PathBuf::from(DEFAULT_EXPORT_PATH),
            report_dir: PathBuf::from("."),
            max_concurrency: WORKER_POOL_SIZE,
            lookup_timeout_secs: LOOKUP_TIMEOUT_SECS,
            retry_max_attempts: RETRY_MAX_ATTEMPTS,
            geo_api_url: DEFAULT_GEO_API_URL.to_string(),
            geo_api_key: DEFAULT_GEO_API_KEY.to_string(),
            cache_failures: true,
            log_level: LogLevel::Info,
            log_format: LogFormat::Plain,
        }
    }
}
