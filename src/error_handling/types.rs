//! Error type definitions.
//!
//! This module defines the error taxonomy used throughout the pipeline:
//! initialization, ingestion, lookup, and persistence failures.

use log::SetLoggerError;
use reqwest::Error as ReqwestError;
use strum_macros::EnumIter as EnumIterMacro;
use thiserror::Error;

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),

    /// Error initializing the HTTP client.
    #[error("HTTP client initialization error: {0}")]
    HttpClientError(#[from] ReqwestError),
}

/// Error types for database operations.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Error creating the database file.
    #[error("Database file creation error: {0}")]
    FileCreationError(String),

    /// SQL execution error.
    #[error("SQL error: {0}")]
    SqlError(#[from] sqlx::Error),
}

/// Error types for flat-file ingestion.
///
/// Any of these aborts the affected load step; downstream steps proceed with
/// whatever data is already persisted.
#[derive(Error, Debug)]
pub enum IngestError {
    /// The input file could not be opened or read.
    #[error("Failed to read input file: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not well-formed CSV.
    #[error("Malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    /// A required column is missing after header normalization.
    #[error("Missing required column '{0}'")]
    MissingColumn(&'static str),

    /// A sale amount could not be coerced to a number.
    #[error("Invalid sale amount '{value}' on row {row}")]
    InvalidAmount { row: usize, value: String },

    /// An order date did not match any accepted format.
    #[error("Invalid order date '{value}' on row {row}")]
    InvalidDate { row: usize, value: String },
}

/// A geolocation lookup failure, after any retries have been exhausted.
///
/// Lookup failures never abort an enrichment batch; they are logged per IP
/// and (policy permitting) recorded as null cache rows.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupFailure {
    /// The request exceeded the per-attempt timeout.
    #[error("lookup timed out")]
    Timeout,

    /// The provider could not be reached.
    #[error("connection error: {0}")]
    Connect(String),

    /// The provider answered with a non-success HTTP status.
    #[error("provider returned HTTP {0}")]
    Status(u16),

    /// The provider throttled us (HTTP 429).
    #[error("rate limited by provider")]
    RateLimited,

    /// The response body could not be parsed.
    #[error("malformed provider response: {0}")]
    Malformed(String),

    /// The provider rejected the query (error payload in the response body).
    #[error("provider error: {0}")]
    Provider(String),
}

impl LookupFailure {
    /// Whether a retry could plausibly succeed.
    ///
    /// Timeouts, connection failures, throttling, and server errors are
    /// transient; client errors and unparseable or rejected responses are
    /// permanent for this invocation.
    pub fn is_transient(&self) -> bool {
        match self {
            LookupFailure::Timeout | LookupFailure::Connect(_) | LookupFailure::RateLimited => true,
            LookupFailure::Status(code) => (500..600).contains(code),
            LookupFailure::Malformed(_) | LookupFailure::Provider(_) => false,
        }
    }

    /// The statistics bucket this failure counts toward.
    pub fn kind(&self) -> LookupErrorKind {
        match self {
            LookupFailure::Timeout => LookupErrorKind::Timeout,
            LookupFailure::Connect(_) => LookupErrorKind::Connect,
            LookupFailure::Status(_) => LookupErrorKind::HttpStatus,
            LookupFailure::RateLimited => LookupErrorKind::RateLimited,
            LookupFailure::Malformed(_) => LookupErrorKind::Malformed,
            LookupFailure::Provider(_) => LookupErrorKind::Provider,
        }
    }
}

impl From<ReqwestError> for LookupFailure {
    fn from(e: ReqwestError) -> Self {
        if e.is_timeout() {
            return LookupFailure::Timeout;
        }
        if let Some(status) = e.status() {
            if status.as_u16() == 429 {
                return LookupFailure::RateLimited;
            }
            return LookupFailure::Status(status.as_u16());
        }
        if e.is_decode() {
            return LookupFailure::Malformed(e.to_string());
        }
        // Connect, request-build, and body errors all read as "couldn't talk
        // to the provider" from the orchestrator's perspective.
        LookupFailure::Connect(e.to_string())
    }
}

/// Categories of lookup failures tracked by [`super::LookupStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum LookupErrorKind {
    Timeout,
    Connect,
    HttpStatus,
    RateLimited,
    Malformed,
    Provider,
}

impl LookupErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LookupErrorKind::Timeout => "Lookup timeout",
            LookupErrorKind::Connect => "Connection error",
            LookupErrorKind::HttpStatus => "HTTP status error",
            LookupErrorKind::RateLimited => "Rate limited",
            LookupErrorKind::Malformed => "Malformed response",
            LookupErrorKind::Provider => "Provider error",
        }
    }
}

impl std::fmt::Display for LookupErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_transient_failures() {
        assert!(LookupFailure::Timeout.is_transient());
        assert!(LookupFailure::Connect("refused".into()).is_transient());
        assert!(LookupFailure::RateLimited.is_transient());
        assert!(LookupFailure::Status(500).is_transient());
        assert!(LookupFailure::Status(503).is_transient());
    }

    #[test]
    fn test_permanent_failures() {
        assert!(!LookupFailure::Status(404).is_transient());
        assert!(!LookupFailure::Status(400).is_transient());
        assert!(!LookupFailure::Malformed("bad json".into()).is_transient());
        assert!(!LookupFailure::Provider("invalid address".into()).is_transient());
    }

    #[test]
    fn test_failure_kind_mapping() {
        assert_eq!(LookupFailure::Timeout.kind(), LookupErrorKind::Timeout);
        assert_eq!(LookupFailure::Status(502).kind(), LookupErrorKind::HttpStatus);
        assert_eq!(LookupFailure::RateLimited.kind(), LookupErrorKind::RateLimited);
    }

    #[test]
    fn test_all_kinds_have_string_representation() {
        for kind in LookupErrorKind::iter() {
            assert!(!kind.as_str().is_empty(), "{:?} should have a label", kind);
        }
    }
}
