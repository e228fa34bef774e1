//! Error handling and retry infrastructure.
//!
//! This module provides the pipeline's error taxonomy, the explicit
//! retry-with-backoff policy used by the geolocation client, and failure
//! statistics tracking.

mod retry;
mod stats;
mod types;

pub use retry::RetryPolicy;
pub use stats::LookupStats;
pub use types::{
    DatabaseError, IngestError, InitializationError, LookupErrorKind, LookupFailure,
};
