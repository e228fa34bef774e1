//! SQLite persistence for orders and the geolocation cache.
//!
//! The pool is constructed once per run and handed to each component; no
//! ambient connection state.

pub mod geolocations;
pub mod orders;
mod pool;
mod schema;

pub use pool::init_db_pool;
pub use schema::ensure_schema;
