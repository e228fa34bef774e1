//! Flat-file ingestion.
//!
//! Parses the two CSV inputs (orders and IP addresses), normalizing the
//! source column names and coercing types before anything touches the store.

mod columns;
mod ips;
mod orders;

pub use ips::load_ip_file;
pub use orders::load_orders_file;
