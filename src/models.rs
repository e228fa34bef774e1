//! Core data model: orders and cached IP geolocations.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A sales order as ingested from the orders file.
///
/// Location fields start out empty and are filled in exactly once by the
/// merge step, from the geolocation cache. An order whose IP never resolves
/// keeps null location fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    /// Unique order identifier (primary key in the store).
    pub order_number: String,
    /// Date the order was placed.
    pub order_date: NaiveDate,
    /// IP address the order originated from.
    pub ip_address: String,
    /// Sale amount in dollars.
    pub sale_amount: f64,
    /// City derived from the IP lookup, if any.
    pub city: Option<String>,
    /// State/region derived from the IP lookup, if any.
    pub state: Option<String>,
    /// Postal code derived from the IP lookup, if any.
    pub zip_code: Option<String>,
}

/// A cached geolocation result for a single IP address.
///
/// One row exists per IP ever looked up. A failed lookup may be recorded with
/// all fields null so the IP is not retried on later runs; rows are never
/// updated after insertion (first result wins).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeoLocation {
    /// The looked-up IP address (primary key in the cache store).
    pub ip_address: String,
    /// City reported by the provider, if any.
    pub city: Option<String>,
    /// State/region reported by the provider, if any.
    pub state: Option<String>,
    /// Postal code reported by the provider, if any.
    pub zip_code: Option<String>,
}

impl GeoLocation {
    /// A cache row recording a failed lookup: all location fields null.
    pub fn unresolved(ip_address: String) -> Self {
        GeoLocation {
            ip_address,
            city: None,
            state: None,
            zip_code: None,
        }
    }

    /// True if the lookup produced no usable location data.
    pub fn is_empty(&self) -> bool {
        self.city.is_none() && self.state.is_none() && self.zip_code.is_none()
    }
}
