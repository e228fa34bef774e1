//! Geolocation provider client.
//!
//! Wraps the third-party IP lookup API with a per-attempt timeout and an
//! explicit retry-with-backoff policy. From the orchestrator's perspective a
//! lookup is a pure function of the IP address: it either yields a
//! [`GeoLocation`] or a typed failure, with no other side effects.

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use serde::Deserialize;
use tokio_retry::RetryIf;

use crate::config::Config;
use crate::error_handling::{InitializationError, LookupFailure, RetryPolicy};
use crate::models::GeoLocation;

use super::{IpLookup, LookupOutcome};

/// HTTP client for the geolocation provider.
///
/// Endpoint layout is `GET {base_url}/{api_key}/{ip}` returning a JSON body
/// with optional `city`, `stateProv`, and `zipCode` fields, or an `error`
/// field when the provider rejects the query.
pub struct GeoClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    retry: RetryPolicy,
}

/// Provider response body. Unknown fields are ignored; the free tier omits
/// some of these entirely.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProviderResponse {
    #[serde(default)]
    city: Option<String>,
    #[serde(default, alias = "region")]
    state_prov: Option<String>,
    #[serde(default, alias = "postalCode")]
    zip_code: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl GeoClient {
    /// Builds a client with an explicit endpoint, timeout, and retry policy.
    pub fn new(
        base_url: &str,
        api_key: &str,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> Result<Self, InitializationError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(GeoClient {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            retry,
        })
    }

    /// Builds a client from pipeline configuration.
    pub fn from_config(config: &Config) -> Result<Self, InitializationError> {
        Self::new(
            &config.geo_api_url,
            &config.geo_api_key,
            Duration::from_secs(config.lookup_timeout_secs),
            RetryPolicy::with_max_attempts(config.retry_max_attempts),
        )
    }

    /// One lookup attempt, no retries.
    async fn attempt(&self, ip_address: &str) -> Result<GeoLocation, LookupFailure> {
        let url = format!("{}/{}/{}", self.base_url, self.api_key, ip_address);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(LookupFailure::from)?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(LookupFailure::RateLimited);
        }
        if !status.is_success() {
            return Err(LookupFailure::Status(status.as_u16()));
        }

        let body: ProviderResponse = response
            .json()
            .await
            .map_err(|e| LookupFailure::Malformed(e.to_string()))?;

        if let Some(message) = body.error {
            return Err(LookupFailure::Provider(message));
        }

        Ok(GeoLocation {
            ip_address: ip_address.to_string(),
            city: non_empty(body.city),
            state: non_empty(body.state_prov),
            zip_code: non_empty(body.zip_code),
        })
    }

    /// Resolves an IP, retrying transient failures with exponential backoff.
    ///
    /// Permanent failures (4xx, malformed bodies, provider rejections) are
    /// returned immediately without burning the retry budget.
    pub async fn resolve(&self, ip_address: &str) -> Result<GeoLocation, LookupFailure> {
        RetryIf::spawn(
            self.retry.backoff(),
            || self.attempt(ip_address),
            |failure: &LookupFailure| failure.is_transient(),
        )
        .await
    }
}

#[async_trait]
impl IpLookup for GeoClient {
    async fn lookup(&self, ip_address: &str) -> LookupOutcome {
        match self.resolve(ip_address).await {
            Ok(location) => {
                debug!("Resolved {}: {:?}/{:?}", ip_address, location.city, location.state);
                LookupOutcome::Located(location)
            }
            Err(reason) => LookupOutcome::Failed {
                ip_address: ip_address.to_string(),
                reason,
            },
        }
    }
}
