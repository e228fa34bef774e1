//! Geolocation cache persistence.

use std::collections::HashSet;

use sqlx::{Pool, QueryBuilder, Row, Sqlite};

use crate::config::INSERT_CHUNK_SIZE;
use crate::error_handling::DatabaseError;
use crate::models::GeoLocation;

/// Returns the set of IP addresses already present in the cache.
///
/// The orchestrator subtracts this set from its candidates before fanning
/// out; cached IPs must never reach the external provider again.
pub async fn known_ips(pool: &Pool<Sqlite>) -> Result<HashSet<String>, DatabaseError> {
    let rows = sqlx::query("SELECT ip_address FROM geolocations")
        .fetch_all(pool)
        .await?;
    Ok(rows
        .iter()
        .map(|row| row.get::<String, _>("ip_address"))
        .collect())
}

/// Writes collected lookup results to the cache in chunked batches.
///
/// First result wins: a conflicting row is left untouched. A failed chunk is
/// logged and skipped; the remaining chunks still apply (partial application
/// is acceptable at this boundary). Returns the number of rows written.
pub async fn insert_batch(pool: &Pool<Sqlite>, locations: &[GeoLocation]) -> usize {
    let mut written = 0usize;
    for chunk in locations.chunks(INSERT_CHUNK_SIZE) {
        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new("INSERT INTO geolocations (ip_address, city, state, zip_code) ");
        builder.push_values(chunk, |mut b, geo| {
            b.push_bind(&geo.ip_address)
                .push_bind(&geo.city)
                .push_bind(&geo.state)
                .push_bind(&geo.zip_code);
        });
        builder.push(" ON CONFLICT(ip_address) DO NOTHING");

        match builder.build().execute(pool).await {
            Ok(result) => written += result.rows_affected() as usize,
            Err(e) => {
                log::error!(
                    "Failed to write geolocation batch of {} row(s): {} (continuing with remaining chunks)",
                    chunk.len(),
                    e
                );
            }
        }
    }
    written
}

/// Fetches a single cache row, if present.
pub async fn lookup_cached(
    pool: &Pool<Sqlite>,
    ip_address: &str,
) -> Result<Option<GeoLocation>, DatabaseError> {
    let row = sqlx::query(
        "SELECT ip_address, city, state, zip_code FROM geolocations WHERE ip_address = ?",
    )
    .bind(ip_address)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(|row| GeoLocation {
        ip_address: row.get("ip_address"),
        city: row.get("city"),
        state: row.get("state"),
        zip_code: row.get("zip_code"),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::ensure_schema;

    fn geo(ip: &str, city: Option<&str>) -> GeoLocation {
        GeoLocation {
            ip_address: ip.to_string(),
            city: city.map(String::from),
            state: city.map(|_| "IL".to_string()),
            zip_code: None,
        }
    }

    async fn test_pool() -> Pool<Sqlite> {
        let pool = sqlx::SqlitePool::connect("sqlite::memory:")
            .await
            .expect("Failed to create test pool");
        ensure_schema(&pool).await.expect("schema");
        pool
    }

    #[tokio::test]
    async fn test_known_ips_round_trip() {
        let pool = test_pool().await;
        assert!(known_ips(&pool).await.unwrap().is_empty());

        insert_batch(&pool, &[geo("1.1.1.1", Some("Chicago")), geo("2.2.2.2", None)]).await;

        let known = known_ips(&pool).await.unwrap();
        assert_eq!(known.len(), 2);
        assert!(known.contains("1.1.1.1"));
        assert!(known.contains("2.2.2.2"));
    }

    #[tokio::test]
    async fn test_first_result_wins() {
        let pool = test_pool().await;
        insert_batch(&pool, &[geo("1.1.1.1", Some("Chicago"))]).await;
        // A later write for the same IP must not overwrite the cached row
        let written = insert_batch(&pool, &[geo("1.1.1.1", Some("Peoria"))]).await;
        assert_eq!(written, 0);

        let cached = lookup_cached(&pool, "1.1.1.1").await.unwrap().unwrap();
        assert_eq!(cached.city.as_deref(), Some("Chicago"));
    }

    #[tokio::test]
    async fn test_null_row_is_cached() {
        let pool = test_pool().await;
        insert_batch(&pool, &[geo("3.3.3.3", None)]).await;
        let cached = lookup_cached(&pool, "3.3.3.3").await.unwrap().unwrap();
        assert!(cached.is_empty());
    }
}
