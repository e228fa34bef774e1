//! Schema setup.
//!
//! Ensures the `orders` and `geolocations` tables exist at the start of a
//! run. Idempotent; existing data is never touched.

use sqlx::{Pool, Sqlite};

use crate::error_handling::DatabaseError;

/// Creates the two store tables and the merge-join index if absent.
pub async fn ensure_schema(pool: &Pool<Sqlite>) -> Result<(), DatabaseError> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS orders (
            order_number TEXT PRIMARY KEY,
            order_date   TEXT NOT NULL,
            ip_address   TEXT NOT NULL,
            sale_amount  REAL NOT NULL,
            city         TEXT,
            state        TEXT,
            zip_code     TEXT
        )",
    )
    .execute(pool)
    .await?;

    // The merge step joins orders to geolocations on ip_address.
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_orders_ip_address ON orders (ip_address)")
        .execute(pool)
        .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS geolocations (
            ip_address TEXT PRIMARY KEY,
            city       TEXT,
            state      TEXT,
            zip_code   TEXT
        )",
    )
    .execute(pool)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ensure_schema_is_idempotent() {
        let pool = sqlx::SqlitePool::connect("sqlite::memory:")
            .await
            .expect("Failed to create test pool");
        ensure_schema(&pool).await.expect("first ensure");
        ensure_schema(&pool).await.expect("second ensure");

        // Both tables should be queryable
        sqlx::query("SELECT count(*) FROM orders")
            .fetch_one(&pool)
            .await
            .expect("orders table exists");
        sqlx::query("SELECT count(*) FROM geolocations")
            .fetch_one(&pool)
            .await
            .expect("geolocations table exists");
    }
}
