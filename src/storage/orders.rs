//! Order persistence: batch insert and the location merge step.

use sqlx::{Pool, QueryBuilder, Sqlite};

use crate::config::INSERT_CHUNK_SIZE;
use crate::error_handling::DatabaseError;
use crate::models::Order;

/// Inserts orders in chunked multi-row statements.
///
/// Insert-if-absent on `order_number`: re-ingesting a file that was already
/// loaded is a no-op rather than a constraint violation. Returns the number
/// of rows actually inserted.
pub async fn insert_orders(
    pool: &Pool<Sqlite>,
    orders: &[Order],
) -> Result<usize, DatabaseError> {
    let mut inserted = 0usize;
    for chunk in orders.chunks(INSERT_CHUNK_SIZE) {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
            "INSERT INTO orders (order_number, order_date, ip_address, sale_amount, city, state, zip_code) ",
        );
        builder.push_values(chunk, |mut b, order| {
            b.push_bind(&order.order_number)
                .push_bind(order.order_date.to_string())
                .push_bind(&order.ip_address)
                .push_bind(order.sale_amount)
                .push_bind(&order.city)
                .push_bind(&order.state)
                .push_bind(&order.zip_code);
        });
        builder.push(" ON CONFLICT(order_number) DO NOTHING");

        let result = builder.build().execute(pool).await?;
        inserted += result.rows_affected() as usize;
    }
    Ok(inserted)
}

/// Backfills order location fields from the geolocation cache.
///
/// For every order still lacking a city whose IP has a cache row, copies
/// city/state/zip from that row. Orders with no cache match keep null
/// fields, and re-running is a no-op for already-enriched rows (the
/// `city IS NULL` predicate excludes them). Returns rows updated.
pub async fn apply_cached_locations(pool: &Pool<Sqlite>) -> Result<u64, DatabaseError> {
    // SQLite has no UPDATE .. JOIN; correlated subqueries express the same merge.
    let result = sqlx::query(
        "UPDATE orders SET
            city     = (SELECT g.city     FROM geolocations g WHERE g.ip_address = orders.ip_address),
            state    = (SELECT g.state    FROM geolocations g WHERE g.ip_address = orders.ip_address),
            zip_code = (SELECT g.zip_code FROM geolocations g WHERE g.ip_address = orders.ip_address)
         WHERE city IS NULL
           AND ip_address IN (SELECT ip_address FROM geolocations)",
    )
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GeoLocation;
    use crate::storage::{ensure_schema, geolocations};
    use chrono::NaiveDate;

    fn order(number: &str, ip: &str) -> Order {
        Order {
            order_number: number.to_string(),
            order_date: NaiveDate::from_ymd_opt(2021, 3, 15).unwrap(),
            ip_address: ip.to_string(),
            sale_amount: 19.99,
            city: None,
            state: None,
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
    async fn test_insert_orders_is_insert_if_absent() {
        let pool = test_pool().await;
        let orders = vec![order("1001", "1.2.3.4"), order("1002", "5.6.7.8")];

        assert_eq!(insert_orders(&pool, &orders).await.unwrap(), 2);
        // Second load of the same file inserts nothing
        assert_eq!(insert_orders(&pool, &orders).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_merge_copies_cached_fields() {
        let pool = test_pool().await;
        insert_orders(&pool, &[order("1001", "1.2.3.4")]).await.unwrap();
        geolocations::insert_batch(
            &pool,
            &[GeoLocation {
                ip_address: "1.2.3.4".to_string(),
                city: Some("Chicago".to_string()),
                state: Some("IL".to_string()),
                zip_code: Some("60601".to_string()),
            }],
        )
        .await;

        let updated = apply_cached_locations(&pool).await.unwrap();
        assert_eq!(updated, 1);

        let row: (Option<String>, Option<String>, Option<String>) = sqlx::query_as(
            "SELECT city, state, zip_code FROM orders WHERE order_number = '1001'",
        )
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(row.0.as_deref(), Some("Chicago"));
        assert_eq!(row.1.as_deref(), Some("IL"));
        assert_eq!(row.2.as_deref(), Some("60601"));
    }

    #[tokio::test]
    async fn test_merge_leaves_unmatched_orders_alone() {
        let pool = test_pool().await;
        insert_orders(&pool, &[order("1001", "9.9.9.9")]).await.unwrap();

        let updated = apply_cached_locations(&pool).await.unwrap();
        assert_eq!(updated, 0);

        let row: (Option<String>,) =
            sqlx::query_as("SELECT city FROM orders WHERE order_number = '1001'")
                .fetch_one(&pool)
                .await
                .unwrap();
        assert!(row.0.is_none());
    }
}
