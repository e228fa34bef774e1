//! Quarterly per-state sales report.

use std::path::Path;

use anyhow::{Context, Result};
use csv::Writer;
use log::info;
use sqlx::{Pool, Row, Sqlite};

use super::ReportOutcome;

/// One aggregated report row.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    /// 1-indexed calendar quarter of the order date.
    pub quarter: i64,
    pub city: String,
    pub total_sales: f64,
}

/// Aggregates enriched orders for a state and year.
///
/// Groups orders with a known city by (quarter, city), sums sale amounts,
/// and orders rows by quarter then city. An empty result is a valid outcome
/// meaning no data matched the filters.
pub async fn quarterly_sales(
    pool: &Pool<Sqlite>,
    state: &str,
    year: i32,
) -> Result<Vec<ReportRow>> {
    let rows = sqlx::query(
        "SELECT ((CAST(strftime('%m', order_date) AS INTEGER) + 2) / 3) AS quarter,
                city,
                SUM(sale_amount) AS total_sales
         FROM orders
         WHERE state = ?1
           AND CAST(strftime('%Y', order_date) AS INTEGER) = ?2
           AND city IS NOT NULL
         GROUP BY quarter, city
         ORDER BY quarter, city",
    )
    .bind(state)
    .bind(year)
    .fetch_all(pool)
    .await
    .context("Failed to aggregate quarterly sales")?;

    Ok(rows
        .iter()
        .map(|row| ReportRow {
            quarter: row.get("quarter"),
            city: row.get("city"),
            total_sales: row.get("total_sales"),
        })
        .collect())
}

/// Generates the sales report file for a (state, year) pair.
///
/// The file is named `{STATE}_state_sales_report_{year}.csv` and written into
/// `report_dir` with columns `Quarter,City,Total Sales`. No rows means no
/// file: the caller gets [`ReportOutcome::NoData`] to surface as a notice.
pub async fn generate_quarterly_report(
    pool: &Pool<Sqlite>,
    state: &str,
    year: i32,
    report_dir: &Path,
) -> Result<ReportOutcome> {
    let state = state.to_uppercase();
    let rows = quarterly_sales(pool, &state, year).await?;

    if rows.is_empty() {
        return Ok(ReportOutcome::NoData { state, year });
    }

    let path = report_dir.join(format!("{}_state_sales_report_{}.csv", state, year));
    let file = std::fs::File::create(&path)
        .context(format!("Failed to create report file: {}", path.display()))?;
    let mut writer = Writer::from_writer(file);
    writer.write_record(["Quarter", "City", "Total Sales"])?;
    for row in &rows {
        writer.write_record(&[
            format!("Q{}", row.quarter),
            row.city.clone(),
            format!("{:.2}", row.total_sales),
        ])?;
    }
    writer.flush()?;

    info!(
        "Wrote {} report row(s) for {} {} to {}",
        rows.len(),
        state,
        year,
        path.display()
    );
    Ok(ReportOutcome::Written {
        path,
        rows: rows.len(),
    })
}
