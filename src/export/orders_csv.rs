//! Flat CSV export of orders.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use csv::Writer;
use log::info;
use sqlx::{Pool, Row, Sqlite};

use super::ExportOutcome;

/// Exports `order_number,city,state,zip_code` for every order.
///
/// All orders appear, enriched or not (unenriched rows carry empty location
/// cells). An empty orders table produces no file and the no-data outcome.
pub async fn export_orders(pool: &Pool<Sqlite>, output: &Path) -> Result<ExportOutcome> {
    let rows = sqlx::query(
        "SELECT order_number, city, state, zip_code FROM orders ORDER BY order_number",
    )
    .fetch_all(pool)
    .await
    .context("Failed to query orders for export")?;

    if rows.is_empty() {
        return Ok(ExportOutcome::NoData);
    }

    let file = std::fs::File::create(output)
        .context(format!("Failed to create export file: {}", output.display()))?;
    let mut writer = Writer::from_writer(file);
    writer.write_record(["order_number", "city", "state", "zip_code"])?;

    for row in &rows {
        writer.write_record(&[
            row.get::<String, _>("order_number"),
            row.get::<Option<String>, _>("city").unwrap_or_default(),
            row.get::<Option<String>, _>("state").unwrap_or_default(),
            row.get::<Option<String>, _>("zip_code").unwrap_or_default(),
        ])?;
    }
    writer.flush()?;

    info!(
        "Exported {} order(s) to {}",
        rows.len(),
        output.display()
    );
    Ok(ExportOutcome::Written {
        path: PathBuf::from(output),
        rows: rows.len(),
    })
}
