//! IP address file parsing.

use std::path::Path;

use log::info;

use crate::error_handling::IngestError;

use super::columns::{column_index, resolve_columns};

/// Reads the IP address CSV.
///
/// The file has a single meaningful column, `ip_address` (after header
/// normalization). Duplicates are preserved here; the enrichment
/// orchestrator deduplicates.
pub fn load_ip_file(path: &Path) -> Result<Vec<String>, IngestError> {
    let mut reader = csv::Reader::from_path(path)?;
    let columns = resolve_columns(reader.headers()?);
    let ip_idx =
        column_index(&columns, "ip_address").ok_or(IngestError::MissingColumn("ip_address"))?;

    let mut ips = Vec::new();
    for record in reader.records() {
        let record = record?;
        let value = record.get(ip_idx).unwrap_or("").trim();
        if !value.is_empty() {
            ips.push(value.to_string());
        }
    }

    info!("Read {} IP address(es) from {}", ips.len(), path.display());
    Ok(ips)
}
