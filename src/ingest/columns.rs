//! Source column normalization.
//!
//! Input files come from upstream systems with inconsistent header naming
//! ("Order Number", "$ Sale", "Zip", ...). Headers are normalized to
//! snake_case and then mapped through a synonym table to the canonical
//! column names the pipeline uses.

/// Lowercases, trims, and snake_cases a raw header cell.
pub(crate) fn normalize_header(raw: &str) -> String {
    raw.trim().to_lowercase().replace(' ', "_")
}

/// Maps a normalized header to its canonical column name.
pub(crate) fn canonical_column(normalized: &str) -> &str {
    match normalized {
        "date" => "order_date",
        "$_sale" | "sale" => "sale_amount",
        "zip" | "zipcode" | "postal_code" => "zip_code",
        "ip" => "ip_address",
        other => other,
    }
}

/// Resolves a raw CSV header row into (canonical name, column index) pairs.
pub(crate) fn resolve_columns(headers: &csv::StringRecord) -> Vec<(String, usize)> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, raw)| {
            let normalized = normalize_header(raw);
            (canonical_column(&normalized).to_string(), idx)
        })
        .collect()
}

/// Finds the index of a canonical column, if the file has it.
pub(crate) fn column_index(columns: &[(String, usize)], name: &str) -> Option<usize> {
    columns
        .iter()
        .find(|(col, _)| col == name)
        .map(|(_, idx)| *idx)
}
