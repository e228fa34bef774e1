//! Orders file parsing.

use std::path::Path;

use chrono::NaiveDate;
use log::info;

use crate::error_handling::IngestError;
use crate::models::Order;

use super::columns::{column_index, resolve_columns};

/// Date formats accepted in the orders file, tried in order.
const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%m/%d/%Y", "%m/%d/%y", "%Y/%m/%d"];

/// Reads and parses the orders CSV.
///
/// Headers are normalized and renamed to the canonical columns; currency
/// formatting is stripped from sale amounts; dates are coerced from the
/// accepted formats. Any malformed row aborts the load (taxonomy: ingestion
/// errors abort the affected step).
pub fn load_orders_file(path: &Path) -> Result<Vec<Order>, IngestError> {
    let mut reader = csv::Reader::from_path(path)?;
    let columns = resolve_columns(reader.headers()?);

    let order_number_idx =
        column_index(&columns, "order_number").ok_or(IngestError::MissingColumn("order_number"))?;
    let order_date_idx =
        column_index(&columns, "order_date").ok_or(IngestError::MissingColumn("order_date"))?;
    let ip_address_idx =
        column_index(&columns, "ip_address").ok_or(IngestError::MissingColumn("ip_address"))?;
    let sale_amount_idx =
        column_index(&columns, "sale_amount").ok_or(IngestError::MissingColumn("sale_amount"))?;
    // Location columns are optional; most source files don't carry them.
    let city_idx = column_index(&columns, "city");
    let state_idx = column_index(&columns, "state");
    let zip_code_idx = column_index(&columns, "zip_code");

    let mut orders = Vec::new();
    for (row_number, record) in reader.records().enumerate() {
        let record = record?;
        let field = |idx: usize| record.get(idx).unwrap_or("").trim();
        let optional = |idx: Option<usize>| {
            idx.map(|i| field(i))
                .filter(|value| !value.is_empty())
                .map(String::from)
        };

        orders.push(Order {
            order_number: field(order_number_idx).to_string(),
            order_date: parse_order_date(field(order_date_idx), row_number + 1)?,
            ip_address: field(ip_address_idx).to_string(),
            sale_amount: parse_sale_amount(field(sale_amount_idx), row_number + 1)?,
            city: optional(city_idx),
            state: optional(state_idx),
            zip_code: optional(zip_code_idx),
        });
    }

    info!("Parsed {} order(s) from {}", orders.len(), path.display());
    Ok(orders)
}

/// Parses a sale amount, tolerating currency symbols and thousands separators
/// ("$1,234.56" -> 1234.56).
fn parse_sale_amount(raw: &str, row: usize) -> Result<f64, IngestError> {
    let cleaned: String = raw.chars().filter(|c| *c != '$' && *c != ',').collect();
    cleaned
        .trim()
        .parse::<f64>()
        .map_err(|_| IngestError::InvalidAmount {
            row,
            value: raw.to_string(),
        })
}

/// Parses an order date against the accepted formats.
fn parse_order_date(raw: &str, row: usize) -> Result<NaiveDate, IngestError> {
    for format in &DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return Ok(date);
        }
    }
    Err(IngestError::InvalidDate {
        row,
        value: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp_csv(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(contents.as_bytes()).expect("write");
        file
    }

    #[test]
    fn test_load_orders_with_messy_headers() {
        let file = write_temp_csv(
            "Order Number,Date,IP Address,$ Sale\n\
             1001,2021-03-15,1.2.3.4,\"$1,250.50\"\n\
             1002,06/02/2021,5.6.7.8,$30\n",
        );
        let orders = load_orders_file(file.path()).expect("parse");
        assert_eq!(orders.len(), 2);
        assert_eq!(orders[0].order_number, "1001");
        assert_eq!(orders[0].sale_amount, 1250.50);
        assert_eq!(orders[0].order_date, NaiveDate::from_ymd_opt(2021, 3, 15).unwrap());
        assert_eq!(orders[1].order_date, NaiveDate::from_ymd_opt(2021, 6, 2).unwrap());
        assert!(orders[0].city.is_none());
    }

    #[test]
    fn test_missing_column_aborts() {
        let file = write_temp_csv("Order Number,Date,$ Sale\n1001,2021-03-15,$10\n");
        let err = load_orders_file(file.path()).unwrap_err();
        assert!(matches!(err, IngestError::MissingColumn("ip_address")));
    }

    #[test]
    fn test_bad_amount_aborts() {
        let file = write_temp_csv(
            "order_number,date,ip_address,$ sale\n1001,2021-03-15,1.2.3.4,ten dollars\n",
        );
        let err = load_orders_file(file.path()).unwrap_err();
        assert!(matches!(err, IngestError::InvalidAmount { row: 1, .. }));
    }

    #[test]
    fn test_bad_date_aborts() {
        let file = write_temp_csv(
            "order_number,date,ip_address,$ sale\n1001,March 15th,1.2.3.4,$10\n",
        );
        let err = load_orders_file(file.path()).unwrap_err();
        assert!(matches!(err, IngestError::InvalidDate { row: 1, .. }));
    }

    #[test]
    fn test_optional_location_columns() {
        let file = write_temp_csv(
            "order_number,date,ip_address,$ sale,City,State,Zip\n\
             1001,2021-03-15,1.2.3.4,$10,Chicago,IL,60601\n",
        );
        let orders = load_orders_file(file.path()).expect("parse");
        assert_eq!(orders[0].city.as_deref(), Some("Chicago"));
        assert_eq!(orders[0].state.as_deref(), Some("IL"));
        assert_eq!(orders[0].zip_code.as_deref(), Some("60601"));
    }

    #[test]
    fn test_parse_sale_amount_variants() {
        assert_eq!(parse_sale_amount("$1,234.56", 1).unwrap(), 1234.56);
        assert_eq!(parse_sale_amount("42", 1).unwrap(), 42.0);
        assert!(parse_sale_amount("", 1).is_err());
    }
}
