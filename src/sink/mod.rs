//! Tabular output: column planning plus the XLSX and CSV writers.
//!
//! The sinks never reinterpret rows; they lay out whatever the engine
//! produced. Blank cells and carried `null`s both render as empty cells,
//! but a blank still claims its column in the plan.

pub mod csv;
pub mod xlsx;

pub use self::csv::write_csv;
pub use self::xlsx::write_xlsx;

use chrono::{DateTime, SecondsFormat, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::flatten::Row;

static SHEET_EXTENSION_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\.(xlsx|xls)$").unwrap());

/// Column set for a row batch: the union of keys across all rows, in
/// first-seen order.
pub fn column_plan(rows: &[Row]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for row in rows {
        for key in row.keys() {
            if !columns.iter().any(|column| column == key) {
                columns.push(key.to_string());
            }
        }
    }
    columns
}

/// Derive the output filename: a trimmed custom name with any
/// `.xlsx`/`.xls` extension stripped and `.xlsx` re-appended, or a
/// timestamped default.
pub fn output_filename(custom: Option<&str>, now: DateTime<Utc>) -> String {
    match custom.map(str::trim).filter(|name| !name.is_empty()) {
        Some(name) => format!("{}.xlsx", SHEET_EXTENSION_REGEX.replace(name, "")),
        None => {
            let timestamp = now
                .to_rfc3339_opts(SecondsFormat::Millis, true)
                .replace([':', '.'], "-");
            format!("converted_data_{timestamp}.xlsx")
        }
    }
}
