use std::io::Write;

use anyhow::{Context, Result};
use serde_json::Value;

use super::column_plan;
use crate::flatten::{Cell, Row};

/// Write rows as CSV using the same column plan as the XLSX sink.
/// Blank cells, missing keys and carried `null`s all render as empty
/// fields.
pub fn write_csv<W: Write>(rows: &[Row], writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    let columns = column_plan(rows);
    csv_writer
        .write_record(&columns)
        .context("Failed to write CSV header")?;

    for row in rows {
        let record: Vec<String> = columns
            .iter()
            .map(|column| match row.get(column) {
                Some(Cell::Value(value)) => render(value),
                _ => String::new(),
            })
            .collect();
        csv_writer
            .write_record(&record)
            .context("Failed to write CSV row")?;
    }

    csv_writer.flush().context("Failed to flush CSV output")?;
    Ok(())
}

fn render(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
