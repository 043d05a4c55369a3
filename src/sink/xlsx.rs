use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Workbook, Worksheet};
use serde_json::Value;

use super::column_plan;
use crate::flatten::{Cell, Row};

/// Write rows to an XLSX workbook with a single named sheet.
///
/// The header row is the column plan; each output row fills the cells it
/// has values for and leaves everything else empty.
pub fn write_xlsx(rows: &[Row], path: &Path, sheet_name: &str) -> Result<()> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet_name)?;

    let columns = column_plan(rows);
    for (col, name) in columns.iter().enumerate() {
        worksheet.write_string(0, col as u16, name)?;
    }

    for (row_idx, row) in rows.iter().enumerate() {
        let sheet_row = (row_idx + 1) as u32;
        for (col_idx, column) in columns.iter().enumerate() {
            if let Some(Cell::Value(value)) = row.get(column) {
                write_value(worksheet, sheet_row, col_idx as u16, value)?;
            }
        }
    }

    workbook
        .save(path)
        .with_context(|| format!("Failed to save spreadsheet: {}", path.display()))?;

    Ok(())
}

fn write_value(ws: &mut Worksheet, row: u32, col: u16, value: &Value) -> Result<()> {
    match value {
        Value::Null => { /* leave cell empty */ }
        Value::String(s) => {
            ws.write_string(row, col, s)?;
        }
        Value::Number(n) => {
            if let Some(f) = n.as_f64() {
                ws.write_number(row, col, f)?;
            }
        }
        Value::Bool(b) => {
            ws.write_string(row, col, &b.to_string())?;
        }
        // Nested structures a flat selector happened to pick up are
        // written as compact JSON text.
        other => {
            ws.write_string(row, col, &other.to_string())?;
        }
    }
    Ok(())
}
