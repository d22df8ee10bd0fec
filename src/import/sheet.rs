//! Spreadsheet parsing: first sheet only, first row as headers.

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use std::io::Cursor;

use super::normalize::RawRow;
use crate::error::ImportError;

/// Parse workbook bytes (.xlsx/.xls) into raw rows.
///
/// Only the first sheet is read. Every cell is coerced to a string before
/// normalization, so a numeric year cell and a textual one look the same
/// downstream.
pub fn parse_rows(bytes: &[u8]) -> Result<Vec<RawRow>, ImportError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| ImportError::parse("spreadsheet", e.to_string()))?;

    let sheet_names = workbook.sheet_names().to_owned();
    let first = sheet_names
        .first()
        .ok_or_else(|| ImportError::parse("spreadsheet", "workbook has no sheets"))?;

    let range = workbook
        .worksheet_range(first)
        .map_err(|e| ImportError::parse("spreadsheet", e.to_string()))?;

    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(header_row) => header_row
            .iter()
            .map(|cell| cell_to_string(cell).trim().to_string())
            .collect(),
        None => return Ok(Vec::new()),
    };

    Ok(rows
        .map(|data_row| {
            headers
                .iter()
                .enumerate()
                .map(|(i, header)| {
                    let value = data_row
                        .get(i)
                        .map(|cell| cell_to_string(cell).trim().to_string())
                        .unwrap_or_default();
                    (header.clone(), value)
                })
                .collect()
        })
        .collect())
}

/// Coerce one cell to text. Integral floats render without the fraction so
/// a year stored as 2024.0 still parses as an integer.
fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.is_finite() && f.fract() == 0.0 => format!("{}", *f as i64),
        other => other.to_string(),
    }
}
