// Excel (.xlsx) import
//
// Only one sheet is read per file; the caller picks it by name, defaulting
// to the first sheet. The first row of the sheet's used range is the header.

use std::io::Cursor;

use askgrid_engine::Table;
use calamine::{open_workbook_from_rs, Data, Range, Reader, Xlsx};

use crate::infer::build_table;

fn open(bytes: &[u8]) -> Result<Xlsx<Cursor<Vec<u8>>>, String> {
    open_workbook_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e: calamine::XlsxError| format!("Failed to open Excel file: {}", e))
}

/// Sheet names in workbook order.
pub fn sheet_names(bytes: &[u8]) -> Result<Vec<String>, String> {
    let workbook = open(bytes)?;
    Ok(workbook.sheet_names().to_vec())
}

/// Parse one sheet of a workbook. `None` selects the first sheet.
pub fn parse(bytes: &[u8], sheet: Option<&str>) -> Result<Table, String> {
    let mut workbook = open(bytes)?;
    let names: Vec<String> = workbook.sheet_names().to_vec();

    let sheet_name = match sheet {
        Some(name) => {
            if !names.iter().any(|n| n == name) {
                return Err(format!(
                    "Worksheet named '{}' not found (available: {})",
                    name,
                    names.join(", ")
                ));
            }
            name.to_string()
        }
        None => names
            .first()
            .cloned()
            .ok_or_else(|| "Excel file contains no sheets".to_string())?,
    };

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| format!("Failed to read sheet '{}': {}", sheet_name, e))?;

    Ok(range_to_table(&range))
}

fn range_to_table(range: &Range<Data>) -> Table {
    let mut rows = range.rows();

    let headers: Vec<String> = match rows.next() {
        Some(row) => row.iter().map(cell_text).collect(),
        None => return Table::default(),
    };

    let records: Vec<Vec<String>> = rows
        .map(|row| row.iter().map(cell_text).collect())
        .filter(|record: &Vec<String>| record.iter().any(|f| !f.is_empty()))
        .collect();

    build_table(headers, records)
}

/// Text form of a cell, typed later by column inference.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(n) => {
            // Integers without decimals so integer columns stay integer
            if n.fract() == 0.0 && n.abs() < 1e15 {
                format!("{}", *n as i64)
            } else {
                format!("{}", n)
            }
        }
        Data::Int(n) => n.to_string(),
        Data::Bool(true) => "True".to_string(),
        Data::Bool(false) => "False".to_string(),
        Data::Error(e) => format!("#{:?}", e),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(value) if value.time() == chrono::NaiveTime::MIN => {
                value.format("%Y-%m-%d").to_string()
            }
            Some(value) => value.format("%Y-%m-%d %H:%M:%S").to_string(),
            None => dt.as_f64().to_string(),
        },
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
    }
}
