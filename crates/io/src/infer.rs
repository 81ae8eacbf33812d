// Column type inference shared by the CSV and Excel readers
//
// Raw fields are typed per column, not per cell:
//   all integers            -> Int (Float if any value is missing)
//   all numeric             -> Float
//   all True/False          -> Bool
//   anything else           -> Text
// Missing markers become CellValue::Empty in every column kind.

use askgrid_engine::{CellValue, Column, Table};

/// Field values treated as missing
const MISSING_MARKERS: &[&str] = &[
    "", "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "-nan", "NULL", "null", "None", "#N/A",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Int,
    Float,
    Bool,
    Text,
}

fn is_missing(field: &str) -> bool {
    MISSING_MARKERS.contains(&field.trim())
}

fn parse_bool(field: &str) -> Option<bool> {
    match field.trim() {
        "True" | "TRUE" | "true" => Some(true),
        "False" | "FALSE" | "false" => Some(false),
        _ => None,
    }
}

fn infer_kind(fields: &[String]) -> ColumnKind {
    let present: Vec<&str> = fields
        .iter()
        .map(String::as_str)
        .filter(|f| !is_missing(f))
        .collect();

    if present.is_empty() {
        // All-missing columns are float columns of NaN
        return ColumnKind::Float;
    }
    let has_missing = present.len() < fields.len();

    if present.iter().all(|f| f.trim().parse::<i64>().is_ok()) {
        return if has_missing { ColumnKind::Float } else { ColumnKind::Int };
    }
    if present.iter().all(|f| f.trim().parse::<f64>().is_ok()) {
        return ColumnKind::Float;
    }
    if present.iter().all(|f| parse_bool(f).is_some()) {
        return ColumnKind::Bool;
    }
    ColumnKind::Text
}

fn convert(field: &str, kind: ColumnKind) -> CellValue {
    if is_missing(field) {
        return CellValue::Empty;
    }
    let trimmed = field.trim();
    match kind {
        ColumnKind::Int => trimmed.parse().map(CellValue::Int).unwrap_or(CellValue::Empty),
        ColumnKind::Float => trimmed.parse().map(CellValue::Float).unwrap_or(CellValue::Empty),
        ColumnKind::Bool => parse_bool(trimmed).map(CellValue::Bool).unwrap_or(CellValue::Empty),
        ColumnKind::Text => CellValue::Text(field.to_string()),
    }
}

/// Make header names unique and non-empty: blanks become `Unnamed: N`,
/// repeats get a `.1`, `.2` suffix.
pub(crate) fn normalize_headers(raw: Vec<String>) -> Vec<String> {
    let mut seen: Vec<String> = Vec::with_capacity(raw.len());
    for (idx, name) in raw.into_iter().enumerate() {
        let base = if name.trim().is_empty() {
            format!("Unnamed: {}", idx)
        } else {
            name
        };
        let mut candidate = base.clone();
        let mut suffix = 1;
        while seen.contains(&candidate) {
            candidate = format!("{}.{}", base, suffix);
            suffix += 1;
        }
        seen.push(candidate);
    }
    seen
}

/// Build a typed table from a header and row-major raw fields.
/// Records shorter than the header are padded with missing values.
pub(crate) fn build_table(headers: Vec<String>, records: Vec<Vec<String>>) -> Table {
    let headers = normalize_headers(headers);
    let width = headers.len();

    let mut raw_columns: Vec<Vec<String>> = vec![Vec::with_capacity(records.len()); width];
    for record in records {
        let mut fields = record.into_iter();
        for column in raw_columns.iter_mut() {
            column.push(fields.next().unwrap_or_default());
        }
    }

    let columns: Vec<Column> = headers
        .into_iter()
        .zip(raw_columns)
        .map(|(name, fields)| {
            let kind = infer_kind(&fields);
            Column::new(name, fields.iter().map(|f| convert(f, kind)).collect())
        })
        .collect();

    Table::new(columns)
}
