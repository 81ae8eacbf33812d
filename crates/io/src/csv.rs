// CSV import
//
// The first record is the header. Records with fewer fields than the header
// are padded with missing values; records with more fields are an error.

use askgrid_engine::Table;

use crate::infer::build_table;

/// Parse a comma-separated byte stream into a typed table.
pub fn parse(bytes: &[u8]) -> Result<Table, String> {
    let content = decode_utf8(bytes);
    parse_str(&content, b',')
}

/// Decode bytes as UTF-8 (BOM stripped), falling back to Windows-1252,
/// which covers most Excel-exported CSVs.
pub fn decode_utf8(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => {
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
            decoded.into_owned()
        }
    }
}

fn parse_str(content: &str, delimiter: u8) -> Result<Table, String> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut records = reader.records();

    let headers: Vec<String> = loop {
        match records.next() {
            None => return Err("No columns to parse from file".to_string()),
            Some(result) => {
                let record = result.map_err(|e| e.to_string())?;
                // Leading blank lines are skipped
                if record.iter().all(|f| f.is_empty()) && record.len() <= 1 {
                    continue;
                }
                break record.iter().map(str::to_string).collect();
            }
        }
    };

    let width = headers.len();
    let mut rows: Vec<Vec<String>> = Vec::new();

    for result in records {
        let record = result.map_err(|e| e.to_string())?;
        if record.len() == 1 && record.get(0) == Some("") {
            continue;
        }
        if record.len() > width {
            let line = record.position().map(|p| p.line()).unwrap_or(0);
            return Err(format!(
                "Error tokenizing data. Expected {} fields in line {}, saw {}",
                width,
                line,
                record.len()
            ));
        }
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(build_table(headers, rows))
}
