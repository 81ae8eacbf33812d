/// A single scalar cell of a dataset column.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum CellValue {
    /// Missing value (renders as NaN)
    #[default]
    Empty,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Float(n) => n.is_nan(),
            _ => false,
        }
    }

    /// Numeric view of the cell. Booleans count as 0/1 so that
    /// survival-style flag columns can be averaged.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Int(n) => Some(*n as f64),
            CellValue::Float(n) if !n.is_nan() => Some(*n),
            CellValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    /// Display text as it appears in previews and prompts.
    pub fn display(&self) -> String {
        match self {
            CellValue::Empty => "NaN".to_string(),
            CellValue::Bool(true) => "True".to_string(),
            CellValue::Bool(false) => "False".to_string(),
            CellValue::Int(n) => n.to_string(),
            CellValue::Float(n) => format_float(*n),
            CellValue::Text(s) => s.clone(),
        }
    }
}

/// Whole floats keep one decimal place (`22.0`), everything else uses the
/// shortest representation that round-trips.
fn format_float(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let s = if n > 0.0 { "inf" } else { "-inf" };
        s.to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{:.1}", n)
    } else {
        format!("{}", n)
    }
}
