use super::cell::CellValue;

/// A named, ordered sequence of cells.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub cells: Vec<CellValue>,
}

impl Column {
    pub fn new(name: impl Into<String>, cells: Vec<CellValue>) -> Self {
        Self { name: name.into(), cells }
    }

    /// Numeric values with missing and non-numeric cells dropped
    pub fn numbers(&self) -> impl Iterator<Item = f64> + '_ {
        self.cells.iter().filter_map(CellValue::as_f64)
    }
}

/// Column-major table. All columns have the same length.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
    rows: usize,
}

impl Table {
    /// Build from columns. Columns shorter than the longest one are padded
    /// with empty cells.
    pub fn new(mut columns: Vec<Column>) -> Self {
        let rows = columns.iter().map(|c| c.cells.len()).max().unwrap_or(0);
        for column in columns.iter_mut() {
            column.cells.resize(rows, CellValue::Empty);
        }
        Self { columns, rows }
    }

    /// Build from a header and row-major records. Short records are padded
    /// with empty cells, extra cells beyond the header are dropped.
    pub fn from_rows(headers: Vec<String>, records: Vec<Vec<CellValue>>) -> Self {
        let rows = records.len();
        let mut columns: Vec<Column> = headers
            .into_iter()
            .map(|name| Column::new(name, Vec::with_capacity(rows)))
            .collect();

        for record in records {
            let mut values = record.into_iter();
            for column in columns.iter_mut() {
                column.cells.push(values.next().unwrap_or_default());
            }
        }

        Self { columns, rows }
    }

    pub fn row_count(&self) -> usize {
        self.rows
    }

    pub fn col_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0 || self.columns.is_empty()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&CellValue> {
        self.columns.get(col).and_then(|c| c.cells.get(row))
    }

    /// First `n` rows as a new table
    pub fn head(&self, n: usize) -> Table {
        let rows = n.min(self.rows);
        let columns = self
            .columns
            .iter()
            .map(|c| Column::new(c.name.clone(), c.cells[..rows].to_vec()))
            .collect();
        Table { columns, rows }
    }
}

/// A table loaded from one uploaded file, keyed by the file name.
/// Immutable once created.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    name: String,
    table: Table,
}

impl Dataset {
    pub fn new(name: impl Into<String>, table: Table) -> Self {
        Self { name: name.into(), table }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn table(&self) -> &Table {
        &self.table
    }
}
