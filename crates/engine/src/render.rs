// Plain-text rendering of tables
//
// One header line, then one line per row prefixed by its 0-based index.
// Values are right-aligned to the widest entry of their column and columns
// are separated by two spaces. This text is both the terminal preview and
// the dataset section of AI prompts.

use super::table::Table;

const COLUMN_GAP: &str = "  ";

/// Render the whole table as row-major text.
pub fn to_text(table: &Table) -> String {
    if table.is_empty() {
        return empty_text(table);
    }

    let rows = table.row_count();
    let index_width = (rows - 1).to_string().len();

    // Pre-render every cell once, column by column
    let rendered: Vec<Vec<String>> = table
        .columns()
        .iter()
        .map(|c| c.cells.iter().map(|v| v.display()).collect())
        .collect();

    let widths: Vec<usize> = table
        .columns()
        .iter()
        .zip(&rendered)
        .map(|(column, cells)| {
            cells
                .iter()
                .map(|s| s.chars().count())
                .chain(std::iter::once(column.name.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();

    out.push_str(&" ".repeat(index_width));
    for (column, width) in table.columns().iter().zip(&widths) {
        out.push_str(COLUMN_GAP);
        push_right_aligned(&mut out, &column.name, *width);
    }

    for row in 0..rows {
        out.push('\n');
        let index = row.to_string();
        out.push_str(&index);
        out.push_str(&" ".repeat(index_width - index.len()));
        for (cells, width) in rendered.iter().zip(&widths) {
            out.push_str(COLUMN_GAP);
            push_right_aligned(&mut out, &cells[row], *width);
        }
    }

    out
}

fn empty_text(table: &Table) -> String {
    format!(
        "Empty DataFrame\nColumns: [{}]\nIndex: []",
        table.column_names().join(", ")
    )
}

fn push_right_aligned(out: &mut String, value: &str, width: usize) {
    let len = value.chars().count();
    if len < width {
        out.push_str(&" ".repeat(width - len));
    }
    out.push_str(value);
}
