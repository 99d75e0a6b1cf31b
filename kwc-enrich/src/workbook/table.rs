//! In-memory worksheet table
//!
//! Cells keep their spreadsheet type so untouched columns are written back
//! unchanged; `Table::cell` gives the text view the processor works with.

use chrono::{NaiveDateTime, Timelike};
use std::borrow::Cow;

/// One worksheet cell
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Cell {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// Text rendering: integral numbers without decimals, dates as ISO
    pub fn text(&self) -> Cow<'_, str> {
        match self {
            Cell::Empty => Cow::Borrowed(""),
            Cell::Text(s) => Cow::Borrowed(s.as_str()),
            // Numeric keywords come back as floats; drop the spurious ".0"
            Cell::Number(f) if f.fract() == 0.0 && f.abs() < 1e15 => Cow::Owned(format!("{:.0}", f)),
            Cell::Number(f) => Cow::Owned(f.to_string()),
            Cell::Bool(b) => Cow::Owned(b.to_string()),
            Cell::DateTime(dt) if dt.num_seconds_from_midnight() == 0 => {
                Cow::Owned(dt.format("%Y-%m-%d").to_string())
            }
            Cell::DateTime(dt) => Cow::Owned(dt.format("%Y-%m-%d %H:%M:%S").to_string()),
        }
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        if value.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(value)
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::from(value.to_string())
    }
}

/// Header row plus data rows, each row as wide as the header
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Build a table, padding or truncating rows to the header width
    pub fn new<C: Into<Cell>>(headers: Vec<String>, rows: Vec<Vec<C>>) -> Self {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|row| {
                let mut cells: Vec<Cell> = row.into_iter().map(Into::into).collect();
                cells.resize(width, Cell::Empty);
                cells
            })
            .collect();
        Self { headers, rows }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    /// Number of data rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of the first column with this exact header
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Append an empty column unless it already exists; returns its index
    pub fn ensure_column(&mut self, name: &str) -> usize {
        if let Some(index) = self.column(name) {
            return index;
        }
        self.headers.push(name.to_string());
        for row in &mut self.rows {
            row.push(Cell::Empty);
        }
        self.headers.len() - 1
    }

    /// Rename a header in place; false if `from` is absent
    pub fn rename_column(&mut self, from: &str, to: &str) -> bool {
        match self.column(from) {
            Some(index) => {
                self.headers[index] = to.to_string();
                true
            }
            None => false,
        }
    }

    /// Typed cell, or `None` when the row or column does not exist
    pub fn value(&self, row: usize, name: &str) -> Option<&Cell> {
        self.column(name)
            .and_then(|col| self.rows.get(row).and_then(|r| r.get(col)))
    }

    /// Cell text, or `""` when the row or column does not exist
    pub fn cell(&self, row: usize, name: &str) -> Cow<'_, str> {
        self.value(row, name)
            .map(Cell::text)
            .unwrap_or(Cow::Borrowed(""))
    }

    /// Overwrite a cell, creating the column if needed
    ///
    /// Out-of-range rows are ignored.
    pub fn set_cell(&mut self, row: usize, name: &str, value: impl Into<Cell>) {
        let col = self.ensure_column(name);
        if let Some(cells) = self.rows.get_mut(row) {
            cells[col] = value.into();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample() -> Table {
        Table::new(
            vec!["keywords".to_string(), "notes".to_string()],
            vec![
                vec!["summer dresses".to_string()],
                vec!["linen shirts".to_string(), "x".to_string(), "extra".to_string()],
            ],
        )
    }

    #[test]
    fn test_rows_are_normalized_to_header_width() {
        let table = sample();
        assert_eq!(
            table.rows()[0],
            vec![Cell::Text("summer dresses".to_string()), Cell::Empty]
        );
        assert_eq!(table.rows()[1].len(), 2);
        assert_eq!(table.cell(1, "notes"), "x");
    }

    #[test]
    fn test_ensure_column_is_idempotent() {
        let mut table = sample();
        let first = table.ensure_column("_row_hash");
        let second = table.ensure_column("_row_hash");
        assert_eq!(first, 2);
        assert_eq!(first, second);
        assert_eq!(table.headers().len(), 3);
        assert_eq!(table.cell(1, "_row_hash"), "");
    }

    #[test]
    fn test_rename_column() {
        let mut table = sample();
        assert!(table.rename_column("notes", "comments"));
        assert!(!table.rename_column("missing", "other"));
        assert_eq!(table.cell(1, "comments"), "x");
    }

    #[test]
    fn test_set_cell_creates_column_and_ignores_bad_row() {
        let mut table = sample();
        table.set_cell(0, "collection_html", "<h2>A</h2>");
        table.set_cell(99, "collection_html", "ignored");
        assert_eq!(table.cell(0, "collection_html"), "<h2>A</h2>");
        assert_eq!(table.cell(99, "collection_html"), "");
    }

    #[test]
    fn test_empty_text_becomes_empty_cell() {
        let mut table = sample();
        table.set_cell(1, "notes", "");
        assert_eq!(table.value(1, "notes"), Some(&Cell::Empty));
    }

    #[test]
    fn test_typed_cells_render_as_text() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        assert_eq!(Cell::Number(42.0).text(), "42");
        assert_eq!(Cell::Number(19.99).text(), "19.99");
        assert_eq!(Cell::Bool(true).text(), "true");
        assert_eq!(
            Cell::DateTime(date.and_hms_opt(0, 0, 0).unwrap()).text(),
            "2024-03-07"
        );
        assert_eq!(
            Cell::DateTime(date.and_hms_opt(9, 30, 0).unwrap()).text(),
            "2024-03-07 09:30:00"
        );
    }
}
