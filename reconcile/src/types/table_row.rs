use std::fmt::Write as _;

use crate::bail;
use crate::error::{ErrorKind, ReconcileResult};
use crate::types::Cell;

/// One row of a table, with values in the column order of the owning [`TableRows`].
#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    values: Vec<Cell>,
}

impl TableRow {
    pub fn new(values: Vec<Cell>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[Cell] {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut Vec<Cell> {
        &mut self.values
    }

    pub fn into_values(self) -> Vec<Cell> {
        self.values
    }

    /// Returns the value at `index`, or [`Cell::Null`] past the end of a short row.
    pub fn get(&self, index: usize) -> &Cell {
        static NULL: Cell = Cell::Null;

        self.values.get(index).unwrap_or(&NULL)
    }
}

/// A fully materialized table: column names plus rows.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TableRows {
    column_names: Vec<String>,
    rows: Vec<TableRow>,
}

impl TableRows {
    pub fn new(column_names: Vec<String>) -> Self {
        Self {
            column_names,
            rows: Vec::new(),
        }
    }

    pub fn with_rows(column_names: Vec<String>, rows: Vec<TableRow>) -> Self {
        Self { column_names, rows }
    }

    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    pub fn column_index(&self, column_name: &str) -> Option<usize> {
        self.column_names
            .iter()
            .position(|name| name == column_name)
    }

    /// Like [`TableRows::column_index`] but fails with [`ErrorKind::SchemaError`].
    ///
    /// `side` names the table in the error, e.g. `source`.
    pub fn require_column(&self, side: &str, column_name: &str) -> ReconcileResult<usize> {
        match self.column_index(column_name) {
            Some(index) => Ok(index),
            None => bail!(
                ErrorKind::SchemaError,
                "Configured column does not exist",
                format!("{side} table has no column `{column_name}`")
            ),
        }
    }

    pub fn rows(&self) -> &[TableRow] {
        &self.rows
    }

    pub fn rows_mut(&mut self) -> &mut [TableRow] {
        &mut self.rows
    }

    pub fn push(&mut self, row: TableRow) {
        self.rows.push(row);
    }

    pub fn extend(&mut self, rows: impl IntoIterator<Item = TableRow>) {
        self.rows.extend(rows);
    }

    pub fn retain(&mut self, f: impl FnMut(&TableRow) -> bool) {
        self.rows.retain(f);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn into_rows(self) -> Vec<TableRow> {
        self.rows
    }

    /// Renders a row as `column=value` pairs for log lines.
    pub fn describe(&self, row: &TableRow) -> String {
        describe_row(&self.column_names, row)
    }
}

/// Renders `row` as `column=value` pairs using `column_names`.
pub fn describe_row(column_names: &[String], row: &TableRow) -> String {
    let mut rendered = String::from("{");
    for (index, name) in column_names.iter().enumerate() {
        if index > 0 {
            rendered.push_str(", ");
        }
        let _ = write!(rendered, "{name}={}", row.get(index));
    }
    rendered.push('}');
    rendered
}
