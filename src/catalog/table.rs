/// A table: ordered schema, insertion-ordered rows, auto-increment counters
use crate::error::{Result, SqlError};
use crate::types::{Column, Row, Value};
use ahash::AHashMap;

#[derive(Debug, Clone)]
pub struct Table {
    name: String,
    columns: Vec<Column>,
    rows: Vec<Row>,
    /// Column name -> last assigned value
    auto_increment: AHashMap<String, i64>,
}

impl Table {
    pub fn new(name: &str, columns: Vec<Column>) -> Self {
        Self {
            name: name.to_lowercase(),
            columns,
            rows: Vec::new(),
            auto_increment: AHashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name.eq_ignore_ascii_case(name))
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn rows_mut(&mut self) -> &mut [Row] {
        &mut self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// A row with every schema column set to NULL
    pub fn blank_row(&self) -> Row {
        Row::null_filled(self.column_names())
    }

    /// Last auto-increment value handed out for `column` (0 if none yet)
    pub fn auto_increment(&self, column: &str) -> i64 {
        self.auto_increment.get(column).copied().unwrap_or(0)
    }

    /// Append already-validated rows.
    ///
    /// Integer primary-key columns still NULL receive the next counter value.
    /// Counters only move forward, deletions never give values back.
    pub fn insert_rows(&mut self, rows: Vec<Row>) -> usize {
        let auto_columns: Vec<String> = self
            .columns
            .iter()
            .filter(|c| c.is_auto_increment())
            .map(|c| c.name.clone())
            .collect();

        let count = rows.len();
        for mut row in rows {
            for column in &auto_columns {
                if row.get(column).map_or(true, Value::is_null) {
                    let counter = self.auto_increment.entry(column.clone()).or_insert(0);
                    *counter += 1;
                    row.set(column.clone(), Value::Number(*counter as f64));
                }
            }
            self.rows.push(row);
        }
        count
    }

    /// Append a column to the schema and back-fill it as NULL
    pub fn add_column(&mut self, column: Column) -> Result<()> {
        if self.has_column(&column.name) {
            return Err(SqlError::Schema(format!(
                "Column '{}' already exists in '{}'",
                column.name, self.name
            )));
        }
        for row in &mut self.rows {
            row.set(column.name.clone(), Value::Null);
        }
        self.columns.push(column);
        Ok(())
    }

    /// Keep rows for which `keep` returns true; returns how many were removed
    pub fn retain_rows<F>(&mut self, keep: F) -> usize
    where
        F: FnMut(&Row) -> bool,
    {
        let before = self.rows.len();
        self.rows.retain(keep);
        before - self.rows.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn people() -> Table {
        Table::new(
            "People",
            vec![Column::new("id", "INTEGER").primary_key(), Column::new("name", "TEXT")],
        )
    }

    #[test]
    fn test_auto_increment_monotonic() {
        let mut table = people();
        let mut row = table.blank_row();
        row.set("name", Value::from("a"));
        table.insert_rows(vec![row.clone(), row.clone()]);
        assert_eq!(table.rows()[1].get("id"), Some(&Value::Number(2.0)));

        let removed = table.retain_rows(|_| false);
        assert_eq!(removed, 2);

        table.insert_rows(vec![row]);
        assert_eq!(table.rows()[0].get("id"), Some(&Value::Number(3.0)));
        assert_eq!(table.auto_increment("id"), 3);
    }

    #[test]
    fn test_explicit_key_is_kept() {
        let mut table = people();
        let mut row = table.blank_row();
        row.set("id", Value::Number(10.0));
        table.insert_rows(vec![row]);
        assert_eq!(table.rows()[0].get("id"), Some(&Value::Number(10.0)));
        assert_eq!(table.auto_increment("id"), 0);
    }

    #[test]
    fn test_add_column_backfills() {
        let mut table = people();
        let row = table.blank_row();
        table.insert_rows(vec![row]);
        table.add_column(Column::new("email", "TEXT")).unwrap();
        assert_eq!(table.name(), "people");
        assert_eq!(table.rows()[0].get("email"), Some(&Value::Null));
        assert!(table.add_column(Column::new("EMAIL", "TEXT")).is_err());
    }
}
