//! In-memory tables passed between pipeline stages.
//!
//! A [`Table`] is a list of named columns and rows of nullable string cells.
//! Intermediate artifacts are written and read as comma-separated files;
//! readers look columns up by name, so extra columns are tolerated.

use crate::error::{DataLoadError, Result};
use crate::parser::normalize_cell;
use crate::types::Fields;
use std::collections::HashSet;
use std::path::Path;

/// A nullable cell
pub type Cell = Option<String>;

/// Row-major table of nullable string cells
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

/// Borrowed view of one table row
#[derive(Debug, Clone, Copy)]
pub struct TableRow<'a> {
    table: &'a Table,
    cells: &'a [Cell],
}

impl<'a> TableRow<'a> {
    /// All cells in column order
    pub fn cells(&self) -> &'a [Cell] {
        self.cells
    }

    /// Cell at a column position
    pub fn at(&self, index: usize) -> Option<&'a str> {
        self.cells.get(index).and_then(|c| c.as_deref())
    }
}

impl Fields for TableRow<'_> {
    fn field(&self, name: &str) -> Option<&str> {
        self.table.column_index(name).and_then(|i| self.at(i))
    }
}

impl Table {
    /// Creates an empty table with the given columns
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column, if present
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Position of a column, or `MissingColumn`
    pub fn require_column(&self, name: &str) -> Result<usize> {
        self.column_index(name)
            .ok_or_else(|| DataLoadError::missing_column("table", name))
    }

    /// Append a row; its width must match the column count
    pub fn push_row(&mut self, row: Vec<Cell>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(DataLoadError::ValidationError(format!(
                "row has {} cells but table has {} columns",
                row.len(),
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn row(&self, index: usize) -> Option<TableRow<'_>> {
        self.rows.get(index).map(|cells| TableRow { table: self, cells })
    }

    pub fn rows(&self) -> impl Iterator<Item = TableRow<'_>> + '_ {
        self.rows.iter().map(move |cells| TableRow { table: self, cells })
    }

    /// Values of one column in row order
    pub fn column_values(&self, name: &str) -> Result<Vec<Option<&str>>> {
        let idx = self.require_column(name)?;
        Ok(self.rows.iter().map(|r| r[idx].as_deref()).collect())
    }

    /// Append all rows of `other`.
    ///
    /// A table without columns adopts the schema of the first table appended
    /// to it, so batches can be concatenated starting from `Table::default()`.
    pub fn append(&mut self, other: Table) -> Result<()> {
        if self.columns.is_empty() && self.rows.is_empty() {
            *self = other;
            return Ok(());
        }
        if other.columns.is_empty() && other.rows.is_empty() {
            return Ok(());
        }
        if self.columns != other.columns {
            return Err(DataLoadError::ValidationError(format!(
                "cannot append table with columns {:?} to table with columns {:?}",
                other.columns, self.columns
            )));
        }
        self.rows.extend(other.rows);
        Ok(())
    }

    /// New table with only the named columns, in the given order
    pub fn select(&self, names: &[&str]) -> Result<Table> {
        let indices = names
            .iter()
            .map(|n| self.require_column(n))
            .collect::<Result<Vec<_>>>()?;
        Ok(Table {
            columns: names.iter().map(|n| n.to_string()).collect(),
            rows: self
                .rows
                .iter()
                .map(|row| indices.iter().map(|&i| row[i].clone()).collect())
                .collect(),
        })
    }

    /// Add a column, or replace it if a column with that name exists
    pub fn set_column(&mut self, name: &str, values: Vec<Cell>) -> Result<()> {
        if values.len() != self.rows.len() {
            return Err(DataLoadError::ValidationError(format!(
                "column '{}' has {} values but table has {} rows",
                name,
                values.len(),
                self.rows.len()
            )));
        }
        match self.column_index(name) {
            Some(idx) => {
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row[idx] = value;
                }
            }
            None => {
                self.columns.push(name.to_string());
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row.push(value);
                }
            }
        }
        Ok(())
    }

    pub fn rename_column(&mut self, from: &str, to: &str) -> Result<()> {
        let idx = self.require_column(from)?;
        self.columns[idx] = to.to_string();
        Ok(())
    }

    /// Keep only rows matching the predicate
    pub fn retain<P>(&mut self, mut predicate: P)
    where
        P: FnMut(&TableRow<'_>) -> bool,
    {
        let columns = std::mem::take(&mut self.columns);
        let probe = Table {
            columns,
            rows: Vec::new(),
        };
        self.rows.retain(|cells| predicate(&TableRow { table: &probe, cells }));
        self.columns = probe.columns;
    }

    /// One output row per entry of a comma-separated list column.
    ///
    /// Rows whose list is null or empty are dropped.
    pub fn explode(&self, column: &str) -> Result<Table> {
        let idx = self.require_column(column)?;
        let mut out = Table::new(self.columns.clone());
        for row in &self.rows {
            let Some(list) = row[idx].as_deref() else {
                continue;
            };
            for item in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
                let mut exploded = row.clone();
                exploded[idx] = Some(item.to_string());
                out.rows.push(exploded);
            }
        }
        Ok(out)
    }

    /// Drop rows whose value in `column` was already seen, keeping the first
    pub fn dedup_by(&self, column: &str) -> Result<Table> {
        let idx = self.require_column(column)?;
        let mut seen: HashSet<Option<&str>> = HashSet::new();
        let mut out = Table::new(self.columns.clone());
        for row in &self.rows {
            if seen.insert(row[idx].as_deref()) {
                out.rows.push(row.clone());
            }
        }
        Ok(out)
    }

    /// Load a comma-separated file with a header row
    pub fn read_csv(path: &Path) -> Result<Table> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(path)
            .map_err(|e| {
                let not_found = matches!(
                    e.kind(),
                    csv::ErrorKind::Io(io) if io.kind() == std::io::ErrorKind::NotFound
                );
                if not_found {
                    DataLoadError::FileNotFound {
                        path: path.display().to_string(),
                    }
                } else {
                    DataLoadError::Csv(e)
                }
            })?;

        let columns: Vec<String> = reader.headers()?.iter().map(|h| h.trim().to_string()).collect();
        let width = columns.len();
        let mut table = Table::new(columns);
        for record in reader.records() {
            let record = record?;
            let row = (0..width)
                .map(|i| record.get(i).and_then(normalize_cell).map(str::to_string))
                .collect();
            table.rows.push(row);
        }
        Ok(table)
    }

    /// Write as comma-separated text; nulls become empty cells
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(&self.columns)?;
        for row in &self.rows {
            writer.write_record(row.iter().map(|c| c.as_deref().unwrap_or("")))?;
        }
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(values: &[Option<&str>]) -> Vec<Cell> {
        values.iter().map(|v| v.map(str::to_string)).collect()
    }

    fn sample() -> Table {
        let mut table = Table::new(["tconst", "directors"]);
        table.push_row(cells(&[Some("tt1"), Some("nm1,nm2")])).unwrap();
        table.push_row(cells(&[Some("tt2"), None])).unwrap();
        table.push_row(cells(&[Some("tt3"), Some("nm3")])).unwrap();
        table
    }

    #[test]
    fn test_push_row_width_checked() {
        let mut table = Table::new(["a", "b"]);
        assert!(table.push_row(cells(&[Some("x")])).is_err());
    }

    #[test]
    fn test_explode_drops_null_lists() {
        let exploded = sample().explode("directors").unwrap();
        let values = exploded.column_values("directors").unwrap();
        assert_eq!(values, vec![Some("nm1"), Some("nm2"), Some("nm3")]);
        assert_eq!(exploded.column_values("tconst").unwrap()[1], Some("tt1"));
    }

    #[test]
    fn test_append_adopts_schema() {
        let mut all = Table::default();
        all.append(sample()).unwrap();
        all.append(sample()).unwrap();
        assert_eq!(all.len(), 6);
        assert!(all.append(Table::new(["other"])).is_err());
    }

    #[test]
    fn test_set_column_and_retain() {
        let mut table = sample();
        table
            .set_column("score", cells(&[Some("1.5"), None, Some("2.0")]))
            .unwrap();
        table.retain(|row| row.field("score").is_some());
        assert_eq!(table.len(), 2);
        assert_eq!(table.columns(), &["tconst", "directors", "score"]);
    }

    #[test]
    fn test_dedup_keeps_first() {
        let mut table = Table::new(["title", "year"]);
        table.push_row(cells(&[Some("Don"), Some("1978")])).unwrap();
        table.push_row(cells(&[Some("Don"), Some("2006")])).unwrap();
        let deduped = table.dedup_by("title").unwrap();
        assert_eq!(deduped.len(), 1);
        assert_eq!(deduped.row(0).unwrap().field("year"), Some("1978"));
    }

    #[test]
    fn test_csv_roundtrip_keeps_nulls() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out.csv");
        let table = sample();
        table.write_csv(&path).unwrap();
        let loaded = Table::read_csv(&path).unwrap();
        assert_eq!(loaded, table);
    }

    #[test]
    fn test_read_missing_csv() {
        let err = Table::read_csv(Path::new("/definitely/not/here.csv")).unwrap_err();
        assert!(matches!(err, DataLoadError::FileNotFound { .. }));
    }
}
