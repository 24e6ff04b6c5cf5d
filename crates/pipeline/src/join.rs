//! Key-based joins between tables.
//!
//! All joins are hash joins: the right side is indexed once by key and the
//! left side is scanned in order, so output rows follow left input order and,
//! for a given left row, right input order.
//!
//! - [`inner_join`] emits only keys present on both sides.
//! - [`left_join`] emits every left row; right columns are null when unmatched.
//! - [`stream_join`] joins a lazy sequence of batches (a streamed file) against
//!   an in-memory index, retaining only joined rows.
//!
//! Null keys never match. Many-to-many keys multiply rows; callers reduce
//! them afterwards (see [`crate::dedup`] and [`crate::aggregate`]).

use data_loader::{Cell, Result, Table};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Which rows of the left side survive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
}

/// Key column names on each side
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinKey {
    pub left: String,
    pub right: String,
}

impl JoinKey {
    /// Same column name on both sides
    pub fn on(column: &str) -> Self {
        Self::new(column, column)
    }

    pub fn new(left: &str, right: &str) -> Self {
        Self {
            left: left.to_string(),
            right: right.to_string(),
        }
    }
}

/// Hash index over the right side of a join
pub struct JoinIndex<'a> {
    table: &'a Table,
    key_idx: usize,
    rows: HashMap<&'a str, Vec<usize>>,
}

impl<'a> JoinIndex<'a> {
    /// Index `table` by `key`; rows with a null key are not indexed
    pub fn build(table: &'a Table, key: &str) -> Result<Self> {
        let key_idx = table.require_column(key)?;
        let mut rows: HashMap<&'a str, Vec<usize>> = HashMap::with_capacity(table.len());
        for (i, row) in table.rows().enumerate() {
            if let Some(k) = row.at(key_idx) {
                rows.entry(k).or_default().push(i);
            }
        }
        Ok(Self {
            table,
            key_idx,
            rows,
        })
    }

    pub fn contains(&self, key: &str) -> bool {
        self.rows.contains_key(key)
    }

    pub fn distinct_keys(&self) -> usize {
        self.rows.len()
    }

    /// Output schema for joining `left_columns` with this index, plus the
    /// positions of the right columns that are carried over
    fn output_schema(&self, left_columns: &[String]) -> (Vec<String>, Vec<usize>) {
        let mut columns = left_columns.to_vec();
        let mut carried = Vec::new();
        for (i, name) in self.table.columns().iter().enumerate() {
            if i == self.key_idx {
                continue;
            }
            let name = if left_columns.contains(name) {
                format!("{name}_right")
            } else {
                name.clone()
            };
            columns.push(name);
            carried.push(i);
        }
        (columns, carried)
    }
}

/// Join `left` against a prebuilt index
pub fn join_with_index(left: &Table, left_key: &str, index: &JoinIndex<'_>, kind: JoinKind) -> Result<Table> {
    let key_idx = left.require_column(left_key)?;
    let (columns, carried) = index.output_schema(left.columns());
    let mut out = Table::new(columns);

    for row in left.rows() {
        let matches = row.at(key_idx).and_then(|k| index.rows.get(k));
        match matches {
            Some(right_rows) => {
                for right in right_rows.iter().filter_map(|&r| index.table.row(r)) {
                    let mut joined: Vec<Cell> = row.cells().to_vec();
                    joined.extend(carried.iter().map(|&c| right.cells()[c].clone()));
                    out.push_row(joined)?;
                }
            }
            None if kind == JoinKind::Left => {
                let mut joined: Vec<Cell> = row.cells().to_vec();
                joined.extend(std::iter::repeat_n(None, carried.len()));
                out.push_row(joined)?;
            }
            None => {}
        }
    }
    Ok(out)
}

/// Rows whose key appears on both sides
pub fn inner_join(left: &Table, right: &Table, key: &JoinKey) -> Result<Table> {
    let index = JoinIndex::build(right, &key.right)?;
    let out = join_with_index(left, &key.left, &index, JoinKind::Inner)?;
    debug!(
        "Inner join on {}={}: {} x {} -> {} rows",
        key.left,
        key.right,
        left.len(),
        right.len(),
        out.len()
    );
    Ok(out)
}

/// Every left row, with right columns null-filled when there is no match
pub fn left_join(left: &Table, right: &Table, key: &JoinKey) -> Result<Table> {
    let index = JoinIndex::build(right, &key.right)?;
    let out = join_with_index(left, &key.left, &index, JoinKind::Left)?;
    debug!(
        "Left join on {}={}: {} x {} -> {} rows",
        key.left,
        key.right,
        left.len(),
        right.len(),
        out.len()
    );
    Ok(out)
}

/// Join each streamed batch against `index` as it arrives.
///
/// Only joined rows are retained, so memory stays bounded by the output
/// rather than by the streamed file.
pub fn stream_join<I>(batches: I, left_key: &str, index: &JoinIndex<'_>, kind: JoinKind) -> Result<Table>
where
    I: IntoIterator<Item = Result<Table>>,
{
    let mut out = Table::default();
    for batch in batches {
        out.append(join_with_index(&batch?, left_key, index, kind)?)?;
    }
    Ok(out)
}

/// Distinct non-null values of a column, for semi-join filters on streamed files
pub fn key_set(table: &Table, column: &str) -> Result<HashSet<String>> {
    Ok(table
        .column_values(column)?
        .into_iter()
        .flatten()
        .map(str::to_string)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_loader::Fields;

    fn table(columns: &[&str], rows: &[&[Option<&str>]]) -> Table {
        let mut t = Table::new(columns.iter().copied());
        for row in rows {
            t.push_row(row.iter().map(|c| c.map(str::to_string)).collect())
                .unwrap();
        }
        t
    }

    fn titles() -> Table {
        table(
            &["tconst", "startYear", "genres"],
            &[
                &[Some("A"), Some("2020"), Some("Action")],
                &[Some("B"), Some("2021"), Some("Drama")],
                &[Some("C"), Some("2020"), Some("Action")],
                &[None, Some("2019"), Some("Drama")],
            ],
        )
    }

    fn ratings() -> Table {
        table(
            &["tconst", "averageRating"],
            &[&[Some("A"), Some("8.0")], &[Some("B"), Some("5.0")], &[Some("Z"), Some("9.9")]],
        )
    }

    #[test]
    fn test_inner_join_only_shared_keys() {
        let joined = inner_join(&titles(), &ratings(), &JoinKey::on("tconst")).unwrap();
        let keys = joined.column_values("tconst").unwrap();
        assert_eq!(keys, vec![Some("A"), Some("B")]);
        assert_eq!(joined.columns(), &["tconst", "startYear", "genres", "averageRating"]);
    }

    #[test]
    fn test_left_join_keeps_every_left_row() {
        let left = titles();
        let joined = left_join(&left, &ratings(), &JoinKey::on("tconst")).unwrap();
        assert_eq!(joined.len(), left.len());
        assert_eq!(joined.row(2).unwrap().field("averageRating"), None);

        let inner = inner_join(&left, &ratings(), &JoinKey::on("tconst")).unwrap();
        assert!(joined.len() >= inner.len());
    }

    #[test]
    fn test_different_key_names_and_collisions() {
        let akas = table(
            &["titleId", "genres"],
            &[&[Some("A"), Some("Thriller")]],
        );
        let joined = inner_join(&titles(), &akas, &JoinKey::new("tconst", "titleId")).unwrap();
        assert_eq!(joined.columns(), &["tconst", "startYear", "genres", "genres_right"]);
        assert_eq!(joined.row(0).unwrap().field("genres_right"), Some("Thriller"));
    }

    #[test]
    fn test_many_to_many_multiplies_rows() {
        let credits = table(
            &["tconst", "nconst"],
            &[&[Some("A"), Some("nm1")], &[Some("A"), Some("nm2")], &[Some("B"), Some("nm1")]],
        );
        let joined = inner_join(&ratings(), &credits, &JoinKey::on("tconst")).unwrap();
        assert_eq!(joined.len(), 3);
    }

    #[test]
    fn test_stream_join_matches_in_memory_join() {
        let right = ratings();
        let index = JoinIndex::build(&right, "tconst").unwrap();
        let batches = vec![
            Ok(table(&["tconst", "startYear", "genres"], &[&[Some("A"), Some("2020"), Some("Action")]])),
            Ok(table(
                &["tconst", "startYear", "genres"],
                &[&[Some("C"), Some("2020"), Some("Action")], &[Some("B"), Some("2021"), Some("Drama")]],
            )),
        ];
        let streamed = stream_join(batches, "tconst", &index, JoinKind::Inner).unwrap();
        let keys = streamed.column_values("tconst").unwrap();
        assert_eq!(keys, vec![Some("A"), Some("B")]);
    }

    #[test]
    fn test_missing_key_column() {
        assert!(inner_join(&titles(), &ratings(), &JoinKey::on("nconst")).is_err());
    }
}
