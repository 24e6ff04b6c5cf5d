//! Keyed reduction to at most one row per key.
//!
//! Used for multi-valued right sides (regional titles per movie) that must be
//! collapsed before a join. Each offered row carries a rank; the lowest rank
//! per key wins and equal ranks keep the row seen first, so the result does
//! not depend on how the input was chunked.

use data_loader::{AkaRecord, Cell, Result, ScriptLanguageDetector, Table};
use std::collections::{BTreeSet, HashMap};

/// Streaming best-row-per-key selector
pub struct KeyedReducer<R> {
    columns: Vec<String>,
    key_idx: usize,
    slots: HashMap<String, usize>,
    rows: Vec<(R, Vec<Cell>)>,
}

impl<R: Ord> KeyedReducer<R> {
    pub fn new(columns: Vec<String>, key: &str) -> Result<Self> {
        let key_idx = Table::new(columns.iter()).require_column(key)?;
        Ok(Self {
            columns,
            key_idx,
            slots: HashMap::new(),
            rows: Vec::new(),
        })
    }

    /// Offer one row; rows with a null key are ignored
    pub fn offer(&mut self, rank: R, row: Vec<Cell>) {
        let Some(key) = row.get(self.key_idx).cloned().flatten() else {
            return;
        };
        match self.slots.get(&key) {
            Some(&slot) => {
                if rank < self.rows[slot].0 {
                    self.rows[slot] = (rank, row);
                }
            }
            None => {
                self.slots.insert(key, self.rows.len());
                self.rows.push((rank, row));
            }
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Winning rows in first-seen key order
    pub fn finish(self) -> Result<Table> {
        let mut table = Table::new(self.columns);
        for (_, row) in self.rows {
            table.push_row(row)?;
        }
        Ok(table)
    }
}

/// Where an aka row's language came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LanguageSource {
    /// The row's own language column, already in the target set
    Provided,
    /// Script detection over the regional title
    Detected,
}

/// Preference order for regional titles of one movie; lower is better
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct AkaRank {
    pub source: LanguageSource,
    pub not_original: bool,
}

impl AkaRank {
    pub fn new(source: LanguageSource, is_original_title: bool) -> Self {
        Self {
            source,
            not_original: !is_original_title,
        }
    }
}

/// Resolve the language of a regional title.
///
/// The provided language wins when it is a target language; otherwise the
/// title text is classified by script. Results outside `targets` are `None`.
pub fn resolve_aka_language(
    aka: &AkaRecord,
    targets: &BTreeSet<String>,
    detector: &ScriptLanguageDetector,
) -> Option<(String, LanguageSource)> {
    if let Some(lang) = aka.language.as_deref().filter(|l| targets.contains(*l)) {
        return Some((lang.to_string(), LanguageSource::Provided));
    }
    detector
        .detect(aka.title.as_deref())
        .filter(|code| targets.contains(*code))
        .map(|code| (code.to_string(), LanguageSource::Detected))
}
