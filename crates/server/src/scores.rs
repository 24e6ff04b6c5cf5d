//! Case-insensitive person score lookup for serving.

use anyhow::{Context, Result};
use data_loader::Table;
use data_loader::types::columns;
use pipeline::ScoreMap;
use pipeline::aggregate::score_map;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::path::Path;
use tracing::debug;

/// Person name to score, keyed by the trimmed, lowercased name
#[derive(Debug, Clone, Default)]
pub struct PersonScoreTable {
    scores: HashMap<String, f64>,
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

impl PersonScoreTable {
    /// Names that collide after normalization keep the first entry in sorted order
    pub fn from_scores(scores: &ScoreMap) -> Self {
        let mut table = HashMap::with_capacity(scores.len());
        for (name, score) in scores {
            match table.entry(normalize(name)) {
                Entry::Vacant(slot) => {
                    slot.insert(*score);
                }
                Entry::Occupied(_) => debug!("Ignoring duplicate score entry for '{}'", name),
            }
        }
        Self { scores: table }
    }

    /// Read a persisted `primaryName, <score_column>` table
    pub fn load(path: &Path, score_column: &str) -> Result<Self> {
        let table = Table::read_csv(path).with_context(|| format!("Failed to read {}", path.display()))?;
        let scores = score_map(&table, columns::PRIMARY_NAME, score_column)?;
        Ok(Self::from_scores(&scores))
    }

    pub fn lookup(&self, name: &str) -> Option<f64> {
        self.scores.get(&normalize(name)).copied()
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_ignores_case_and_whitespace() {
        let scores = ScoreMap::from([("Mani Ratnam".to_string(), 7.4)]);
        let table = PersonScoreTable::from_scores(&scores);
        assert_eq!(table.lookup("mani ratnam"), Some(7.4));
        assert_eq!(table.lookup("  MANI RATNAM "), Some(7.4));
        assert_eq!(table.lookup("Bala"), None);
    }

    #[test]
    fn test_colliding_names_keep_first() {
        let scores = ScoreMap::from([("RAVI".to_string(), 5.0), ("Ravi".to_string(), 8.0)]);
        let table = PersonScoreTable::from_scores(&scores);
        assert_eq!(table.len(), 1);
        assert_eq!(table.lookup("ravi"), Some(5.0));
    }

    #[test]
    fn test_load_from_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("director_scores.csv");
        std::fs::write(&path, "primaryName,director_score\nBala,6.5\nPriya,\n").unwrap();
        let table = PersonScoreTable::load(&path, "director_score").unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.lookup("bala"), Some(6.5));
    }
}
