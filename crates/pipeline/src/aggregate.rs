//! Grouped mean statistics and person scoring.
//!
//! A director (or actor) score is the mean rating over every title the person
//! is credited on. Scores are computed per name, joined back onto the credits
//! and averaged again per title, so a movie with several credited people gets
//! the mean of their scores.

use crate::config::ImputeStrategy;
use crate::join::{JoinKey, inner_join};
use data_loader::types::columns;
use data_loader::{Cell, Result, Table};
use std::collections::BTreeMap;
use tracing::debug;

/// Group key to mean value
pub type ScoreMap = BTreeMap<String, f64>;

/// Mean of `value_column` per distinct `group_key`.
///
/// Null and non-numeric values are excluded from both sum and count; a group
/// with no numeric values gets no entry. Rows with a null group key are
/// ignored. Values are summed in sorted order so the result does not depend
/// on row order.
pub fn aggregate_mean(table: &Table, group_key: &str, value_column: &str) -> Result<ScoreMap> {
    let key_idx = table.require_column(group_key)?;
    let value_idx = table.require_column(value_column)?;

    let mut groups: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    let mut excluded = 0usize;
    for row in table.rows() {
        let Some(key) = row.at(key_idx) else {
            continue;
        };
        let entry = groups.entry(key).or_default();
        match row.at(value_idx).and_then(|v| v.parse::<f64>().ok()) {
            Some(v) if v.is_finite() => entry.push(v),
            _ => excluded += 1,
        }
    }

    let scores: ScoreMap = groups
        .into_iter()
        .filter_map(|(key, values)| mean(values).map(|m| (key.to_string(), m)))
        .collect();
    debug!(
        "Mean of {} by {}: {} groups, {} null values excluded",
        value_column,
        group_key,
        scores.len(),
        excluded
    );
    Ok(scores)
}

fn mean(mut values: Vec<f64>) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Add (or replace) `column` on a copy of `table`, looked up by `join_key`.
///
/// Keys without an entry get null.
pub fn attach_score(table: &Table, scores: &ScoreMap, join_key: &str, column: &str) -> Result<Table> {
    let key_idx = table.require_column(join_key)?;
    let values: Vec<Cell> = table
        .rows()
        .map(|row| {
            row.at(key_idx)
                .and_then(|k| scores.get(k))
                .map(|v| v.to_string())
        })
        .collect();
    let mut out = table.clone();
    out.set_column(column, values)?;
    Ok(out)
}

/// Central tendency of a score mapping, used to fill missing scores
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreSummary {
    pub mean: f64,
    pub median: f64,
    pub count: usize,
}

impl ScoreSummary {
    /// `None` for an empty mapping
    pub fn of(scores: &ScoreMap) -> Option<Self> {
        Self::from_values(scores.values().copied().collect())
    }

    /// Summary of the numeric values in one column
    pub fn of_column(table: &Table, column: &str) -> Result<Option<Self>> {
        let values = table
            .column_values(column)?
            .into_iter()
            .flatten()
            .filter_map(|v| v.parse::<f64>().ok())
            .filter(|v| v.is_finite())
            .collect();
        Ok(Self::from_values(values))
    }

    fn from_values(mut values: Vec<f64>) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        values.sort_by(f64::total_cmp);
        let count = values.len();
        let median = if count % 2 == 1 {
            values[count / 2]
        } else {
            (values[count / 2 - 1] + values[count / 2]) / 2.0
        };
        Some(Self {
            mean: values.iter().sum::<f64>() / count as f64,
            median,
            count,
        })
    }

    pub fn value(&self, strategy: ImputeStrategy) -> f64 {
        match strategy {
            ImputeStrategy::Mean => self.mean,
            ImputeStrategy::Median => self.median,
        }
    }
}

/// Replace nulls in `column` with `value`; returns how many cells were filled
pub fn impute(table: &mut Table, column: &str, value: f64) -> Result<usize> {
    let mut filled = 0;
    let values: Vec<Cell> = table
        .column_values(column)?
        .into_iter()
        .map(|cell| match cell {
            Some(v) => Some(v.to_string()),
            None => {
                filled += 1;
                Some(value.to_string())
            }
        })
        .collect();
    table.set_column(column, values)?;
    Ok(filled)
}

/// Scores for one credit category
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersonScores {
    /// Person name to mean rating of their titles
    pub by_person: ScoreMap,
    /// Title id to mean score of its credited people
    pub by_title: ScoreMap,
}

/// Score the people in `credits` (`tconst`, `nconst`) against the movie ratings.
///
/// `movies` needs `tconst` and `averageRating`, `names` needs `nconst` and
/// `primaryName`. Scores are grouped by name, so two people sharing a name
/// share a score.
pub fn score_people(movies: &Table, credits: &Table, names: &Table) -> Result<PersonScores> {
    let ratings = movies.select(&[columns::TCONST, columns::AVERAGE_RATING])?;
    let rated = inner_join(credits, &ratings, &JoinKey::on(columns::TCONST))?;
    let named = inner_join(&rated, names, &JoinKey::on(columns::NCONST))?;

    let by_person = aggregate_mean(&named, columns::PRIMARY_NAME, columns::AVERAGE_RATING)?;
    let scored = attach_score(&named, &by_person, columns::PRIMARY_NAME, "person_score")?;
    let by_title = aggregate_mean(&scored, columns::TCONST, "person_score")?;

    debug!(
        "Scored {} people across {} titles from {} credits",
        by_person.len(),
        by_title.len(),
        credits.len()
    );
    Ok(PersonScores { by_person, by_title })
}

/// Two-column table of a score mapping, for persisting
pub fn score_table(scores: &ScoreMap, key_column: &str, value_column: &str) -> Result<Table> {
    let mut table = Table::new([key_column, value_column]);
    for (key, value) in scores {
        table.push_row(vec![Some(key.clone()), Some(value.to_string())])?;
    }
    Ok(table)
}

/// Inverse of [`score_table`]; rows with a null or non-numeric score are dropped
pub fn score_map(table: &Table, key_column: &str, value_column: &str) -> Result<ScoreMap> {
    let key_idx = table.require_column(key_column)?;
    let value_idx = table.require_column(value_column)?;
    Ok(table
        .rows()
        .filter_map(|row| {
            let key = row.at(key_idx)?;
            let value = row.at(value_idx)?.parse::<f64>().ok()?;
            Some((key.to_string(), value))
        })
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

    #[test]
    fn test_mean_excludes_nulls() {
        let t = table(
            &["g", "v"],
            &[&[Some("x"), Some("5.0")], &[Some("x"), None], &[Some("x"), Some("7.0")]],
        );
        let scores = aggregate_mean(&t, "g", "v").unwrap();
        assert_eq!(scores["x"], 6.0);
    }

    #[test]
    fn test_all_null_group_has_no_entry() {
        let t = table(
            &["g", "v"],
            &[&[Some("x"), None], &[Some("y"), Some("3.0")], &[None, Some("9.0")]],
        );
        let scores = aggregate_mean(&t, "g", "v").unwrap();
        assert!(!scores.contains_key("x"));
        assert_eq!(scores.len(), 1);
    }

    #[test]
    fn test_mean_independent_of_row_order() {
        let values = ["0.1", "0.2", "0.3", "1e16", "-1e16", "7.7"];
        let forward: Vec<[Option<&str>; 2]> = values.iter().map(|v| [Some("g"), Some(*v)]).collect();
        let backward: Vec<[Option<&str>; 2]> = values.iter().rev().map(|v| [Some("g"), Some(*v)]).collect();
        let a = table(&["k", "v"], &forward.iter().map(|r| &r[..]).collect::<Vec<_>>());
        let b = table(&["k", "v"], &backward.iter().map(|r| &r[..]).collect::<Vec<_>>());
        assert_eq!(
            aggregate_mean(&a, "k", "v").unwrap()["g"].to_bits(),
            aggregate_mean(&b, "k", "v").unwrap()["g"].to_bits()
        );
    }

    #[test]
    fn test_attach_score_nulls_unknown_keys() {
        let t = table(&["tconst"], &[&[Some("A")], &[Some("B")]]);
        let scores = ScoreMap::from([("A".to_string(), 7.5)]);
        let out = attach_score(&t, &scores, "tconst", "director_score").unwrap();
        assert_eq!(out.row(0).unwrap().field("director_score"), Some("7.5"));
        assert_eq!(out.row(1).unwrap().field("director_score"), None);
    }

    #[test]
    fn test_summary_and_impute() {
        let scores = ScoreMap::from([
            ("a".to_string(), 2.0),
            ("b".to_string(), 4.0),
            ("c".to_string(), 9.0),
        ]);
        let summary = ScoreSummary::of(&scores).unwrap();
        assert_eq!(summary.mean, 5.0);
        assert_eq!(summary.value(ImputeStrategy::Median), 4.0);
        assert!(ScoreSummary::of(&ScoreMap::new()).is_none());

        let mut t = table(&["s"], &[&[Some("1.5")], &[None]]);
        assert_eq!(impute(&mut t, "s", summary.mean).unwrap(), 1);
        assert_eq!(t.row(1).unwrap().field("s"), Some("5"));
    }

    #[test]
    fn test_score_people_averages_per_title() {
        let movies = table(
            &["tconst", "averageRating"],
            &[&[Some("A"), Some("8.0")], &[Some("B"), Some("6.0")], &[Some("C"), Some("4.0")]],
        );
        let credits = table(
            &["tconst", "nconst"],
            &[
                &[Some("A"), Some("nm1")],
                &[Some("B"), Some("nm1")],
                &[Some("C"), Some("nm2")],
                &[Some("C"), Some("nm1")],
                &[Some("C"), Some("nm9")],
            ],
        );
        let names = table(
            &["nconst", "primaryName"],
            &[&[Some("nm1"), Some("Mani Ratnam")], &[Some("nm2"), Some("Bala")]],
        );

        let scores = score_people(&movies, &credits, &names).unwrap();
        assert_eq!(scores.by_person["Mani Ratnam"], 6.0);
        assert_eq!(scores.by_person["Bala"], 4.0);
        assert_eq!(scores.by_title["A"], 6.0);
        assert_eq!(scores.by_title["C"], 5.0);
    }

    #[test]
    fn test_score_table_round_trip() {
        let scores = ScoreMap::from([("Bala".to_string(), 6.25)]);
        let t = score_table(&scores, "primaryName", "director_score").unwrap();
        assert_eq!(score_map(&t, "primaryName", "director_score").unwrap(), scores);
    }
}
