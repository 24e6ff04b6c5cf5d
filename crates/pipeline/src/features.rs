//! The feature contract shared by training and serving.
//!
//! One canonical layout is used everywhere: [`FEATURE_ORDER`] at
//! [`FEATURE_SCHEMA_VERSION`]. A model artifact records both, and a loader
//! expecting a different layout refuses the artifact.

use crate::aggregate::{ScoreMap, ScoreSummary};
use crate::config::ImputeStrategy;
use crate::encoder::Vocabulary;
use data_loader::types::columns;
use data_loader::{Result, Table};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub const FEATURE_SCHEMA_VERSION: u32 = 1;

pub const FEATURE_COUNT: usize = 7;

pub const FEATURE_ORDER: [&str; FEATURE_COUNT] = [
    "startYear",
    "runtimeMinutes",
    "genreCode",
    "langCode",
    "numVotes",
    "directorScore",
    "actorScore",
];

/// One model input, in typed form
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector {
    pub start_year: u16,
    pub runtime_minutes: u32,
    pub genre_code: u32,
    pub lang_code: u32,
    pub num_votes: u64,
    pub director_score: f64,
    pub actor_score: f64,
}

impl FeatureVector {
    /// Values in [`FEATURE_ORDER`]
    pub fn to_array(&self) -> [f64; FEATURE_COUNT] {
        [
            f64::from(self.start_year),
            f64::from(self.runtime_minutes),
            f64::from(self.genre_code),
            f64::from(self.lang_code),
            self.num_votes as f64,
            self.director_score,
            self.actor_score,
        ]
    }
}

/// Encoded training rows with their targets
#[derive(Debug, Clone, Default)]
pub struct TrainingSet {
    pub titles: Vec<String>,
    pub features: Vec<FeatureVector>,
    pub targets: Vec<f64>,
    /// Rows dropped for unparsable numeric fields
    pub skipped: usize,
}

impl TrainingSet {
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// Everything needed to turn a movie into a [`FeatureVector`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSpace {
    pub genre: Vocabulary,
    pub language: Vocabulary,
    /// Substitute for a missing director score
    pub director_fallback: f64,
    /// Substitute for a missing actor score
    pub actor_fallback: f64,
}

impl FeatureSpace {
    /// Fit vocabularies over the movie table and derive score fallbacks.
    ///
    /// The genre vocabulary is built over the full comma-joined genre string,
    /// one category per distinct combination. A fallback comes from the
    /// person score mapping; when that is empty it falls back to the ratings.
    pub fn fit(
        movies: &Table,
        director_scores: &ScoreMap,
        actor_scores: &ScoreMap,
        impute: ImputeStrategy,
    ) -> Result<Self> {
        let genre = Vocabulary::fit(movies.column_values(columns::GENRES)?.into_iter().flatten());
        let language = Vocabulary::fit(movies.column_values(columns::LANGUAGE)?.into_iter().flatten());

        let rating_summary = ScoreSummary::of_column(movies, columns::AVERAGE_RATING)?;
        let fallback = |scores: &ScoreMap, role: &str| {
            match ScoreSummary::of(scores).or(rating_summary) {
                Some(summary) => summary.value(impute),
                None => {
                    warn!("No {} scores or ratings to impute from; using 0", role);
                    0.0
                }
            }
        };

        let space = Self {
            director_fallback: fallback(director_scores, "director"),
            actor_fallback: fallback(actor_scores, "actor"),
            genre,
            language,
        };
        debug!(
            "Feature space: {} genres, {} languages, fallbacks {:.3}/{:.3}",
            space.genre.len(),
            space.language.len(),
            space.director_fallback,
            space.actor_fallback
        );
        Ok(space)
    }

    /// Encode every usable row of the movie table.
    ///
    /// Missing score columns are tolerated and imputed like null cells.
    pub fn training_set(&self, movies: &Table) -> Result<TrainingSet> {
        let tconst = movies.require_column(columns::TCONST)?;
        let year = movies.require_column(columns::START_YEAR)?;
        let runtime = movies.require_column(columns::RUNTIME_MINUTES)?;
        let genres = movies.require_column(columns::GENRES)?;
        let language = movies.require_column(columns::LANGUAGE)?;
        let votes = movies.require_column(columns::NUM_VOTES)?;
        let rating = movies.require_column(columns::AVERAGE_RATING)?;
        let director = movies.column_index(columns::DIRECTOR_SCORE);
        let actor = movies.column_index(columns::ACTOR_SCORE);

        let score = |row: &data_loader::TableRow<'_>, idx: Option<usize>, fallback: f64| {
            idx.and_then(|i| row.at(i))
                .and_then(|v| v.parse::<f64>().ok())
                .filter(|v| v.is_finite())
                .unwrap_or(fallback)
        };

        let mut set = TrainingSet::default();
        for row in movies.rows() {
            let parsed = (|| {
                Some((
                    FeatureVector {
                        start_year: row.at(year)?.parse().ok()?,
                        runtime_minutes: row.at(runtime)?.parse().ok()?,
                        genre_code: self.genre.encode(row.at(genres)?).ok()?,
                        lang_code: self.language.encode(row.at(language)?).ok()?,
                        num_votes: row.at(votes)?.parse().ok()?,
                        director_score: score(&row, director, self.director_fallback),
                        actor_score: score(&row, actor, self.actor_fallback),
                    },
                    row.at(rating)?.parse::<f64>().ok().filter(|r| r.is_finite())?,
                ))
            })();
            match parsed {
                Some((features, target)) => {
                    set.titles.push(row.at(tconst).unwrap_or_default().to_string());
                    set.features.push(features);
                    set.targets.push(target);
                }
                None => set.skipped += 1,
            }
        }
        if set.skipped > 0 {
            warn!("Skipped {} movie rows with unusable fields", set.skipped);
        }
        Ok(set)
    }
}
