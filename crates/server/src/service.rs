//! # Prediction Service
//!
//! Turns a raw prediction request into a rating, verdict and success rate:
//! 1. Validate numeric inputs against the configured bounds
//! 2. Encode genre and language against the frozen vocabularies
//! 3. Look up director and actor scores, substituting the training fallback
//! 4. Predict, clamp and classify
//!
//! Fallbacks never fail the request; each one is reported as a [`Notice`].
//! The service only reads frozen state, so clones can serve concurrent
//! requests from any number of threads.

use crate::error::{PredictionError, Result};
use crate::scores::PersonScoreTable;
use anyhow::Context;
use data_loader::types::columns;
use model::{MODEL_FILE, RatingPredictor, Verdict};
use pipeline::{
    Artifact, EncodeError, Encoded, FallbackBucket, FallbackPolicy, FeatureVector, PipelineConfig, Vocabulary,
};
use std::fmt;
use std::ops::RangeInclusive;
use std::sync::Arc;
use tracing::{debug, info};

/// Raw user input for one prediction
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionRequest {
    pub release_year: i64,
    pub runtime_minutes: i64,
    /// One genre or a comma-separated combination
    pub genre: String,
    pub language: String,
    pub expected_votes: i64,
    pub director: Option<String>,
    pub actor: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Director,
    Actor,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Director => f.write_str("director"),
            Role::Actor => f.write_str("actor"),
        }
    }
}

/// A non-fatal substitution made while building the feature vector
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    CategoryFallback {
        field: &'static str,
        value: String,
        bucket: FallbackBucket,
        substituted: String,
    },
    PersonNotFound {
        role: Role,
        name: String,
        substituted: f64,
    },
    PersonNotSupplied {
        role: Role,
        substituted: f64,
    },
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::CategoryFallback {
                field,
                value,
                bucket,
                substituted,
            } => {
                let reason = match bucket {
                    FallbackBucket::Unknown => "the Unknown bucket",
                    FallbackBucket::Lowest => "the first known value",
                };
                write!(
                    f,
                    "{field} '{value}' was not seen during training; using {reason} ('{substituted}')"
                )
            }
            Notice::PersonNotFound {
                role,
                name,
                substituted,
            } => write!(
                f,
                "{role} '{name}' not found; using the average {role} score {substituted:.2}"
            ),
            Notice::PersonNotSupplied { role, substituted } => {
                write!(f, "no {role} given; using the average {role} score {substituted:.2}")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PredictionResponse {
    pub rating: f64,
    pub verdict: Verdict,
    pub success_rate: f64,
    pub notices: Vec<Notice>,
    pub features: FeatureVector,
}

impl PredictionResponse {
    pub fn message(&self) -> &'static str {
        self.verdict.message()
    }
}

#[derive(Debug, Clone)]
struct Inner {
    predictor: RatingPredictor,
    directors: PersonScoreTable,
    actors: PersonScoreTable,
    years: RangeInclusive<u16>,
    runtimes: RangeInclusive<u32>,
    policy: FallbackPolicy,
}

/// Cheaply clonable handle to the frozen model and score tables
#[derive(Debug, Clone)]
pub struct PredictionService {
    inner: Arc<Inner>,
}

impl PredictionService {
    pub fn new(
        predictor: RatingPredictor,
        directors: PersonScoreTable,
        actors: PersonScoreTable,
        config: &PipelineConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                predictor,
                directors,
                actors,
                years: config.year_range(),
                runtimes: config.runtime_range(),
                policy: FallbackPolicy::UnknownThenLowest,
            }),
        }
    }

    /// Load the model and score tables from the output directory.
    ///
    /// Missing score tables are tolerated: every lookup then falls back.
    pub fn load(config: &PipelineConfig) -> anyhow::Result<Self> {
        let dir = &config.out_dir;
        let predictor = RatingPredictor::load(&dir.join(MODEL_FILE))
            .with_context(|| format!("Failed to load model from {}", dir.display()))?;

        let load_scores = |artifact: Artifact, column: &str| -> anyhow::Result<PersonScoreTable> {
            let path = dir.join(artifact.file_name());
            if path.is_file() {
                PersonScoreTable::load(&path, column)
            } else {
                info!("{} not found; all lookups will use the fallback", path.display());
                Ok(PersonScoreTable::default())
            }
        };
        let directors = load_scores(Artifact::DirectorScores, columns::DIRECTOR_SCORE)?;
        let actors = load_scores(Artifact::ActorScores, columns::ACTOR_SCORE)?;
        info!(
            "Prediction service ready: {} directors, {} actors",
            directors.len(),
            actors.len()
        );
        Ok(Self::new(predictor, directors, actors, config))
    }

    /// Replace the unseen-category policy (builder pattern)
    pub fn with_fallback_policy(mut self, policy: FallbackPolicy) -> Self {
        Arc::make_mut(&mut self.inner).policy = policy;
        self
    }

    pub fn predictor(&self) -> &RatingPredictor {
        &self.inner.predictor
    }

    pub fn predict(&self, request: &PredictionRequest) -> Result<PredictionResponse> {
        let inner = &self.inner;
        let start_year = check_range(
            "releaseYear",
            request.release_year,
            *inner.years.start(),
            *inner.years.end(),
        )?;
        let runtime_minutes = check_range(
            "runtimeMinutes",
            request.runtime_minutes,
            *inner.runtimes.start(),
            *inner.runtimes.end(),
        )?;
        if request.expected_votes < 0 {
            return Err(PredictionError::InvalidRange {
                field: "expectedVotes",
                value: request.expected_votes,
                min: 0,
                max: i64::MAX,
            });
        }

        let mut notices = Vec::new();
        let space = inner.predictor.feature_space();
        let genre = normalize_genre(&request.genre);
        let language = request.language.trim().to_lowercase();
        let genre_code = self.encode("genre", &genre, &space.genre, &mut notices)?;
        let lang_code = self.encode("language", &language, &space.language, &mut notices)?;

        let director_score = lookup_person(
            Role::Director,
            request.director.as_deref(),
            &inner.directors,
            space.director_fallback,
            &mut notices,
        );
        let actor_score = lookup_person(
            Role::Actor,
            request.actor.as_deref(),
            &inner.actors,
            space.actor_fallback,
            &mut notices,
        );

        let features = FeatureVector {
            start_year,
            runtime_minutes,
            genre_code,
            lang_code,
            num_votes: request.expected_votes as u64,
            director_score,
            actor_score,
        };
        let assessment = inner.predictor.assess(&features);
        debug!(
            "Predicted {:.2} ({}) with {} notices",
            assessment.rating,
            assessment.verdict,
            notices.len()
        );
        Ok(PredictionResponse {
            rating: assessment.rating,
            verdict: assessment.verdict,
            success_rate: assessment.success_rate,
            notices,
            features,
        })
    }

    /// Run a prediction on the blocking pool
    pub async fn predict_blocking(&self, request: PredictionRequest) -> Result<PredictionResponse> {
        let service = self.clone();
        tokio::task::spawn_blocking(move || service.predict(&request))
            .await
            .map_err(|e| PredictionError::Aborted {
                field: "request",
                reason: e.to_string(),
            })?
    }

    fn encode(
        &self,
        field: &'static str,
        value: &str,
        vocabulary: &Vocabulary,
        notices: &mut Vec<Notice>,
    ) -> Result<u32> {
        if value.is_empty() {
            return Err(PredictionError::MissingInput { field });
        }
        match vocabulary.encode_or_fallback(value, self.inner.policy) {
            Ok(Encoded::Known(code)) => Ok(code),
            Ok(Encoded::Fallback { code, bucket }) => {
                notices.push(Notice::CategoryFallback {
                    field,
                    value: value.to_string(),
                    bucket,
                    substituted: vocabulary.decode(code).unwrap_or_default().to_string(),
                });
                Ok(code)
            }
            Err(EncodeError::UnseenCategory { value }) => Err(PredictionError::UnseenCategory { field, value }),
            Err(e) => Err(PredictionError::Aborted {
                field,
                reason: e.to_string(),
            }),
        }
    }
}

fn check_range<T>(field: &'static str, value: i64, min: T, max: T) -> Result<T>
where
    T: Copy + Into<i64> + TryFrom<i64>,
{
    let (lo, hi) = (min.into(), max.into());
    if (lo..=hi).contains(&value) {
        if let Ok(v) = T::try_from(value) {
            return Ok(v);
        }
    }
    Err(PredictionError::InvalidRange {
        field,
        value,
        min: lo,
        max: hi,
    })
}

/// `" Action , Drama"` becomes `"Action,Drama"`, matching the vocabulary form
fn normalize_genre(genre: &str) -> String {
    genre
        .split(',')
        .map(str::trim)
        .filter(|g| !g.is_empty())
        .collect::<Vec<_>>()
        .join(",")
}

fn lookup_person(
    role: Role,
    name: Option<&str>,
    table: &PersonScoreTable,
    fallback: f64,
    notices: &mut Vec<Notice>,
) -> f64 {
    match name.map(str::trim).filter(|n| !n.is_empty()) {
        Some(name) => table.lookup(name).unwrap_or_else(|| {
            notices.push(Notice::PersonNotFound {
                role,
                name: name.to_string(),
                substituted: fallback,
            });
            fallback
        }),
        None => {
            notices.push(Notice::PersonNotSupplied {
                role,
                substituted: fallback,
            });
            fallback
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::{LinearRegressor, ModelArtifact};
    use pipeline::{FeatureSpace, ScoreMap, UNKNOWN_CATEGORY};

    fn service(genres: &[&str]) -> PredictionService {
        let artifact = ModelArtifact::new(
            LinearRegressor {
                coefficients: vec![0.0, 0.0, 0.0, 0.0, 0.0, 0.6, 0.4],
                intercept: 0.0,
            },
            FeatureSpace {
                genre: Vocabulary::fit(genres.iter().copied()),
                language: Vocabulary::fit(["hi", "ta", "te"]),
                director_fallback: 6.0,
                actor_fallback: 5.0,
            },
            None,
            100,
        );
        let directors = PersonScoreTable::from_scores(&ScoreMap::from([("Mani Ratnam".to_string(), 9.0)]));
        let actors = PersonScoreTable::from_scores(&ScoreMap::from([("Kamal Haasan".to_string(), 8.0)]));
        PredictionService::new(
            RatingPredictor::from_artifact(artifact).unwrap(),
            directors,
            actors,
            &PipelineConfig::default(),
        )
    }

    fn request() -> PredictionRequest {
        PredictionRequest {
            release_year: 2024,
            runtime_minutes: 150,
            genre: "Action, Drama".to_string(),
            language: "TA".to_string(),
            expected_votes: 5000,
            director: Some("mani ratnam".to_string()),
            actor: Some("Kamal Haasan".to_string()),
        }
    }

    #[test]
    fn test_known_inputs_have_no_notices() {
        let response = service(&["Action,Drama", "Drama"]).predict(&request()).unwrap();
        assert!(response.notices.is_empty());
        assert!((response.rating - 8.6).abs() < 1e-9);
        assert_eq!(response.verdict, Verdict::Blockbuster);
        assert_eq!(response.features.genre_code, 0);
        assert_eq!(response.features.lang_code, 1);
        assert_eq!(response.message(), "This movie is expected to dominate the box office!");
    }

    #[test]
    fn test_unseen_genre_uses_unknown_bucket() {
        let svc = service(&["Action", "Drama", UNKNOWN_CATEGORY]);
        let mut req = request();
        req.genre = "Sci-Fi".to_string();
        let response = svc.predict(&req).unwrap();
        assert_eq!(response.features.genre_code, 2);
        assert!(matches!(
            &response.notices[0],
            Notice::CategoryFallback { field: "genre", bucket: FallbackBucket::Unknown, .. }
        ));
    }

    #[test]
    fn test_refuse_policy_names_the_field() {
        let svc = service(&["Drama"]).with_fallback_policy(FallbackPolicy::Refuse);
        let mut req = request();
        req.genre = "Drama".to_string();
        req.language = "xx".to_string();
        let err = svc.predict(&req).unwrap_err();
        assert_eq!(err.field(), "language");
    }

    #[test]
    fn test_empty_vocabulary_is_not_blamed_on_the_input() {
        let err = service(&[]).predict(&request()).unwrap_err();
        assert_eq!(err.field(), "genre");
        assert!(matches!(err, PredictionError::Aborted { .. }), "{err:?}");
    }

    #[test]
    fn test_unknown_person_falls_back_with_notice() {
        let mut req = request();
        req.genre = "Drama".to_string();
        req.director = Some("Nobody".to_string());
        req.actor = None;
        let response = service(&["Drama"]).predict(&req).unwrap();
        assert_eq!(response.features.director_score, 6.0);
        assert_eq!(response.features.actor_score, 5.0);
        assert_eq!(response.notices.len(), 2);
        assert!(response.notices[0].to_string().contains("Nobody"));
    }

    #[test]
    fn test_out_of_range_inputs_are_rejected() {
        let svc = service(&["Drama"]);
        let mut req = request();
        req.release_year = 1900;
        assert_eq!(svc.predict(&req).unwrap_err().field(), "releaseYear");

        let mut req = request();
        req.runtime_minutes = 401;
        assert_eq!(svc.predict(&req).unwrap_err().field(), "runtimeMinutes");

        let mut req = request();
        req.expected_votes = -1;
        assert_eq!(svc.predict(&req).unwrap_err().field(), "expectedVotes");

        let mut req = request();
        req.genre = " , ".to_string();
        assert_eq!(
            svc.predict(&req).unwrap_err(),
            PredictionError::MissingInput { field: "genre" }
        );
    }

    #[test]
    fn test_normalize_genre() {
        assert_eq!(normalize_genre(" Action , Drama "), "Action,Drama");
        assert_eq!(normalize_genre("Drama,"), "Drama");
    }
}
