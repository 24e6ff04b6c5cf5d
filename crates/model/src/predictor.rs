//! Rating prediction from a loaded model artifact.

use crate::artifact::ModelArtifact;
use crate::error::Result;
use crate::regressor::LinearRegressor;
use crate::verdict::{Verdict, success_rate};
use pipeline::{FeatureSpace, FeatureVector};
use serde::Serialize;
use std::path::Path;

/// A prediction with its derived verdict
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Assessment {
    pub rating: f64,
    pub verdict: Verdict,
    pub success_rate: f64,
}

/// Frozen regressor plus the feature space it was trained in.
///
/// Holds no mutable state, so a shared reference can be used from any
/// number of threads.
#[derive(Debug, Clone)]
pub struct RatingPredictor {
    regressor: LinearRegressor,
    features: FeatureSpace,
}

impl RatingPredictor {
    pub fn from_artifact(artifact: ModelArtifact) -> Result<Self> {
        artifact.check_schema()?;
        Ok(Self {
            regressor: artifact.regressor,
            features: artifact.features,
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        Self::from_artifact(ModelArtifact::load(path)?)
    }

    pub fn feature_space(&self) -> &FeatureSpace {
        &self.features
    }

    /// Predicted rating clamped to [0, 10]
    pub fn predict(&self, features: &FeatureVector) -> f64 {
        let raw = self.regressor.predict(features);
        if raw.is_finite() { raw.clamp(0.0, 10.0) } else { 0.0 }
    }

    pub fn assess(&self, features: &FeatureVector) -> Assessment {
        let rating = self.predict(features);
        Assessment {
            rating,
            verdict: Verdict::classify(rating),
            success_rate: success_rate(rating),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipeline::Vocabulary;

    fn predictor(intercept: f64) -> RatingPredictor {
        RatingPredictor::from_artifact(ModelArtifact::new(
            LinearRegressor {
                coefficients: vec![0.0, 0.0, 0.0, 0.0, 0.0, 0.5, 0.5],
                intercept,
            },
            FeatureSpace {
                genre: Vocabulary::fit(["Drama"]),
                language: Vocabulary::fit(["hi"]),
                director_fallback: 6.0,
                actor_fallback: 6.0,
            },
            None,
            10,
        ))
        .unwrap()
    }

    fn vector(director: f64, actor: f64) -> FeatureVector {
        FeatureVector {
            start_year: 2020,
            runtime_minutes: 140,
            genre_code: 0,
            lang_code: 0,
            num_votes: 1000,
            director_score: director,
            actor_score: actor,
        }
    }

    #[test]
    fn test_assess() {
        let assessment = predictor(0.0).assess(&vector(9.0, 8.0));
        assert_eq!(assessment.rating, 8.5);
        assert_eq!(assessment.verdict, Verdict::Blockbuster);
        assert!((assessment.success_rate - 85.0).abs() < 1e-9);
    }

    #[test]
    fn test_prediction_is_clamped() {
        assert_eq!(predictor(5.0).predict(&vector(9.0, 9.0)), 10.0);
        assert_eq!(predictor(-20.0).predict(&vector(1.0, 1.0)), 0.0);
    }
}
