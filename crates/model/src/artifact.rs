//! Versioned, self-describing model artifact.
//!
//! The artifact bundles the regressor with the vocabularies and score
//! fallbacks it was trained against, plus the feature schema version and
//! order. Loading refuses an artifact whose schema differs from the one
//! compiled into this crate.

use crate::error::{ModelError, Result};
use crate::regressor::LinearRegressor;
use crate::training::Evaluation;
use pipeline::{FEATURE_COUNT, FEATURE_ORDER, FEATURE_SCHEMA_VERSION, FeatureSpace};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

/// File name of the artifact inside the output directory
pub const MODEL_FILE: &str = "model.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub schema_version: u32,
    pub feature_order: Vec<String>,
    pub regressor: LinearRegressor,
    pub features: FeatureSpace,
    pub evaluation: Option<Evaluation>,
    pub trained_rows: usize,
}

impl ModelArtifact {
    pub fn new(
        regressor: LinearRegressor,
        features: FeatureSpace,
        evaluation: Option<Evaluation>,
        trained_rows: usize,
    ) -> Self {
        Self {
            schema_version: FEATURE_SCHEMA_VERSION,
            feature_order: FEATURE_ORDER.iter().map(|s| s.to_string()).collect(),
            regressor,
            features,
            evaluation,
            trained_rows,
        }
    }

    /// Reject artifacts built for a different feature layout
    pub fn check_schema(&self) -> Result<()> {
        if self.schema_version != FEATURE_SCHEMA_VERSION || self.feature_order != FEATURE_ORDER {
            return Err(ModelError::SchemaMismatch {
                expected: FEATURE_SCHEMA_VERSION,
                found: self.schema_version,
                expected_order: FEATURE_ORDER.iter().map(|s| s.to_string()).collect(),
                found_order: self.feature_order.clone(),
            });
        }
        if self.regressor.coefficients.len() != FEATURE_COUNT {
            return Err(ModelError::Corrupt(format!(
                "{} coefficients for {} features",
                self.regressor.coefficients.len(),
                FEATURE_COUNT
            )));
        }
        Ok(())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        info!("Saved model artifact to {}", path.display());
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let artifact: Self = serde_json::from_str(&fs::read_to_string(path)?)?;
        artifact.check_schema()?;
        info!(
            "Loaded model artifact from {} ({} training rows)",
            path.display(),
            artifact.trained_rows
        );
        Ok(artifact)
    }
}
