//! Ordinary least squares regressor.
//!
//! Fitting goes through `linfa-linear`; the fitted weights are copied out
//! into plain vectors so the model serializes without linfa types and
//! predicts without allocating.
//!
//! Features that hold a single value over every training row (all scores
//! imputed, one genre) are left out of the fit and keep a weight of zero.

use crate::error::{ModelError, Result};
use linfa::Dataset;
use linfa::traits::Fit;
use linfa_linear::LinearRegression;
use ndarray::{Array1, Array2};
use pipeline::{FEATURE_COUNT, FEATURE_ORDER, FeatureVector};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearRegressor {
    /// One weight per feature, in feature order
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl LinearRegressor {
    /// Fit on encoded feature rows
    pub fn fit(features: &[FeatureVector], targets: &[f64]) -> Result<Self> {
        let rows = features.len();
        if rows != targets.len() {
            return Err(ModelError::Training(format!(
                "{} feature rows but {} targets",
                rows,
                targets.len()
            )));
        }
        let needed = FEATURE_COUNT + 1;
        if rows < needed {
            return Err(ModelError::InsufficientData { rows, needed });
        }

        let rows_x: Vec<[f64; FEATURE_COUNT]> = features.iter().map(FeatureVector::to_array).collect();
        let (varying, constant): (Vec<usize>, Vec<usize>) =
            (0..FEATURE_COUNT).partition(|&j| !is_constant(&rows_x, j));
        if !constant.is_empty() {
            let names: Vec<&str> = constant.iter().map(|&j| FEATURE_ORDER[j]).collect();
            warn!("Features {:?} are constant over {} rows; fitting without them", names, rows);
        }

        let mut coefficients = vec![0.0; FEATURE_COUNT];
        let intercept = if varying.is_empty() {
            targets.iter().sum::<f64>() / rows as f64
        } else {
            let mut x = Array2::<f64>::zeros((rows, varying.len()));
            for (i, row) in rows_x.iter().enumerate() {
                for (k, &j) in varying.iter().enumerate() {
                    x[(i, k)] = row[j];
                }
            }
            let y = Array1::from(targets.to_vec());

            let dataset = Dataset::new(x, y);
            let fitted = LinearRegression::new()
                .fit(&dataset)
                .map_err(|e| ModelError::Training(e.to_string()))?;
            for (&j, &w) in varying.iter().zip(fitted.params()) {
                coefficients[j] = w;
            }
            fitted.intercept()
        };

        let model = Self { coefficients, intercept };
        if !model.intercept.is_finite() || model.coefficients.iter().any(|c| !c.is_finite()) {
            return Err(ModelError::Training(
                "fitted weights are not finite (collinear features?)".to_string(),
            ));
        }
        debug!("Fitted {} rows: {:?}", rows, model);
        Ok(model)
    }

    /// Raw prediction, not clamped
    pub fn predict(&self, features: &FeatureVector) -> f64 {
        self.intercept
            + self
                .coefficients
                .iter()
                .zip(features.to_array())
                .map(|(w, x)| w * x)
                .sum::<f64>()
    }
}

/// Every row holds the first row's value for feature `j`, up to rounding
fn is_constant(rows: &[[f64; FEATURE_COUNT]], j: usize) -> bool {
    let Some(first) = rows.first().map(|r| r[j]) else {
        return true;
    };
    let tolerance = 1e-12 * first.abs().max(1.0);
    rows.iter().all(|r| (r[j] - first).abs() <= tolerance)
}
