//! # Model Crate
//!
//! Fits, evaluates, persists and serves the rating regressor.
//!
//! ## Main Components
//!
//! - **regressor**: `LinearRegressor`, ordinary least squares via linfa
//! - **training**: Seeded train/test split, R² and MAE, `train_model`, `train_from_store`
//! - **artifact**: `ModelArtifact`, the versioned JSON bundle of regressor and vocabularies
//! - **predictor**: `RatingPredictor`, clamped predictions with verdicts
//! - **verdict**: Verdict buckets, messages and success rate
//! - **error**: Error types for training and loading
//!
//! ## Example Usage
//!
//! ```ignore
//! use model::{train_model, RatingPredictor, MODEL_FILE};
//!
//! let artifact = train_model(&movies, &director_scores, &actor_scores, &config)?;
//! artifact.save(&config.out_dir.join(MODEL_FILE))?;
//!
//! let predictor = RatingPredictor::load(&config.out_dir.join(MODEL_FILE))?;
//! let assessment = predictor.assess(&features);
//! println!("{:.1} {}", assessment.rating, assessment.verdict);
//! ```

pub mod artifact;
pub mod error;
pub mod predictor;
pub mod regressor;
pub mod training;
pub mod verdict;

pub use artifact::{MODEL_FILE, ModelArtifact};
pub use error::{ModelError, Result};
pub use predictor::{Assessment, RatingPredictor};
pub use regressor::LinearRegressor;
pub use training::{
    Evaluation, TRAINING_INPUTS, evaluate, fit_and_evaluate, train_from_store, train_model, train_test_split,
};
pub use verdict::{Verdict, success_rate};
