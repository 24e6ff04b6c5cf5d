//! Server crate for the Marquee rating predictor.
//!
//! This crate contains the prediction service that validates requests,
//! encodes them against the frozen model and applies documented fallbacks.

pub mod error;
pub mod scores;
pub mod service;

pub use error::PredictionError;
pub use scores::PersonScoreTable;
pub use service::{Notice, PredictionRequest, PredictionResponse, PredictionService, Role};
