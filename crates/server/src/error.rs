//! Errors surfaced to prediction callers.
//!
//! Every variant names the request field at fault so the caller can show a
//! targeted message instead of failing opaquely.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PredictionError {
    #[error("{field} {value} is outside the allowed range {min}..={max}")]
    InvalidRange {
        field: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },

    #[error("{field} '{value}' was not seen during training")]
    UnseenCategory { field: &'static str, value: String },

    #[error("{field} is required")]
    MissingInput { field: &'static str },

    #[error("prediction for {field} did not complete: {reason}")]
    Aborted { field: &'static str, reason: String },
}

impl PredictionError {
    /// The request field this error refers to
    pub fn field(&self) -> &'static str {
        match self {
            PredictionError::InvalidRange { field, .. }
            | PredictionError::UnseenCategory { field, .. }
            | PredictionError::MissingInput { field }
            | PredictionError::Aborted { field, .. } => field,
        }
    }
}

pub type Result<T> = std::result::Result<T, PredictionError>;
