//! Error types for training and loading models.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Not enough training rows: have {rows}, need at least {needed}")]
    InsufficientData { rows: usize, needed: usize },

    #[error("Failed to fit regressor: {0}")]
    Training(String),

    #[error("Training input {artifact} is not available; run the preparation stages first")]
    MissingInput { artifact: String },

    #[error("Model artifact was trained with feature schema v{found} {found_order:?}, expected v{expected} {expected_order:?}")]
    SchemaMismatch {
        expected: u32,
        found: u32,
        expected_order: Vec<String>,
        found_order: Vec<String>,
    },

    #[error("Model artifact is inconsistent: {0}")]
    Corrupt(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid model artifact: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Data(#[from] data_loader::DataLoadError),
}

pub type Result<T> = std::result::Result<T, ModelError>;
