//! Error types for the data-loader crate.
//!
//! Most of these are recoverable at the call site: a chunk missing a column
//! is skipped, a row that fails to parse as a record is filtered out. Only
//! [`DataLoadError::NoInputFiles`] is meant to end a run.

use thiserror::Error;

/// Errors that can occur while locating, streaming and parsing flat files
#[derive(Error, Debug)]
pub enum DataLoadError {
    /// File could not be found or opened
    #[error("Failed to open file: {path}")]
    FileNotFound { path: String },

    /// None of the required input files exist
    #[error("No input files found in {dir}: missing {missing}")]
    NoInputFiles { dir: String, missing: String },

    /// I/O error occurred while reading file
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The csv reader or writer failed
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A table or chunk lacks a column the caller asked for
    #[error("Missing column '{column}' in {source_name}")]
    MissingColumn { source_name: String, column: String },

    /// Line in data file couldn't be parsed
    #[error("Parse error at line {line} in {file}: {reason}")]
    ParseError {
        file: String,
        line: usize,
        reason: String,
    },

    /// A data field had an invalid value
    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    /// Data validation failed
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

impl DataLoadError {
    pub(crate) fn missing_column(source_name: impl Into<String>, column: impl Into<String>) -> Self {
        Self::MissingColumn {
            source_name: source_name.into(),
            column: column.into(),
        }
    }

    pub(crate) fn invalid(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, DataLoadError>;
