//! Error types for categorical imputation

use thiserror::Error;

/// Result type alias for imputation operations
pub type Result<T> = std::result::Result<T, ImputeError>;

/// Main error type for the imputer
#[derive(Error, Debug)]
pub enum ImputeError {
    #[error("Data error: {0}")]
    DataError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Feature not found: {0}")]
    FeatureNotFound(String),

    #[error("Unknown column: {0} was not seen during fit")]
    UnknownColumn(String),

    #[error("No categories to sample from for column {column}")]
    NoCategories { column: String },

    #[error("Model not fitted")]
    ModelNotFitted,
}

impl From<polars::error::PolarsError> for ImputeError {
    fn from(err: polars::error::PolarsError) -> Self {
        ImputeError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for ImputeError {
    fn from(err: serde_json::Error) -> Self {
        ImputeError::SerializationError(err.to_string())
    }
}
