//! Error types for the forecast_expense crate

use thiserror::Error;

/// Custom error types for the forecast_expense crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// Error related to data validation or processing
    #[error("Data error: {0}")]
    DataError(String),

    /// Error surfaced by the model oracle during inference
    #[error("Oracle error: {0}")]
    OracleError(String),

    /// Error from invalid parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Error loading or decoding a model package
    #[error("Model error: {0}")]
    ModelError(String),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error decoding JSON payloads
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Error reading CSV transaction logs
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;
