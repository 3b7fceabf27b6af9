//! Error types for the price_forecast crate

use polars::prelude::PolarsError;
use thiserror::Error;

/// Custom error types for the price_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// Error related to data validation or processing
    #[error("Data error: {0}")]
    DataError(String),

    /// Source table without a recognised region column
    #[error("Schema error: {0}")]
    SchemaError(String),

    /// Not enough rows to train or evaluate
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// Region missing from the encoding or feature table
    #[error("Unknown region: {0}")]
    UnknownRegion(String),

    /// Error from invalid parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Error raised by a regression model
    #[error("Model error: {0}")]
    ModelError(String),

    /// None of the provided sources could be loaded
    #[error("No valid sources: {0}")]
    NoValidSources(String),

    /// Error from holiday calendar calculations
    #[error("Calendar error: {0}")]
    CalendarError(#[from] hijri_calendar::CalendarError),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from Polars operations
    #[error("Polars error: {0}")]
    PolarsError(String),

    /// Error from reading or writing JSON and CSV
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl From<PolarsError> for ForecastError {
    fn from(err: PolarsError) -> Self {
        ForecastError::PolarsError(err.to_string())
    }
}

impl From<serde_json::Error> for ForecastError {
    fn from(err: serde_json::Error) -> Self {
        ForecastError::SerializationError(err.to_string())
    }
}

impl From<csv::Error> for ForecastError {
    fn from(err: csv::Error) -> Self {
        ForecastError::SerializationError(err.to_string())
    }
}
