//! Error types for the stock_forecast crate

use polars::prelude::PolarsError;
use thiserror::Error;

/// Custom error types for the stock_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// Error related to data validation or processing
    #[error("Data error: {0}")]
    DataError(String),

    /// Upstream fetch yielded no series for the ticker
    #[error("Unknown ticker: {0}")]
    UnknownTicker(String),

    /// Series too short to build a non-empty feature table
    #[error("Insufficient history: {0}")]
    InsufficientHistory(String),

    /// Business-day advance needs holiday data outside the precomputed year range
    #[error("Calendar range exceeded: {0}")]
    CalendarRangeExceeded(String),

    /// Every hyperparameter candidate failed to fit; carries the last fit error
    #[error("Tuning exhausted: {0}")]
    TuningExhausted(String),

    /// Error from invalid parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Error related to evaluation inputs
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from Polars operations
    #[error("Polars error: {0}")]
    PolarsError(String),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl From<PolarsError> for ForecastError {
    fn from(err: PolarsError) -> Self {
        ForecastError::PolarsError(err.to_string())
    }
}
