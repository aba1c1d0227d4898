//! Error types for the sales_forecast crate

use polars::prelude::PolarsError;
use thiserror::Error;

/// Custom error types for the sales_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// A required input column is absent after name normalization
    #[error("Missing required column: '{0}'")]
    MissingColumn(String),

    /// A field could not be parsed into its typed value
    #[error("Data format error in row {row}, column '{column}': {message} (value: '{value}')")]
    DataFormat {
        /// 1-based data row, header excluded
        row: usize,
        column: String,
        value: String,
        message: String,
    },

    /// The series is too short for the requested model
    #[error("Insufficient data: need at least {needed} observations, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Actual and predicted sequences differ in length
    #[error("Length mismatch: {actual} actual values vs {predicted} predicted values")]
    LengthMismatch { actual: usize, predicted: usize },

    /// A percentage metric would divide by a zero actual value
    #[error("Division by zero: actual value at position {index} is zero, MAPE is undefined")]
    DivisionByZero { index: usize },

    /// Error from invalid parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Error related to parameter or data validation
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from the CSV reader
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// Error from Polars operations
    #[error("Polars error: {0}")]
    PolarsError(String),

    /// Error from JSON (de)serialization
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Error from the numeric routines
    #[error("Math error: {0}")]
    MathError(#[from] sales_math::MathError),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl From<PolarsError> for ForecastError {
    fn from(err: PolarsError) -> Self {
        ForecastError::PolarsError(err.to_string())
    }
}

impl ForecastError {
    /// Shorthand for building a [`ForecastError::DataFormat`]
    pub fn data_format(
        row: usize,
        column: impl Into<String>,
        value: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        ForecastError::DataFormat {
            row,
            column: column.into(),
            value: value.into(),
            message: message.into(),
        }
    }
}
