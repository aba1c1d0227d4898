//! # Sales Math
//!
//! Numeric building blocks used by the sales forecasting crate.
//! This crate provides a bounded Nelder-Mead minimizer for fitting
//! smoothing models and a least-squares polynomial fit for trend lines.

use thiserror::Error;

pub mod optimization;
pub mod regression;

pub use optimization::{Minimum, NelderMead};
pub use regression::PolynomialFit;

/// Errors that can occur in numeric routines
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),
}

/// Result type for numeric operations
pub type Result<T> = std::result::Result<T, MathError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_carry_context() {
        let err = MathError::InsufficientData("need 3 points, got 1".to_string());
        assert_eq!(
            err.to_string(),
            "Insufficient data for calculation: need 3 points, got 1"
        );
    }
}
