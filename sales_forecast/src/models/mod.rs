//! Forecasting models for daily sales series

use crate::error::{ForecastError, Result};
use crate::series::DailySeries;
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt::Debug;

/// Forecast result containing predicted values
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastResult {
    /// Forecasted values
    values: Vec<f64>,
    /// Number of periods forecasted
    horizon: usize,
    /// Calendar date of each forecast step (optional)
    dates: Option<Vec<NaiveDate>>,
    /// Prediction intervals as `(lower, upper)` (optional)
    intervals: Option<Vec<(f64, f64)>>,
    /// Coverage of `intervals`
    confidence_level: Option<f64>,
}

impl ForecastResult {
    /// Create a new forecast result
    pub fn new(values: Vec<f64>, horizon: usize) -> Result<Self> {
        if values.len() != horizon {
            return Err(ForecastError::ValidationError(format!(
                "Values length ({}) doesn't match horizon ({})",
                values.len(),
                horizon
            )));
        }

        Ok(Self {
            values,
            horizon,
            dates: None,
            intervals: None,
            confidence_level: None,
        })
    }

    /// Attach one date per forecast step
    pub fn with_dates(mut self, dates: Vec<NaiveDate>) -> Result<Self> {
        if dates.len() != self.horizon {
            return Err(ForecastError::ValidationError(format!(
                "Dates length ({}) doesn't match horizon ({})",
                dates.len(),
                self.horizon
            )));
        }
        self.dates = Some(dates);
        Ok(self)
    }

    /// Attach prediction intervals computed at `confidence_level`
    pub fn with_intervals(mut self, intervals: Vec<(f64, f64)>, confidence_level: f64) -> Result<Self> {
        if intervals.len() != self.horizon {
            return Err(ForecastError::ValidationError(format!(
                "Values length ({}) doesn't match intervals length ({})",
                self.horizon,
                intervals.len()
            )));
        }
        if !(confidence_level > 0.0 && confidence_level < 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "Confidence level must be between 0 and 1, got {}",
                confidence_level
            )));
        }
        self.intervals = Some(intervals);
        self.confidence_level = Some(confidence_level);
        Ok(self)
    }

    /// Get the forecasted values
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Get the number of periods forecasted
    pub fn horizon(&self) -> usize {
        self.horizon
    }

    /// Get the forecast dates, if available
    pub fn dates(&self) -> Option<&[NaiveDate]> {
        self.dates.as_deref()
    }

    /// Get the prediction intervals, if available
    pub fn intervals(&self) -> Option<&[(f64, f64)]> {
        self.intervals.as_deref()
    }

    pub fn confidence_level(&self) -> Option<f64> {
        self.confidence_level
    }

    /// `(date, value)` pairs; empty when no dates are attached
    pub fn points(&self) -> Vec<(NaiveDate, f64)> {
        self.dates()
            .map(|dates| dates.iter().copied().zip(self.values.iter().copied()).collect())
            .unwrap_or_default()
    }

    /// Serialize to a JSON string
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Calculate mean absolute error between forecast and actual values
    pub fn mean_absolute_error(&self, actual: &[f64]) -> Result<f64> {
        crate::metrics::mean_absolute_error(actual, &self.values)
    }
}

/// Trained forecast model
pub trait TrainedForecastModel: Debug {
    /// Generate forecast for future periods
    fn forecast(&self, horizon: usize) -> Result<ForecastResult>;

    /// One-step-ahead predictions over the training data
    fn fitted_values(&self) -> &[f64];

    /// Name of the model
    fn name(&self) -> &str;
}

/// Forecast model that can be trained on a daily series
pub trait ForecastModel: Debug + Clone {
    /// The type of trained model produced
    type Trained: TrainedForecastModel;

    /// Train the model on a daily series
    fn train(&self, series: &DailySeries) -> Result<Self::Trained>;

    /// Get the name of the model
    fn name(&self) -> &str;
}

pub mod holt_winters;
