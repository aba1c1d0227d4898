//! Metrics for evaluating forecast performance

use crate::error::{ForecastError, Result};
use crate::models::holt_winters::HoltWinters;
use crate::models::{ForecastModel, ForecastResult, TrainedForecastModel};
use crate::series::DailySeries;
use log::info;
use serde::Serialize;

/// Forecast accuracy metrics
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ForecastAccuracy {
    /// Mean Absolute Error
    pub mae: f64,
    /// Mean Squared Error
    pub mse: f64,
    /// Root Mean Squared Error
    pub rmse: f64,
    /// Mean Absolute Percentage Error, in percent
    pub mape: f64,
}

impl std::fmt::Display for ForecastAccuracy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Forecast Accuracy Metrics:")?;
        writeln!(f, "  MAE:   {:.4}", self.mae)?;
        writeln!(f, "  MSE:   {:.4}", self.mse)?;
        writeln!(f, "  RMSE:  {:.4}", self.rmse)?;
        writeln!(f, "  MAPE:  {:.4}%", self.mape)?;
        Ok(())
    }
}

fn check_lengths(actual: &[f64], predicted: &[f64]) -> Result<()> {
    if actual.len() != predicted.len() {
        return Err(ForecastError::LengthMismatch {
            actual: actual.len(),
            predicted: predicted.len(),
        });
    }
    if actual.is_empty() {
        return Err(ForecastError::ValidationError(
            "Cannot evaluate an empty forecast".to_string(),
        ));
    }
    Ok(())
}

fn mean_of<F>(actual: &[f64], predicted: &[f64], error: F) -> f64
where
    F: Fn(f64, f64) -> f64,
{
    let sum: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(&a, &p)| error(a, p))
        .sum();
    sum / actual.len() as f64
}

/// Mean absolute error
pub fn mean_absolute_error(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    check_lengths(actual, predicted)?;
    Ok(mean_of(actual, predicted, |a, p| (a - p).abs()))
}

/// Mean squared error
pub fn mean_squared_error(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    check_lengths(actual, predicted)?;
    Ok(mean_of(actual, predicted, |a, p| (a - p).powi(2)))
}

/// Root mean squared error
pub fn root_mean_squared_error(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    mean_squared_error(actual, predicted).map(f64::sqrt)
}

/// Mean absolute percentage error, in percent
///
/// Undefined when an actual value is zero; the first such position is
/// reported as [`ForecastError::DivisionByZero`].
pub fn mean_absolute_percentage_error(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    check_lengths(actual, predicted)?;
    if let Some(index) = actual.iter().position(|&a| a == 0.0) {
        return Err(ForecastError::DivisionByZero { index });
    }
    Ok(mean_of(actual, predicted, |a, p| ((a - p) / a).abs()) * 100.0)
}

/// Compare a forecast against the values that actually occurred
pub fn evaluate(actual: &[f64], predicted: &[f64]) -> Result<ForecastAccuracy> {
    let mape = mean_absolute_percentage_error(actual, predicted)?;
    let mse = mean_squared_error(actual, predicted)?;

    Ok(ForecastAccuracy {
        mae: mean_absolute_error(actual, predicted)?,
        mse,
        rmse: mse.sqrt(),
        mape,
    })
}

/// Outcome of fitting on the head of a series and forecasting its tail
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HoldoutEvaluation {
    pub accuracy: ForecastAccuracy,
    pub forecast: ForecastResult,
    pub actual: DailySeries,
}

/// Hold out the last `holdout` observations, fit on the rest and score the forecast
pub fn evaluate_holdout(
    series: &DailySeries,
    seasonal_period: usize,
    holdout: usize,
) -> Result<HoldoutEvaluation> {
    evaluate_holdout_with(&HoltWinters::new(seasonal_period)?, series, holdout)
}

/// [`evaluate_holdout`] with an already configured model
pub fn evaluate_holdout_with<M: ForecastModel>(
    model: &M,
    series: &DailySeries,
    holdout: usize,
) -> Result<HoldoutEvaluation> {
    if holdout == 0 || holdout >= series.len() {
        return Err(ForecastError::InvalidParameter(format!(
            "Holdout must be between 1 and {}, got {}",
            series.len().saturating_sub(1),
            holdout
        )));
    }

    let (train, test) = series.split_at(series.len() - holdout)?;
    let forecast = model.train(&train)?.forecast(holdout)?;
    let accuracy = evaluate(test.values(), forecast.values())?;

    info!(
        "Holdout evaluation over {} days: MAE={:.4} RMSE={:.4} MAPE={:.4}%",
        holdout, accuracy.mae, accuracy.rmse, accuracy.mape
    );

    Ok(HoldoutEvaluation {
        accuracy,
        forecast,
        actual: test,
    })
}
