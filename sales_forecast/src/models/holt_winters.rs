//! Additive Holt-Winters (triple exponential smoothing)
//!
//! The model tracks a level `l`, a trend `b` and `m` seasonal offsets:
//!
//! - Level: `l_t = α(y_t − s_{t−m}) + (1−α)(l_{t−1} + b_{t−1})`
//! - Trend: `b_t = β(l_t − l_{t−1}) + (1−β)b_{t−1}`
//! - Seasonal: `s_t = γ(y_t − l_t) + (1−γ)s_{t−m}`
//! - Forecast: `ŷ_{n+h} = l_n + h·b_n + s_{n+h−m}`
//!
//! Fitting minimizes the sum of squared one-step-ahead errors. A first
//! Nelder-Mead pass tunes the smoothing coefficients from a heuristic
//! initial state; a second pass refines coefficients and initial state
//! jointly. Both passes are deterministic.

use crate::error::{ForecastError, Result};
use crate::models::{ForecastModel, ForecastResult, TrainedForecastModel};
use crate::series::DailySeries;
use crate::utils::future_dates;
use chrono::NaiveDate;
use log::{debug, info};
use sales_math::NelderMead;
use serde::Serialize;
use statrs::distribution::{ContinuousCDF, Normal};
use statrs::statistics::Statistics;

const INITIAL_COEFFICIENTS: [f64; 3] = [0.3, 0.1, 0.1];
const COEFFICIENT_STEP: f64 = 0.1;
const REFINE_COEFFICIENT_STEP: f64 = 0.05;

/// Smoothing coefficients, each in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SmoothingParameters {
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
}

impl SmoothingParameters {
    pub fn new(alpha: f64, beta: f64, gamma: f64) -> Result<Self> {
        for (name, value) in [("alpha", alpha), ("beta", beta), ("gamma", gamma)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ForecastError::InvalidParameter(format!(
                    "{} must be between 0 and 1, got {}",
                    name, value
                )));
            }
        }
        Ok(Self { alpha, beta, gamma })
    }

    fn from_slice(x: &[f64]) -> Self {
        Self {
            alpha: x[0],
            beta: x[1],
            gamma: x[2],
        }
    }
}

/// Level, trend and seasonal offsets before the first observation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InitialState {
    pub level: f64,
    pub trend: f64,
    /// One offset per seasonal slot, summing to zero
    pub seasonals: Vec<f64>,
}

impl InitialState {
    /// Classical start: first-season mean as level, season-over-season
    /// change of means as trend, first-season deviations as offsets.
    /// `values` must hold at least two full seasons.
    fn heuristic(values: &[f64], period: usize) -> Self {
        let first = values[..period].mean();
        let second = values[period..2 * period].mean();

        Self {
            level: first,
            trend: (second - first) / period as f64,
            seasonals: values[..period].iter().map(|v| v - first).collect(),
        }
    }

    /// Decode `[level, trend, s_0 .. s_{m-2}]`; the last offset closes the sum to zero
    fn from_slice(x: &[f64]) -> Self {
        let mut seasonals = x[2..].to_vec();
        seasonals.push(-seasonals.iter().sum::<f64>());
        Self {
            level: x[0],
            trend: x[1],
            seasonals,
        }
    }

    fn to_vec(&self) -> Vec<f64> {
        let free = self.seasonals.len().saturating_sub(1);
        let mut x = vec![self.level, self.trend];
        x.extend_from_slice(&self.seasonals[..free]);
        x
    }
}

/// State after running the recursions over a series
struct Smoothed {
    level: f64,
    trend: f64,
    seasonals: Vec<f64>,
    fitted: Vec<f64>,
    sse: f64,
}

fn smooth(values: &[f64], params: SmoothingParameters, initial: &InitialState) -> Smoothed {
    let period = initial.seasonals.len();
    let SmoothingParameters { alpha, beta, gamma } = params;

    let mut level = initial.level;
    let mut trend = initial.trend;
    let mut seasonals = initial.seasonals.clone();
    let mut fitted = Vec::with_capacity(values.len());
    let mut sse = 0.0;

    for (t, &y) in values.iter().enumerate() {
        let slot = t % period;
        let prediction = level + trend + seasonals[slot];
        fitted.push(prediction);
        sse += (y - prediction).powi(2);

        let previous = level;
        level = alpha * (y - seasonals[slot]) + (1.0 - alpha) * (level + trend);
        trend = beta * (level - previous) + (1.0 - beta) * trend;
        seasonals[slot] = gamma * (y - level) + (1.0 - gamma) * seasonals[slot];
    }

    Smoothed {
        level,
        trend,
        seasonals,
        fitted,
        sse,
    }
}

/// Additive-trend, additive-seasonal Holt-Winters model
#[derive(Debug, Clone)]
pub struct HoltWinters {
    /// Name of the model
    name: String,
    /// Observations per season
    seasonal_period: usize,
    /// Coefficients used as-is instead of being optimized
    fixed: Option<SmoothingParameters>,
    optimizer: NelderMead,
}

impl HoltWinters {
    /// Create a model with `seasonal_period` observations per season
    pub fn new(seasonal_period: usize) -> Result<Self> {
        if seasonal_period < 2 {
            return Err(ForecastError::InvalidParameter(format!(
                "Seasonal period must be at least 2, got {}",
                seasonal_period
            )));
        }

        Ok(Self {
            name: format!("Holt-Winters (additive, m={})", seasonal_period),
            seasonal_period,
            fixed: None,
            optimizer: NelderMead::default(),
        })
    }

    /// Use fixed coefficients; only the initial state is estimated
    pub fn with_parameters(mut self, alpha: f64, beta: f64, gamma: f64) -> Result<Self> {
        self.fixed = Some(SmoothingParameters::new(alpha, beta, gamma)?);
        Ok(self)
    }

    /// Replace the minimizer used during fitting
    pub fn with_optimizer(mut self, optimizer: NelderMead) -> Self {
        self.optimizer = optimizer;
        self
    }

    pub fn seasonal_period(&self) -> usize {
        self.seasonal_period
    }

    /// Smallest series length accepted by [`ForecastModel::train`]
    pub fn minimum_observations(&self) -> usize {
        2 * self.seasonal_period
    }

    fn optimize(&self, values: &[f64]) -> Result<(SmoothingParameters, InitialState)> {
        let period = self.seasonal_period;
        let heuristic = InitialState::heuristic(values, period);

        let coefficients = self.optimizer.minimize(
            |x| smooth(values, SmoothingParameters::from_slice(x), &heuristic).sse,
            &INITIAL_COEFFICIENTS,
            &[COEFFICIENT_STEP; 3],
            &[(0.0, 1.0); 3],
        )?;
        debug!(
            "coefficient search: sse={:.4} after {} iterations (converged: {})",
            coefficients.value, coefficients.iterations, coefficients.converged
        );

        let spread = values.std_dev();
        let scale = if spread.is_finite() && spread > 1.0 { spread } else { 1.0 };

        let mut start = coefficients.point.clone();
        start.extend(heuristic.to_vec());

        let mut steps = vec![REFINE_COEFFICIENT_STEP; 3];
        steps.push(0.1 * scale);
        steps.push(0.01 * scale);
        steps.extend(std::iter::repeat(0.1 * scale).take(period - 1));

        let mut bounds = vec![(0.0, 1.0); 3];
        bounds.extend(std::iter::repeat((f64::NEG_INFINITY, f64::INFINITY)).take(period + 1));

        let joint = self.optimizer.minimize(
            |x| smooth(values, SmoothingParameters::from_slice(x), &InitialState::from_slice(&x[3..])).sse,
            &start,
            &steps,
            &bounds,
        )?;
        debug!(
            "joint search: sse={:.4} after {} iterations (converged: {})",
            joint.value, joint.iterations, joint.converged
        );

        if joint.value <= coefficients.value {
            Ok((
                SmoothingParameters::from_slice(&joint.point),
                InitialState::from_slice(&joint.point[3..]),
            ))
        } else {
            Ok((SmoothingParameters::from_slice(&coefficients.point), heuristic))
        }
    }
}

impl ForecastModel for HoltWinters {
    type Trained = HoltWintersModel;

    fn train(&self, series: &DailySeries) -> Result<Self::Trained> {
        let values = series.values();
        let needed = self.minimum_observations();
        let last_date = match series.last_date() {
            Some(date) if values.len() >= needed => date,
            _ => {
                return Err(ForecastError::InsufficientData {
                    needed,
                    got: values.len(),
                })
            }
        };

        let (params, initial) = match self.fixed {
            Some(params) => (params, InitialState::heuristic(values, self.seasonal_period)),
            None => self.optimize(values)?,
        };
        let smoothed = smooth(values, params, &initial);

        info!(
            "Fitted {} on {} observations: alpha={:.4} beta={:.4} gamma={:.4} sse={:.4}",
            self.name,
            values.len(),
            params.alpha,
            params.beta,
            params.gamma,
            smoothed.sse
        );

        Ok(HoltWintersModel {
            name: self.name.clone(),
            seasonal_period: self.seasonal_period,
            params,
            initial,
            level: smoothed.level,
            trend: smoothed.trend,
            seasonals: smoothed.seasonals,
            fitted: smoothed.fitted,
            sse: smoothed.sse,
            last_date,
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Fitted Holt-Winters model
///
/// Immutable; forecasting never changes its state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HoltWintersModel {
    name: String,
    seasonal_period: usize,
    params: SmoothingParameters,
    initial: InitialState,
    level: f64,
    trend: f64,
    /// Latest offset for each slot `t mod m`
    seasonals: Vec<f64>,
    fitted: Vec<f64>,
    sse: f64,
    last_date: NaiveDate,
}

impl HoltWintersModel {
    pub fn parameters(&self) -> SmoothingParameters {
        self.params
    }

    pub fn initial_state(&self) -> &InitialState {
        &self.initial
    }

    pub fn seasonal_period(&self) -> usize {
        self.seasonal_period
    }

    /// Final level
    pub fn level(&self) -> f64 {
        self.level
    }

    /// Final trend
    pub fn trend(&self) -> f64 {
        self.trend
    }

    /// Final seasonal offsets indexed by slot `t mod m`
    pub fn seasonals(&self) -> &[f64] {
        &self.seasonals
    }

    /// In-sample sum of squared one-step-ahead errors
    pub fn sse(&self) -> f64 {
        self.sse
    }

    pub fn observations(&self) -> usize {
        self.fitted.len()
    }

    pub fn last_date(&self) -> NaiveDate {
        self.last_date
    }

    /// Mean squared one-step-ahead error
    pub fn residual_variance(&self) -> f64 {
        self.sse / self.observations() as f64
    }

    fn point_forecasts(&self, horizon: usize) -> Result<Vec<f64>> {
        if horizon == 0 {
            return Err(ForecastError::InvalidParameter(
                "Forecast horizon must be at least 1".to_string(),
            ));
        }

        let n = self.observations();
        Ok((1..=horizon)
            .map(|h| {
                let slot = (n - 1 + h) % self.seasonal_period;
                self.level + h as f64 * self.trend + self.seasonals[slot]
            })
            .collect())
    }

    /// Shift of the step-`j` forecast caused by a unit error one step ahead
    ///
    /// `c_j = α(1 + jβ) + γ(1 − α)·[j mod m = 0]`; the seasonal update is
    /// taken against the freshly updated level, hence the `(1 − α)`.
    fn error_multiplier(&self, j: usize) -> f64 {
        let SmoothingParameters { alpha, beta, gamma } = self.params;
        let seasonal = if j % self.seasonal_period == 0 {
            gamma * (1.0 - alpha)
        } else {
            0.0
        };
        alpha * (1.0 + j as f64 * beta) + seasonal
    }

    /// Forecast with symmetric normal prediction intervals
    ///
    /// The step-`h` variance is `σ²(1 + Σ_{j<h} c_j²)`, with `c_j` from
    /// [`Self::error_multiplier`] and `σ²` the residual variance.
    pub fn forecast_with_intervals(&self, horizon: usize, confidence_level: f64) -> Result<ForecastResult> {
        if !(confidence_level > 0.0 && confidence_level < 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "Confidence level must be between 0 and 1, got {}",
                confidence_level
            )));
        }
        let result = self.forecast(horizon)?;

        let normal = Normal::new(0.0, 1.0)
            .map_err(|e| ForecastError::ValidationError(e.to_string()))?;
        let z = normal.inverse_cdf(0.5 + confidence_level / 2.0);
        let sigma2 = self.residual_variance();

        let mut accumulated = 1.0;
        let intervals = result
            .values()
            .iter()
            .enumerate()
            .map(|(j, value)| {
                if j > 0 {
                    accumulated += self.error_multiplier(j).powi(2);
                }
                let margin = z * (sigma2 * accumulated).sqrt();
                (value - margin, value + margin)
            })
            .collect();

        result.with_intervals(intervals, confidence_level)
    }
}

impl TrainedForecastModel for HoltWintersModel {
    fn forecast(&self, horizon: usize) -> Result<ForecastResult> {
        let values = self.point_forecasts(horizon)?;
        ForecastResult::new(values, horizon)?.with_dates(future_dates(self.last_date, horizon))
    }

    fn fitted_values(&self) -> &[f64] {
        &self.fitted
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Fit an optimized Holt-Winters model to `series`
pub fn fit(series: &DailySeries, seasonal_period: usize) -> Result<HoltWintersModel> {
    HoltWinters::new(seasonal_period)?.train(series)
}

/// Forecast `horizon` days past the end of the fitted series
pub fn forecast(model: &HoltWintersModel, horizon: usize) -> Result<ForecastResult> {
    model.forecast(horizon)
}
