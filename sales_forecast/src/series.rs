//! Daily total sales series

use crate::aggregation::daily_sales;
use crate::data::SalesTable;
use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use serde::Serialize;

/// Daily total sales, strictly ascending by date
///
/// Only dates with at least one transaction are present; missing calendar
/// days are not zero-filled. See [`DailySeries::missing_dates`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DailySeries {
    dates: Vec<NaiveDate>,
    values: Vec<f64>,
}

impl DailySeries {
    /// Create a series from `(date, total)` points
    ///
    /// Dates must be strictly increasing and totals finite.
    pub fn new(points: Vec<(NaiveDate, f64)>) -> Result<Self> {
        for pair in points.windows(2) {
            if pair[1].0 <= pair[0].0 {
                return Err(ForecastError::ValidationError(format!(
                    "dates must be strictly increasing: {} follows {}",
                    pair[1].0, pair[0].0
                )));
            }
        }
        if let Some((date, value)) = points.iter().find(|(_, v)| !v.is_finite()) {
            return Err(ForecastError::ValidationError(format!(
                "non-finite total {} on {}",
                value, date
            )));
        }

        let (dates, values) = points.into_iter().unzip();
        Ok(Self { dates, values })
    }

    /// Build the series from a cleaned table, one entry per observed date
    pub fn from_table(table: &SalesTable) -> Self {
        let (dates, values) = daily_sales(table)
            .into_iter()
            .map(|day| (day.date, day.total))
            .unzip();
        Self { dates, values }
    }

    /// A gap-free series starting at `start`
    pub fn from_values(start: NaiveDate, values: &[f64]) -> Self {
        Self {
            dates: start.iter_days().take(values.len()).collect(),
            values: values.to_vec(),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// `(date, total)` pairs in order
    pub fn points(&self) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.dates.iter().copied().zip(self.values.iter().copied())
    }

    /// Total for `date`, if the date was observed
    pub fn get(&self, date: NaiveDate) -> Option<f64> {
        self.dates
            .binary_search(&date)
            .ok()
            .map(|i| self.values[i])
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    /// Sum of all daily totals
    pub fn total(&self) -> f64 {
        self.values.iter().sum()
    }

    /// Calendar dates between the first and last observation with no entry
    pub fn missing_dates(&self) -> Vec<NaiveDate> {
        let (Some(first), Some(last)) = (self.first_date(), self.last_date()) else {
            return Vec::new();
        };

        first
            .iter_days()
            .take_while(|d| *d <= last)
            .filter(|d| self.dates.binary_search(d).is_err())
            .collect()
    }

    /// Whether any calendar day inside the observed range is absent
    pub fn has_gaps(&self) -> bool {
        self.dates
            .windows(2)
            .any(|pair| (pair[1] - pair[0]).num_days() > 1)
    }

    /// Split into the first `at` observations and the rest
    pub fn split_at(&self, at: usize) -> Result<(Self, Self)> {
        if at > self.len() {
            return Err(ForecastError::InvalidParameter(format!(
                "split point {} exceeds series length {}",
                at,
                self.len()
            )));
        }

        let head = Self {
            dates: self.dates[..at].to_vec(),
            values: self.values[..at].to_vec(),
        };
        let tail = Self {
            dates: self.dates[at..].to_vec(),
            values: self.values[at..].to_vec(),
        };
        Ok((head, tail))
    }
}

/// Collapse a cleaned table into its daily total series
pub fn daily_total_series(table: &SalesTable) -> DailySeries {
    DailySeries::from_table(table)
}
