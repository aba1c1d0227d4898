//! Pipeline configuration
//!
//! Every field has a default, so a JSON file only needs the keys it
//! overrides.

use crate::error::{ForecastError, Result};
use crate::utils::{DEFAULT_DATE_FORMATS, DEFAULT_TIME_FORMATS};
use sales_math::NelderMead;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_INPUT: &str = "data/supermarket_sales.csv";
pub const DEFAULT_OUTPUT_DIR: &str = "visualizations";
pub const DEFAULT_HORIZON: usize = 30;
pub const DEFAULT_SEASONAL_PERIOD: usize = 7;
pub const DEFAULT_CONFIDENCE_LEVEL: f64 = 0.95;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Transaction log to read
    pub input: PathBuf,
    /// Directory receiving chart payloads and tables
    pub output_dir: PathBuf,
    /// Field delimiter of the input file
    pub delimiter: char,
    /// Days to forecast
    pub horizon: usize,
    /// Observations per season
    pub seasonal_period: usize,
    /// Coverage of the forecast prediction intervals
    pub confidence_level: f64,
    /// Trailing days held out for accuracy evaluation
    pub holdout_days: Option<usize>,
    pub date_formats: Vec<String>,
    pub time_formats: Vec<String>,
    /// Also export CSV tables next to the chart payloads
    pub write_tables: bool,
    /// Settings for the smoothing-parameter search
    pub optimizer: NelderMead,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from(DEFAULT_INPUT),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            delimiter: ',',
            horizon: DEFAULT_HORIZON,
            seasonal_period: DEFAULT_SEASONAL_PERIOD,
            confidence_level: DEFAULT_CONFIDENCE_LEVEL,
            holdout_days: None,
            date_formats: DEFAULT_DATE_FORMATS.iter().map(|s| s.to_string()).collect(),
            time_formats: DEFAULT_TIME_FORMATS.iter().map(|s| s.to_string()).collect(),
            write_tables: true,
            optimizer: NelderMead::default(),
        }
    }
}

impl PipelineConfig {
    /// Load a configuration from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if self.horizon == 0 {
            return Err(ForecastError::InvalidParameter(
                "horizon must be at least 1".to_string(),
            ));
        }
        if self.seasonal_period < 2 {
            return Err(ForecastError::InvalidParameter(format!(
                "seasonal_period must be at least 2, got {}",
                self.seasonal_period
            )));
        }
        if !(self.confidence_level > 0.0 && self.confidence_level < 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "confidence_level must be between 0 and 1, got {}",
                self.confidence_level
            )));
        }
        if self.holdout_days == Some(0) {
            return Err(ForecastError::InvalidParameter(
                "holdout_days must be at least 1 when set".to_string(),
            ));
        }
        if self.date_formats.is_empty() || self.time_formats.is_empty() {
            return Err(ForecastError::InvalidParameter(
                "date_formats and time_formats must not be empty".to_string(),
            ));
        }
        self.optimizer
            .validate()
            .map_err(|e| ForecastError::InvalidParameter(format!("optimizer: {}", e)))?;
        self.delimiter_byte().map(|_| ())
    }

    /// The delimiter as the single byte the CSV reader expects
    pub fn delimiter_byte(&self) -> Result<u8> {
        u8::try_from(self.delimiter)
            .ok()
            .filter(u8::is_ascii)
            .ok_or_else(|| {
                ForecastError::InvalidParameter(format!(
                    "delimiter must be a single ASCII character, got '{}'",
                    self.delimiter
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = PipelineConfig::from_json_str(r#"{"horizon": 14, "delimiter": ";"}"#).unwrap();

        assert_eq!(config.horizon, 14);
        assert_eq!(config.delimiter_byte().unwrap(), b';');
        assert_eq!(config.seasonal_period, DEFAULT_SEASONAL_PERIOD);
        assert_eq!(config.input, PathBuf::from(DEFAULT_INPUT));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let bad = [
            PipelineConfig { horizon: 0, ..Default::default() },
            PipelineConfig { seasonal_period: 1, ..Default::default() },
            PipelineConfig { confidence_level: 1.0, ..Default::default() },
            PipelineConfig { holdout_days: Some(0), ..Default::default() },
            PipelineConfig { delimiter: 'é', ..Default::default() },
            PipelineConfig { date_formats: vec![], ..Default::default() },
            PipelineConfig {
                optimizer: {
                    let mut optimizer = NelderMead::default();
                    optimizer.max_iter = 0;
                    optimizer
                },
                ..Default::default()
            },
        ];
        for config in bad {
            assert!(config.validate().is_err(), "{:?}", config);
        }
    }

    #[test]
    fn test_optimizer_settings_from_json() {
        let config =
            PipelineConfig::from_json_str(r#"{"optimizer": {"max_iter": 500, "restarts": 1}}"#).unwrap();

        assert_eq!(config.optimizer.max_iter, 500);
        assert_eq!(config.optimizer.restarts, 1);
        assert_eq!(config.optimizer.tolerance, NelderMead::default().tolerance);
        assert!(config.validate().is_ok());

        let config = PipelineConfig::from_json_str(r#"{"optimizer": {"tolerance": -1.0}}"#).unwrap();
        assert!(matches!(
            config.validate(),
            Err(ForecastError::InvalidParameter(_))
        ));
    }
}
