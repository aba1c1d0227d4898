//! End-to-end batch run: load, clean, aggregate, forecast, report

use crate::aggregation::SalesSummary;
use crate::config::PipelineConfig;
use crate::data::{DataCleaner, DataLoader, RawTable, SalesTable};
use crate::error::{ForecastError, Result};
use crate::metrics::{evaluate_holdout_with, HoldoutEvaluation};
use crate::models::holt_winters::{HoltWinters, HoltWintersModel};
use crate::models::{ForecastModel, ForecastResult};
use crate::report::{write_tables, Report};
use crate::series::DailySeries;
use log::{info, warn};
use std::path::PathBuf;

/// Everything one run produced
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub table: SalesTable,
    pub summary: SalesSummary,
    pub series: DailySeries,
    /// `None` when the series was too short to fit
    pub model: Option<HoltWintersModel>,
    pub forecast: Option<ForecastResult>,
    pub holdout: Option<HoldoutEvaluation>,
    pub report: Report,
    /// Every file written, in write order
    pub written: Vec<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run against the configured input file
    pub fn run(&self) -> Result<PipelineOutput> {
        let raw = DataLoader::from_csv_with_delimiter(&self.config.input, self.config.delimiter_byte()?)?;
        self.run_raw(&raw)
    }

    /// Run against an already loaded table
    pub fn run_raw(&self, raw: &RawTable) -> Result<PipelineOutput> {
        let config = &self.config;

        let cleaner = DataCleaner::with_formats(config.date_formats.clone(), config.time_formats.clone())?;
        let table = cleaner.clean(raw)?;

        let summary = SalesSummary::from_table(&table);
        info!(
            "Aggregated {} transactions: {} days, {} product lines, {} branches",
            summary.transactions,
            summary.daily_sales.len(),
            summary.products.len(),
            summary.branches.len()
        );

        let series = DailySeries::from_table(&table);
        let missing = series.missing_dates();
        if !missing.is_empty() {
            warn!(
                "Daily series has {} missing calendar days (first: {}); forecasting treats it as evenly spaced",
                missing.len(),
                missing[0]
            );
        }

        let (model, forecast) = match self.forecast(&series) {
            Ok((model, forecast)) => (Some(model), Some(forecast)),
            Err(ForecastError::InsufficientData { needed, got }) => {
                warn!(
                    "Skipping forecast: need {} daily observations, have {}",
                    needed, got
                );
                (None, None)
            }
            Err(e) => return Err(e),
        };

        let holdout = config.holdout_days.and_then(|days| {
            self.model()
                .and_then(|model| evaluate_holdout_with(&model, &series, days))
                .map_err(|e| warn!("Holdout evaluation skipped: {}", e))
                .ok()
        });

        let report = Report::build(&summary, &series, forecast.as_ref());
        let mut written = report.write_json(&config.output_dir)?;
        if config.write_tables {
            written.extend(write_tables(&config.output_dir, &summary, forecast.as_ref())?);
        }

        Ok(PipelineOutput {
            table,
            summary,
            series,
            model,
            forecast,
            holdout,
            report,
            written,
        })
    }

    fn model(&self) -> Result<HoltWinters> {
        Ok(HoltWinters::new(self.config.seasonal_period)?.with_optimizer(self.config.optimizer.clone()))
    }

    fn forecast(&self, series: &DailySeries) -> Result<(HoltWintersModel, ForecastResult)> {
        let model = self.model()?.train(series)?;
        let forecast = model.forecast_with_intervals(self.config.horizon, self.config.confidence_level)?;
        info!(
            "Forecast {} days from {}",
            forecast.horizon(),
            model.last_date()
        );
        Ok((model, forecast))
    }
}
