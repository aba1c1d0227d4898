//! # Sales Forecast
//!
//! A Rust library for descriptive analytics and short-horizon forecasting
//! over retail transaction logs.
//!
//! ## Features
//!
//! - Loading and cleaning of delimited transaction logs with typed,
//!   row-level error reporting
//! - Product, branch, customer and daily aggregations
//! - Additive Holt-Winters forecasting with optimized smoothing and
//!   prediction intervals
//! - Forecast accuracy metrics (MAE, MSE, RMSE, MAPE) and holdout evaluation
//! - JSON chart payloads and CSV table exports for a dashboard front end
//!
//! ## Quick Start
//!
//! ```no_run
//! use sales_forecast::data::{clean_data, DataLoader};
//! use sales_forecast::models::holt_winters::{fit, forecast};
//! use sales_forecast::series::DailySeries;
//!
//! # fn main() -> sales_forecast::error::Result<()> {
//! // Load and clean the transaction log
//! let raw = DataLoader::from_csv("data/supermarket_sales.csv")?;
//! let table = clean_data(&raw)?;
//!
//! // Fit a weekly model and forecast a month ahead
//! let series = DailySeries::from_table(&table);
//! let model = fit(&series, 7)?;
//! let result = forecast(&model, 30)?;
//!
//! for (date, value) in result.points() {
//!     println!("{}: {:.2}", date, value);
//! }
//! # Ok(())
//! # }
//! ```

pub mod aggregation;
pub mod config;
pub mod data;
pub mod encoding;
pub mod error;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod report;
pub mod series;
pub mod utils;

// Re-export commonly used types
pub use crate::aggregation::SalesSummary;
pub use crate::config::PipelineConfig;
pub use crate::data::{DataCleaner, DataLoader, SalesTable};
pub use crate::error::ForecastError;
pub use crate::metrics::{evaluate, ForecastAccuracy};
pub use crate::models::holt_winters::{HoltWinters, HoltWintersModel};
pub use crate::models::{ForecastModel, ForecastResult, TrainedForecastModel};
pub use crate::pipeline::{Pipeline, PipelineOutput};
pub use crate::series::DailySeries;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
