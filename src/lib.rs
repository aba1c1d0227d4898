//! # Sales Insights
//!
//! Umbrella crate for the sales analytics workspace. It re-exports the
//! member crates so applications can depend on a single package.
//!
//! ## Example
//!
//! ```
//! use sales_insights_workspace::forecast::models::holt_winters::fit;
//! use sales_insights_workspace::forecast::DailySeries;
//! use chrono::NaiveDate;
//!
//! let start = NaiveDate::from_ymd_opt(2019, 1, 1).unwrap();
//! let series = DailySeries::from_values(start, &[5.0, 9.0, 5.0, 9.0, 5.0, 9.0]);
//! let model = fit(&series, 2).unwrap();
//! assert_eq!(model.observations(), 6);
//! ```

pub use sales_forecast as forecast;
pub use sales_math as math;

/// Version of the workspace facade
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
