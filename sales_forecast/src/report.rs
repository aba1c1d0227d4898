//! Renderer-ready chart payloads and tabular exports
//!
//! Six dashboard charts are described as JSON documents, one file per
//! chart plus a `manifest.json` index. Drawing is left to whatever
//! front end consumes them. Aggregation tables and the forecast are also
//! exported as CSV through polars.

use crate::aggregation::{
    BranchPerformance, CustomerSegment, DailySales, ProductPerformance, SalesSummary,
};
use crate::error::Result;
use crate::models::ForecastResult;
use crate::series::DailySeries;
use chrono::NaiveDate;
use log::{debug, info, warn};
use polars::prelude::{CsvWriter, DataFrame, NamedFrom, SerWriter, Series};
use sales_math::PolynomialFit;
use serde::Serialize;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

/// Degree of the trend curve drawn under the forecast
const TREND_DEGREE: usize = 2;

/// The dashboard charts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    SalesTrend,
    ProductPerformance,
    BranchSales,
    BranchRatings,
    CustomerInsights,
    SalesForecast,
}

impl ChartKind {
    pub const ALL: [ChartKind; 6] = [
        ChartKind::SalesTrend,
        ChartKind::ProductPerformance,
        ChartKind::BranchSales,
        ChartKind::BranchRatings,
        ChartKind::CustomerInsights,
        ChartKind::SalesForecast,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            ChartKind::SalesTrend => "Daily Sales Trends",
            ChartKind::ProductPerformance => "Product Performance",
            ChartKind::BranchSales => "Branch Sales Distribution",
            ChartKind::BranchRatings => "Branch Ratings",
            ChartKind::CustomerInsights => "Customer Insights",
            ChartKind::SalesForecast => "Sales Forecast",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ChartKind::SalesTrend => "Interactive visualization of daily sales performance over time",
            ChartKind::ProductPerformance => {
                "Comprehensive analysis of product line sales and customer ratings"
            }
            ChartKind::BranchSales => "Distribution of sales across different branch locations",
            ChartKind::BranchRatings => "Customer satisfaction ratings comparison across branches",
            ChartKind::CustomerInsights => {
                "Deep dive into customer segments and purchasing behavior"
            }
            ChartKind::SalesForecast => "Sales forecast with trend analysis and predictions",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            ChartKind::SalesTrend => "📈",
            ChartKind::ProductPerformance => "📊",
            ChartKind::BranchSales => "🏪",
            ChartKind::BranchRatings => "⭐",
            ChartKind::CustomerInsights => "👥",
            ChartKind::SalesForecast => "🔮",
        }
    }

    /// File name without extension
    pub fn stem(&self) -> &'static str {
        match self {
            ChartKind::SalesTrend => "sales_trend",
            ChartKind::ProductPerformance => "product_performance",
            ChartKind::BranchSales => "branch_sales",
            ChartKind::BranchRatings => "branch_ratings",
            ChartKind::CustomerInsights => "customer_insights",
            ChartKind::SalesForecast => "sales_forecast",
        }
    }

    pub fn file_name(&self) -> String {
        format!("{}.json", self.stem())
    }
}

/// Share of total sales taken by one branch
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BranchShare {
    pub branch: String,
    pub total: f64,
    /// Percent of all sales
    pub share: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BranchRating {
    pub branch: String,
    pub rating: f64,
}

/// Quadratic least-squares curve over the actual series
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendLine {
    pub values: Vec<f64>,
    pub r_squared: f64,
    /// Ascending powers of the day index
    pub coefficients: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub value: f64,
    pub lower: Option<f64>,
    pub upper: Option<f64>,
}

/// Actual sales, their trend and the forecast continuing them
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastOverlay {
    pub actual: Vec<DailySales>,
    pub trend: Option<TrendLine>,
    pub forecast: Vec<ForecastPoint>,
    pub confidence_level: Option<f64>,
}

impl ForecastOverlay {
    pub fn new(series: &DailySeries, forecast: &ForecastResult) -> Self {
        let intervals = forecast.intervals();
        let forecast_points = forecast
            .points()
            .into_iter()
            .enumerate()
            .map(|(i, (date, value))| {
                let bounds = intervals.and_then(|all| all.get(i));
                ForecastPoint {
                    date,
                    value,
                    lower: bounds.map(|b| b.0),
                    upper: bounds.map(|b| b.1),
                }
            })
            .collect();

        Self {
            actual: series
                .points()
                .map(|(date, total)| DailySales { date, total })
                .collect(),
            trend: trend_line(series.values()),
            forecast: forecast_points,
            confidence_level: forecast.confidence_level(),
        }
    }
}

/// Fit the trend curve; `None` when the series cannot support it
fn trend_line(values: &[f64]) -> Option<TrendLine> {
    let x: Vec<f64> = (0..values.len()).map(|i| i as f64).collect();
    let fit = PolynomialFit::fit(&x, values, TREND_DEGREE)
        .map_err(|e| debug!("No trend line: {}", e))
        .ok()?;
    let r_squared = fit
        .r_squared(&x, values)
        .map_err(|e| debug!("No trend R²: {}", e))
        .ok()?;

    Some(TrendLine {
        values: fit.predict_all(&x),
        r_squared,
        coefficients: fit.coefficients().to_vec(),
    })
}

/// Data behind one chart
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ChartData {
    SalesTrend { points: Vec<DailySales> },
    ProductPerformance { products: Vec<ProductPerformance> },
    BranchSales { branches: Vec<BranchShare> },
    BranchRatings { branches: Vec<BranchRating> },
    CustomerInsights { segments: Vec<CustomerSegment> },
    SalesForecast(ForecastOverlay),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPayload {
    pub kind: ChartKind,
    pub title: String,
    pub description: String,
    pub icon: String,
    pub data: ChartData,
}

impl ChartPayload {
    fn new(kind: ChartKind, data: ChartData) -> Self {
        Self {
            kind,
            title: kind.title().to_string(),
            description: kind.description().to_string(),
            icon: kind.icon().to_string(),
            data,
        }
    }
}

#[derive(Debug, Serialize)]
struct ManifestEntry<'a> {
    id: &'a str,
    title: &'a str,
    description: &'a str,
    icon: &'a str,
    url: String,
}

#[derive(Debug, Serialize)]
struct Manifest<'a> {
    charts: Vec<ManifestEntry<'a>>,
}

/// The set of chart payloads produced by one run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    charts: Vec<ChartPayload>,
}

impl Report {
    /// Build every chart; the forecast chart only when a forecast exists
    pub fn build(
        summary: &SalesSummary,
        series: &DailySeries,
        forecast: Option<&ForecastResult>,
    ) -> Self {
        let total_sales: f64 = summary.branches.iter().map(|b| b.total).sum();
        let shares = summary
            .branches
            .iter()
            .map(|b| BranchShare {
                branch: b.branch.clone(),
                total: b.total,
                share: if total_sales != 0.0 {
                    b.total / total_sales * 100.0
                } else {
                    0.0
                },
            })
            .collect();
        let ratings = summary
            .branches
            .iter()
            .map(|BranchPerformance { branch, rating, .. }| BranchRating {
                branch: branch.clone(),
                rating: *rating,
            })
            .collect();

        let mut charts = vec![
            ChartPayload::new(
                ChartKind::SalesTrend,
                ChartData::SalesTrend {
                    points: summary.daily_sales.clone(),
                },
            ),
            ChartPayload::new(
                ChartKind::ProductPerformance,
                ChartData::ProductPerformance {
                    products: summary.products.clone(),
                },
            ),
            ChartPayload::new(ChartKind::BranchSales, ChartData::BranchSales { branches: shares }),
            ChartPayload::new(
                ChartKind::BranchRatings,
                ChartData::BranchRatings { branches: ratings },
            ),
            ChartPayload::new(
                ChartKind::CustomerInsights,
                ChartData::CustomerInsights {
                    segments: summary.customers.clone(),
                },
            ),
        ];

        match forecast {
            Some(forecast) => charts.push(ChartPayload::new(
                ChartKind::SalesForecast,
                ChartData::SalesForecast(ForecastOverlay::new(series, forecast)),
            )),
            None => warn!("No forecast available, omitting the forecast chart"),
        }

        Self { charts }
    }

    pub fn charts(&self) -> &[ChartPayload] {
        &self.charts
    }

    pub fn chart(&self, kind: ChartKind) -> Option<&ChartPayload> {
        self.charts.iter().find(|c| c.kind == kind)
    }

    /// Write one JSON file per chart plus `manifest.json` into `dir`
    pub fn write_json<P: AsRef<Path>>(&self, dir: P) -> Result<Vec<PathBuf>> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let mut written = Vec::with_capacity(self.charts.len() + 1);
        for chart in &self.charts {
            let path = dir.join(chart.kind.file_name());
            serde_json::to_writer_pretty(BufWriter::new(File::create(&path)?), chart)?;
            debug!("Wrote {}", path.display());
            written.push(path);
        }

        let manifest = Manifest {
            charts: self
                .charts
                .iter()
                .map(|c| ManifestEntry {
                    id: c.kind.stem(),
                    title: &c.title,
                    description: &c.description,
                    icon: &c.icon,
                    url: format!("/viz/{}", c.kind.file_name()),
                })
                .collect(),
        };
        let path = dir.join("manifest.json");
        serde_json::to_writer_pretty(BufWriter::new(File::create(&path)?), &manifest)?;
        written.push(path);

        info!("Wrote {} chart payloads to {}", self.charts.len(), dir.display());
        Ok(written)
    }
}

fn write_csv(path: &Path, mut df: DataFrame) -> Result<PathBuf> {
    let mut file = File::create(path)?;
    CsvWriter::new(&mut file).has_header(true).finish(&mut df)?;
    debug!("Wrote {} rows to {}", df.height(), path.display());
    Ok(path.to_path_buf())
}

fn dates_column(name: &str, dates: impl Iterator<Item = NaiveDate>) -> Series {
    let dates: Vec<String> = dates.map(|d| d.format("%Y-%m-%d").to_string()).collect();
    Series::new(name, dates)
}

/// Export the aggregation tables, and the forecast when present, as CSV
pub fn write_tables<P: AsRef<Path>>(
    dir: P,
    summary: &SalesSummary,
    forecast: Option<&ForecastResult>,
) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;
    let mut written = Vec::new();

    let daily = DataFrame::new(vec![
        dates_column("date", summary.daily_sales.iter().map(|d| d.date)),
        Series::new("total", summary.daily_sales.iter().map(|d| d.total).collect::<Vec<_>>()),
    ])?;
    written.push(write_csv(&dir.join("daily_sales.csv"), daily)?);

    let products = &summary.products;
    let products = DataFrame::new(vec![
        Series::new("product_line", products.iter().map(|p| p.product_line.clone()).collect::<Vec<_>>()),
        Series::new("quantity", products.iter().map(|p| p.quantity).collect::<Vec<_>>()),
        Series::new("total", products.iter().map(|p| p.total).collect::<Vec<_>>()),
        Series::new("profit", products.iter().map(|p| p.profit).collect::<Vec<_>>()),
        Series::new("rating", products.iter().map(|p| p.rating).collect::<Vec<_>>()),
    ])?;
    written.push(write_csv(&dir.join("product_performance.csv"), products)?);

    let branches = &summary.branches;
    let branches = DataFrame::new(vec![
        Series::new("branch", branches.iter().map(|b| b.branch.clone()).collect::<Vec<_>>()),
        Series::new("total", branches.iter().map(|b| b.total).collect::<Vec<_>>()),
        Series::new("profit", branches.iter().map(|b| b.profit).collect::<Vec<_>>()),
        Series::new("rating", branches.iter().map(|b| b.rating).collect::<Vec<_>>()),
    ])?;
    written.push(write_csv(&dir.join("branch_performance.csv"), branches)?);

    let customers = &summary.customers;
    let customers = DataFrame::new(vec![
        Series::new("customer_type", customers.iter().map(|c| c.customer_type.clone()).collect::<Vec<_>>()),
        Series::new("mean_total", customers.iter().map(|c| c.mean_total).collect::<Vec<_>>()),
        Series::new("total", customers.iter().map(|c| c.total).collect::<Vec<_>>()),
        Series::new("mean_quantity", customers.iter().map(|c| c.mean_quantity).collect::<Vec<_>>()),
        Series::new("mean_rating", customers.iter().map(|c| c.mean_rating).collect::<Vec<_>>()),
    ])?;
    written.push(write_csv(&dir.join("customer_segments.csv"), customers)?);

    if let Some(forecast) = forecast {
        let points = forecast.points();
        let bounds: Vec<Option<(f64, f64)>> = (0..points.len())
            .map(|i| forecast.intervals().and_then(|all| all.get(i).copied()))
            .collect();
        let df = DataFrame::new(vec![
            dates_column("date", points.iter().map(|p| p.0)),
            Series::new("forecast", points.iter().map(|p| p.1).collect::<Vec<_>>()),
            Series::new("lower", bounds.iter().map(|b| b.map(|b| b.0)).collect::<Vec<_>>()),
            Series::new("upper", bounds.iter().map(|b| b.map(|b| b.1)).collect::<Vec<_>>()),
        ])?;
        written.push(write_csv(&dir.join("forecast.csv"), df)?);
    }

    info!("Exported {} tables to {}", written.len(), dir.display());
    Ok(written)
}
