use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;
use sales_forecast::{Pipeline, PipelineConfig};
use std::path::PathBuf;

/// Flags left unset fall back to the config file, then to built-in defaults.
#[derive(Parser)]
#[command(name = "sales_report")]
#[command(about = "Retail sales analytics and Holt-Winters forecast report")]
#[command(version)]
struct Cli {
    /// Transaction log [default: data/supermarket_sales.csv]
    input: Option<PathBuf>,
    /// Days to forecast [default: 30]
    #[arg(long)]
    horizon: Option<usize>,
    /// Observations per season [default: 7]
    #[arg(long)]
    seasonal_period: Option<usize>,
    /// Directory for chart payloads and tables [default: visualizations]
    #[arg(short, long)]
    output_dir: Option<PathBuf>,
    /// Input field delimiter [default: ,]
    #[arg(short, long)]
    delimiter: Option<char>,
    /// Hold out this many trailing days and report forecast accuracy on them
    #[arg(long)]
    holdout: Option<usize>,
    /// Prediction interval coverage [default: 0.95]
    #[arg(long)]
    confidence: Option<f64>,
    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Skip the CSV table exports
    #[arg(long)]
    no_tables: bool,
}

impl Cli {
    fn into_config(self) -> Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_json_file(path)
                .with_context(|| format!("reading config {}", path.display()))?,
            None => PipelineConfig::default(),
        };

        if let Some(input) = self.input {
            config.input = input;
        }
        if let Some(horizon) = self.horizon {
            config.horizon = horizon;
        }
        if let Some(period) = self.seasonal_period {
            config.seasonal_period = period;
        }
        if let Some(dir) = self.output_dir {
            config.output_dir = dir;
        }
        if let Some(delimiter) = self.delimiter {
            config.delimiter = delimiter;
        }
        if self.holdout.is_some() {
            config.holdout_days = self.holdout;
        }
        if let Some(confidence) = self.confidence {
            config.confidence_level = confidence;
        }
        if self.no_tables {
            config.write_tables = false;
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = Cli::parse().into_config()?;
    let input = config.input.clone();
    let pipeline = Pipeline::new(config).context("invalid configuration")?;
    let output = pipeline
        .run()
        .with_context(|| format!("processing {}", input.display()))?;

    println!(
        "Processed {} transactions over {} days, total sales {:.2}",
        output.summary.transactions,
        output.series.len(),
        output.summary.total_sales
    );
    match &output.forecast {
        Some(forecast) => {
            let total: f64 = forecast.values().iter().sum();
            println!(
                "Forecast: {} days, projected sales {:.2}",
                forecast.horizon(),
                total
            );
        }
        None => println!("Forecast: skipped, not enough history"),
    }
    if let Some(holdout) = &output.holdout {
        print!("{}", holdout.accuracy);
    }
    println!(
        "Wrote {} files to {}",
        output.written.len(),
        pipeline.config().output_dir.display()
    );

    Ok(())
}
