use chrono::NaiveDate;
use sales_forecast::metrics::evaluate_holdout;
use sales_forecast::models::holt_winters::HoltWinters;
use sales_forecast::models::{ForecastModel, TrainedForecastModel};
use sales_forecast::series::DailySeries;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Sales Forecast: Basic Forecasting Example");
    println!("=========================================\n");

    // Create sample data: eight weeks of sales with busy weekends
    println!("Creating sample data...");
    let series = create_sample_daily_sales()?;
    println!(
        "Sample data created: {} days from {} to {}\n",
        series.len(),
        series.first_date().ok_or("empty series")?,
        series.last_date().ok_or("empty series")?
    );

    // Fit a weekly model
    println!("Training model...");
    let model = HoltWinters::new(7)?.train(&series)?;
    let params = model.parameters();
    println!(
        "{} trained: alpha={:.3} beta={:.3} gamma={:.3}, SSE={:.2}\n",
        model.name(),
        params.alpha,
        params.beta,
        params.gamma,
        model.sse()
    );

    // Forecast two weeks with 95% prediction intervals
    println!("Generating forecast...");
    let forecast = model.forecast_with_intervals(14, 0.95)?;
    let intervals = forecast.intervals().ok_or("missing intervals")?;
    for ((date, value), (lower, upper)) in forecast.points().into_iter().zip(intervals) {
        println!(
            "  {} {}: {:>8.2}  ({:.2}, {:.2})",
            date,
            date.format("%a"),
            value,
            lower,
            upper
        );
    }

    // Score the model on the last week
    println!("\nHoldout evaluation (last 7 days):");
    let holdout = evaluate_holdout(&series, 7, 7)?;
    print!("{}", holdout.accuracy);

    Ok(())
}

fn create_sample_daily_sales() -> Result<DailySeries, Box<dyn std::error::Error>> {
    // 2019-01-07 is a Monday
    let start = NaiveDate::from_ymd_opt(2019, 1, 7).ok_or("invalid start date")?;
    let weekly = [3100.0, 2950.0, 3000.0, 3200.0, 3500.0, 4300.0, 4100.0];

    let values: Vec<f64> = (0..56)
        .map(|day| {
            let growth = 12.0 * day as f64;
            let wobble = ((day * 37) % 11) as f64 * 15.0 - 75.0;
            weekly[day % 7] + growth + wobble
        })
        .collect();

    Ok(DailySeries::from_values(start, &values))
}
