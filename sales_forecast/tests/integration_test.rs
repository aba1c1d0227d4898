mod common;

use common::{weekly_sales, write_csv};
use sales_forecast::config::PipelineConfig;
use sales_forecast::error::ForecastError;
use sales_forecast::pipeline::Pipeline;
use sales_forecast::report::ChartKind;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn config(input: &Path, output_dir: &Path) -> PipelineConfig {
    PipelineConfig {
        input: input.to_path_buf(),
        output_dir: output_dir.to_path_buf(),
        horizon: 14,
        ..PipelineConfig::default()
    }
}

#[test]
fn test_full_pipeline_writes_all_outputs() {
    let input = write_csv(&weekly_sales(42));
    let dir = tempdir().unwrap();
    let config = PipelineConfig {
        holdout_days: Some(7),
        ..config(input.path(), dir.path())
    };

    let output = Pipeline::new(config).unwrap().run().unwrap();

    assert_eq!(output.table.len(), 84);
    assert_eq!(output.series.len(), 42);
    assert_eq!(output.report.charts().len(), 6);
    assert_eq!(output.forecast.as_ref().unwrap().horizon(), 14);
    assert!(output.model.is_some());
    assert!(output.holdout.is_some());

    for kind in ChartKind::ALL {
        assert!(dir.path().join(kind.file_name()).exists(), "{:?}", kind);
    }
    for table in [
        "daily_sales.csv",
        "product_performance.csv",
        "branch_performance.csv",
        "customer_segments.csv",
        "forecast.csv",
    ] {
        assert!(dir.path().join(table).exists(), "{}", table);
    }

    let manifest: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join("manifest.json")).unwrap()).unwrap();
    let charts = manifest["charts"].as_array().unwrap();
    assert_eq!(charts.len(), 6);
    assert_eq!(charts[0]["url"], "/viz/sales_trend.json");
    assert_eq!(charts[5]["title"], "Sales Forecast");

    let forecast: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join("sales_forecast.json")).unwrap()).unwrap();
    assert_eq!(forecast["kind"], "sales_forecast");
    assert_eq!(forecast["data"]["actual"].as_array().unwrap().len(), 42);
    assert_eq!(forecast["data"]["forecast"].as_array().unwrap().len(), 14);
    assert!(forecast["data"]["trend"]["r_squared"].is_number());
    assert!(forecast["data"]["forecast"][0]["lower"].is_number());

    let csv = fs::read_to_string(dir.path().join("branch_performance.csv")).unwrap();
    assert!(csv.starts_with("branch,total,profit,rating"));
    assert_eq!(csv.lines().count(), 3);
}

#[test]
fn test_short_history_skips_forecast_chart() {
    let input = write_csv(&weekly_sales(10));
    let dir = tempdir().unwrap();

    let output = Pipeline::new(config(input.path(), dir.path()))
        .unwrap()
        .run()
        .unwrap();

    assert!(output.forecast.is_none());
    assert!(output.model.is_none());
    assert_eq!(output.report.charts().len(), 5);
    assert!(output.report.chart(ChartKind::SalesForecast).is_none());
    assert!(!dir.path().join("sales_forecast.json").exists());
    assert!(!dir.path().join("forecast.csv").exists());
    assert!(dir.path().join("branch_sales.json").exists());
}

#[test]
fn test_tables_can_be_disabled() {
    let input = write_csv(&weekly_sales(14));
    let dir = tempdir().unwrap();
    let config = PipelineConfig {
        write_tables: false,
        ..config(input.path(), dir.path())
    };

    let output = Pipeline::new(config).unwrap().run().unwrap();

    // Six charts and the manifest
    assert_eq!(output.written.len(), 7);
    assert!(!dir.path().join("daily_sales.csv").exists());
}

#[test]
fn test_branch_shares_sum_to_one_hundred() {
    let input = write_csv(&weekly_sales(14));
    let dir = tempdir().unwrap();
    Pipeline::new(config(input.path(), dir.path()))
        .unwrap()
        .run()
        .unwrap();

    let payload: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join("branch_sales.json")).unwrap()).unwrap();
    let share: f64 = payload["data"]["branches"]
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["share"].as_f64().unwrap())
        .sum();
    assert!((share - 100.0).abs() < 1e-9);
}

#[test]
fn test_missing_input_file() {
    let dir = tempdir().unwrap();
    let pipeline = Pipeline::new(config(&dir.path().join("absent.csv"), dir.path())).unwrap();
    assert!(matches!(pipeline.run(), Err(ForecastError::IoError(_))));
}

#[test]
fn test_invalid_config_is_rejected() {
    let config = PipelineConfig {
        seasonal_period: 1,
        ..PipelineConfig::default()
    };
    assert!(matches!(
        Pipeline::new(config),
        Err(ForecastError::InvalidParameter(_))
    ));
}

#[test]
fn test_config_file_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.json");
    fs::write(
        &path,
        r#"{"horizon": 7, "holdout_days": 3, "write_tables": false, "optimizer": {"restarts": 0}}"#,
    )
    .unwrap();

    let config = PipelineConfig::from_json_file(&path).unwrap();
    assert_eq!(config.horizon, 7);
    assert_eq!(config.holdout_days, Some(3));
    assert!(!config.write_tables);
    assert_eq!(config.seasonal_period, 7);
    assert_eq!(config.optimizer.restarts, 0);
    assert_eq!(config.optimizer.max_iter, 2000);
}
