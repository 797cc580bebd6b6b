//! File-backed runs through the configured pipeline

use crate::common::{day, series};
use event_backtest::cli::{build_simulator, write_outputs};
use event_backtest::config::{Config, DataFormat};
use event_backtest::data::{ParquetReader, ParquetWriter};
use rust_decimal_macros::dec;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn config(data_dir: &Path, format: DataFormat) -> Config {
    let mut config: Config = toml::from_str(&format!(
        r#"
        [backtest]
        instruments = ["A", "B"]

        [data]
        path = {:?}
        "#,
        data_dir.display().to_string()
    ))
    .unwrap();
    config.data.format = format;
    config
}

#[test]
fn test_csv_run_matches_scenario() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("A.csv"),
        "timestamp,open,low,high,close,volume\n\
         2024-01-01,10,10,10,10,1000\n\
         2024-01-02,11,11,11,11,1000\n\
         2024-01-03,12,12,12,12,1000\n",
    )
    .unwrap();
    // Columns out of order, unsorted rows
    fs::write(
        dir.path().join("B.csv"),
        "close,volume,timestamp,open,low,high\n\
         19,500,2024-01-02,19,19,19\n\
         20,500,2024-01-01,20,20,20\n\
         21,500,2024-01-03,21,21,21\n",
    )
    .unwrap();

    let mut sim = build_simulator(&config(dir.path(), DataFormat::Csv)).unwrap();
    let result = sim.run().unwrap();

    assert_eq!(result.summary.ticks, 3);
    assert_eq!(sim.portfolio().position("A").unwrap(), 1000);
    assert_eq!(sim.portfolio().position("B").unwrap(), 1000);
    assert_eq!(result.holdings.last().unwrap().total, dec!(102990));
    assert_eq!(result.holdings.last().unwrap().timestamp, day(2));
}

#[test]
fn test_parquet_run_and_outputs() {
    let data = TempDir::new().unwrap();
    let writer = ParquetWriter::new(data.path().to_path_buf());
    writer
        .write_bars(
            &data.path().join("A.parquet"),
            &series("A", &[dec!(10), dec!(11), dec!(12)]),
        )
        .unwrap();
    writer
        .write_bars(
            &data.path().join("B.parquet"),
            &series("B", &[dec!(20), dec!(19), dec!(21)]),
        )
        .unwrap();

    let mut sim = build_simulator(&config(data.path(), DataFormat::Parquet)).unwrap();
    let result = sim.run().unwrap();
    assert_eq!(result.holdings.last().unwrap().total, dec!(102990));

    let out = TempDir::new().unwrap();
    let out_dir = out.path().join("results");
    write_outputs(&out_dir, &["A".to_string(), "B".to_string()], &result).unwrap();

    assert!(out_dir.join("equity_curve.parquet").exists());
    assert!(out_dir.join("holdings.parquet").exists());
    let summary = fs::read_to_string(out_dir.join("summary.json")).unwrap();
    assert!(summary.contains("\"ticks\": 3"));

    let roundtrip = ParquetReader::new(data.path().join("B.parquet"))
        .read_bars()
        .unwrap();
    assert_eq!(roundtrip.len(), 3);
    assert_eq!(roundtrip[1].close, dec!(19));
}

#[test]
fn test_missing_instrument_file_fails() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("A.csv"),
        "timestamp,open,low,high,close,volume\n2024-01-01,1,1,1,1,1\n",
    )
    .unwrap();

    assert!(build_simulator(&config(dir.path(), DataFormat::Csv)).is_err());
}

#[test]
fn test_start_filter_moves_initial_snapshot() {
    let dir = TempDir::new().unwrap();
    for name in ["A", "B"] {
        fs::write(
            dir.path().join(format!("{}.csv", name)),
            "timestamp,open,low,high,close,volume\n\
             2024-01-01,10,10,10,10,1\n\
             2024-01-02,10,10,10,10,1\n\
             2024-01-03,10,10,10,10,1\n",
        )
        .unwrap();
    }

    let mut config = config(dir.path(), DataFormat::Csv);
    config.backtest.start = Some(day(1));

    let mut sim = build_simulator(&config).unwrap();
    let result = sim.run().unwrap();
    assert_eq!(result.summary.ticks, 2);
    assert_eq!(result.holdings[0].timestamp, day(1));
}
