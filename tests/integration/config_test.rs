//! Configuration loading

use event_backtest::backtest::SnapshotTiming;
use event_backtest::config::{Config, DataFormat};
use std::fs;
use tempfile::TempDir;

#[test]
fn test_config_example_loads() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, include_str!("../../config.toml.example")).unwrap();

    let config = Config::load(&path).unwrap();
    assert_eq!(config.backtest.instruments, vec!["AAA", "BBB"]);
    assert_eq!(config.backtest.snapshot, SnapshotTiming::OnMarket);
    assert_eq!(config.data.format, DataFormat::Csv);
    assert_eq!(config.execution.venue, "SIM");
}

#[test]
fn test_load_rejects_invalid_values() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        r#"
        [backtest]
        instruments = ["AAA"]
        initial_capital = -5

        [data]
        path = "./data"
        "#,
    )
    .unwrap();

    let err = Config::load(&path).unwrap_err();
    assert!(err.to_string().contains("initial_capital"));
}

#[test]
fn test_load_rejects_unknown_format() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        r#"
        [backtest]
        instruments = ["AAA"]

        [data]
        format = "xlsx"
        path = "./data"
        "#,
    )
    .unwrap();

    assert!(Config::load(&path).is_err());
}
