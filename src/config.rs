//! Configuration types for event-backtest

use crate::backtest::{BacktestConfig, SnapshotTiming};
use crate::execution::CommissionSchedule;
use crate::telemetry::LogFormat;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub backtest: BacktestSettings,
    pub data: DataConfig,
    #[serde(default)]
    pub strategy: StrategyConfig,
    #[serde(default)]
    pub execution: ExecutionConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Run parameters
#[derive(Debug, Clone, Deserialize)]
pub struct BacktestSettings {
    /// Instruments to replay, one data file each
    pub instruments: Vec<String>,

    #[serde(default = "default_initial_capital")]
    pub initial_capital: Decimal,

    /// Sampling frequency used to annualise the Sharpe ratio
    #[serde(default = "default_periods_per_year")]
    pub periods_per_year: u32,

    #[serde(default)]
    pub snapshot: SnapshotTiming,

    /// Drop bars before this time; also the initial snapshot time
    #[serde(default)]
    pub start: Option<DateTime<Utc>>,

    /// Drop bars after this time
    #[serde(default)]
    pub end: Option<DateTime<Utc>>,
}

fn default_initial_capital() -> Decimal {
    Decimal::new(100_000, 0)
}
fn default_periods_per_year() -> u32 {
    252
}

/// Bar file format
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DataFormat {
    #[default]
    Csv,
    Parquet,
}

/// Bar data location
#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    #[serde(default)]
    pub format: DataFormat,
    /// Directory holding one `<INSTRUMENT>.csv` or `.parquet` per instrument
    pub path: PathBuf,
}

/// Available strategies
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    #[default]
    BuyAndHold,
}

/// Strategy configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StrategyConfig {
    #[serde(default)]
    pub kind: StrategyKind,

    /// Signal strength; orders are sized at 100 shares per unit
    #[serde(default = "default_strength")]
    pub strength: Decimal,
}

fn default_strength() -> Decimal {
    Decimal::new(10, 0)
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            kind: StrategyKind::BuyAndHold,
            strength: default_strength(),
        }
    }
}

/// Simulated execution configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ExecutionConfig {
    /// Venue tag stamped on fills
    #[serde(default = "default_venue")]
    pub venue: String,

    /// Minimum commission per fill
    #[serde(default = "default_commission_minimum")]
    pub commission_minimum: Decimal,

    /// Commission per share
    #[serde(default = "default_commission_rate")]
    pub commission_rate: Decimal,
}

fn default_venue() -> String {
    "SIM".to_string()
}
fn default_commission_minimum() -> Decimal {
    Decimal::new(5, 0)
}
fn default_commission_rate() -> Decimal {
    Decimal::new(2, 4) // 0.0002
}

impl ExecutionConfig {
    /// Commission schedule for the simulator
    pub fn commission_schedule(&self) -> CommissionSchedule {
        CommissionSchedule {
            minimum: self.commission_minimum,
            rate: self.commission_rate,
        }
    }
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            venue: default_venue(),
            commission_minimum: default_commission_minimum(),
            commission_rate: default_commission_rate(),
        }
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_format: LogFormat,

    /// Serve Prometheus metrics on this port when set
    #[serde(default)]
    pub metrics_port: Option<u16>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: LogFormat::default(),
            metrics_port: None,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the engine cannot run with
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.backtest.instruments.is_empty() {
            anyhow::bail!("backtest.instruments must not be empty");
        }
        if self.backtest.initial_capital <= Decimal::ZERO {
            anyhow::bail!(
                "backtest.initial_capital must be > 0, got {}",
                self.backtest.initial_capital
            );
        }
        if self.backtest.periods_per_year == 0 {
            anyhow::bail!("backtest.periods_per_year must be > 0");
        }
        if let (Some(start), Some(end)) = (self.backtest.start, self.backtest.end) {
            if start > end {
                anyhow::bail!("backtest.start {} is after backtest.end {}", start, end);
            }
        }
        if self.strategy.strength <= Decimal::ZERO {
            anyhow::bail!("strategy.strength must be > 0, got {}", self.strategy.strength);
        }
        if self.execution.commission_minimum < Decimal::ZERO
            || self.execution.commission_rate < Decimal::ZERO
        {
            anyhow::bail!("execution commission settings must be >= 0");
        }
        Ok(())
    }

    /// Engine parameters for the simulator
    pub fn backtest_config(&self) -> BacktestConfig {
        BacktestConfig {
            initial_capital: self.backtest.initial_capital,
            periods_per_year: self.backtest.periods_per_year,
            snapshot: self.backtest.snapshot,
            start: self.backtest.start,
        }
    }
}
