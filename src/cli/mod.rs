//! CLI interface for event-backtest
//!
//! Provides subcommands for:
//! - `backtest`: Replay bars as fast as possible and report results
//! - `replay`: Replay bars on a heartbeat, logging holdings each tick
//! - `config`: Show configuration

mod backtest;
mod replay;

pub use backtest::{write_outputs, BacktestArgs, OutputFormat};
pub use replay::ReplayArgs;

use crate::backtest::{BacktestSimulator, SnapshotTiming};
use crate::config::{Config, DataFormat, StrategyKind};
use crate::data::{
    load_csv_bars, load_parquet_bars, parse_timestamp, BarSource, HistoricBarSource,
};
use crate::execution::SimulatedExecution;
use crate::strategy::{BuyAndHold, Strategy};
use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "event-backtest")]
#[command(about = "Event-driven backtester for historical OHLCV bars")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a backtest to completion
    Backtest(BacktestArgs),
    /// Paced replay with a heartbeat between ticks
    Replay(ReplayArgs),
    /// Show configuration
    Config,
}

/// Command-line overrides for the configuration file
#[derive(Args, Debug, Clone, Default)]
pub struct RunOverrides {
    /// Directory containing one bar file per instrument
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Instruments to replay (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub instruments: Option<Vec<String>>,

    /// Start time filter (RFC 3339 or YYYY-MM-DD)
    #[arg(long)]
    pub start: Option<String>,

    /// End time filter (RFC 3339 or YYYY-MM-DD)
    #[arg(long)]
    pub end: Option<String>,

    /// Initial capital
    #[arg(long)]
    pub capital: Option<Decimal>,

    /// Snapshot timing: on_market or end_of_tick
    #[arg(long, value_parser = parse_snapshot)]
    pub snapshot: Option<SnapshotTiming>,
}

impl RunOverrides {
    /// Apply the overrides to a copy of `config` and validate the result
    pub fn apply(&self, config: &Config) -> anyhow::Result<Config> {
        let mut config = config.clone();

        if let Some(ref dir) = self.data_dir {
            config.data.path = dir.clone();
        }
        if let Some(ref instruments) = self.instruments {
            config.backtest.instruments = instruments.clone();
        }
        if let Some(ref start) = self.start {
            config.backtest.start = Some(parse_timestamp(start)?);
        }
        if let Some(ref end) = self.end {
            config.backtest.end = Some(parse_timestamp(end)?);
        }
        if let Some(capital) = self.capital {
            config.backtest.initial_capital = capital;
        }
        if let Some(snapshot) = self.snapshot {
            config.backtest.snapshot = snapshot;
        }

        config.validate()?;
        Ok(config)
    }
}

fn parse_snapshot(s: &str) -> Result<SnapshotTiming, String> {
    match s {
        "on_market" => Ok(SnapshotTiming::OnMarket),
        "end_of_tick" => Ok(SnapshotTiming::EndOfTick),
        other => Err(format!(
            "unknown snapshot timing {:?}, expected on_market or end_of_tick",
            other
        )),
    }
}

/// Simulator assembled from configuration
pub type ConfiguredSimulator =
    BacktestSimulator<HistoricBarSource, Box<dyn Strategy>, SimulatedExecution>;

/// Load bars and assemble the simulator described by `config`
pub fn build_simulator(config: &Config) -> anyhow::Result<ConfiguredSimulator> {
    let settings = &config.backtest;
    let bars = match config.data.format {
        DataFormat::Csv => load_csv_bars(
            &config.data.path,
            &settings.instruments,
            settings.start,
            settings.end,
        )?,
        DataFormat::Parquet => load_parquet_bars(
            &config.data.path,
            &settings.instruments,
            settings.start,
            settings.end,
        )?,
    };

    let source = HistoricBarSource::new(settings.instruments.clone(), bars)?;

    let strategy: Box<dyn Strategy> = match config.strategy.kind {
        StrategyKind::BuyAndHold => Box::new(BuyAndHold::new(
            source.instruments(),
            config.strategy.strength,
        )),
    };

    let execution = SimulatedExecution::new(
        config.execution.venue.clone(),
        config.execution.commission_schedule(),
    );

    Ok(BacktestSimulator::new(
        source,
        strategy,
        execution,
        config.backtest_config(),
    )?)
}
