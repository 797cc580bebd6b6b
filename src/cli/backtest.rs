//! Backtest command implementation

use super::{build_simulator, RunOverrides};
use crate::backtest::BacktestResult;
use crate::config::Config;
use crate::data::ParquetWriter;
use clap::{Args, ValueEnum};
use std::path::{Path, PathBuf};

/// Summary output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Args, Debug)]
pub struct BacktestArgs {
    #[command(flatten)]
    pub overrides: RunOverrides,

    /// Output directory for results
    #[arg(long, default_value = "./output")]
    pub output: PathBuf,

    /// Summary format printed to stdout
    #[arg(long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

impl BacktestArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let config = self.overrides.apply(config)?;
        tracing::info!(
            data = ?config.data.path,
            instruments = ?config.backtest.instruments,
            "Loading bars"
        );

        let mut sim = build_simulator(&config)?;
        let result = sim.run()?;

        write_outputs(&self.output, &config.backtest.instruments, &result)?;

        match self.format {
            OutputFormat::Table => println!("{}", result.summary.format_table()),
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result.summary)?),
        }

        Ok(())
    }
}

/// Write the summary JSON plus Parquet equity curve and holdings history
pub fn write_outputs(
    output: &Path,
    instruments: &[String],
    result: &BacktestResult,
) -> anyhow::Result<()> {
    let writer = ParquetWriter::new(output.to_path_buf());
    writer.ensure_dir()?;

    let summary_path = output.join("summary.json");
    std::fs::write(&summary_path, serde_json::to_string_pretty(&result.summary)?)?;

    let equity_path = writer.file_path("equity_curve");
    writer.write_equity_curve(&equity_path, result.equity_curve.points())?;

    let holdings_path = writer.file_path("holdings");
    writer.write_holdings(&holdings_path, instruments, &result.holdings)?;

    tracing::info!(
        summary = ?summary_path,
        equity_curve = ?equity_path,
        holdings = ?holdings_path,
        "Wrote backtest results"
    );
    Ok(())
}
