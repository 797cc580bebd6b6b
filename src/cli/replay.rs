//! Replay command implementation

use super::{build_simulator, RunOverrides};
use crate::backtest::{run_paced, ReplayOutcome};
use crate::config::Config;
use clap::Args;
use std::time::Duration;
use tokio::sync::watch;

#[derive(Args, Debug)]
pub struct ReplayArgs {
    #[command(flatten)]
    pub overrides: RunOverrides,

    /// Delay between ticks in milliseconds
    #[arg(long, default_value = "500")]
    pub heartbeat_ms: u64,
}

impl ReplayArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let config = self.overrides.apply(config)?;
        let mut sim = build_simulator(&config)?;

        let (cancel_tx, cancel_rx) = watch::channel(false);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Ctrl-C received, stopping replay");
                let _ = cancel_tx.send(true);
            }
        });

        let outcome =
            run_paced(&mut sim, Duration::from_millis(self.heartbeat_ms), cancel_rx).await?;
        if let ReplayOutcome::Cancelled { ticks } = outcome {
            println!("Replay cancelled after {} ticks", ticks);
        }

        let result = sim.result()?;
        println!("{}", result.summary.format_table());
        Ok(())
    }
}
