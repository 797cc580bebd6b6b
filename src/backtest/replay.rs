//! Paced replay on a heartbeat interval

use super::{BacktestError, BacktestSimulator, TickOutcome};
use crate::data::BarSource;
use crate::execution::ExecutionHandler;
use crate::strategy::Strategy;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};

/// How a paced replay ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayOutcome {
    /// Bar source exhausted
    Completed { ticks: usize },
    /// Cancellation requested before exhaustion
    Cancelled { ticks: usize },
}

/// Drive `sim` one tick per `heartbeat` until the bar source is exhausted or
/// `cancel` flips to `true`.
///
/// A tick always drains fully before the next heartbeat is awaited, so a
/// cancellation never interrupts a tick halfway.
pub async fn run_paced<B, S, E>(
    sim: &mut BacktestSimulator<B, S, E>,
    heartbeat: Duration,
    mut cancel: watch::Receiver<bool>,
) -> Result<ReplayOutcome, BacktestError>
where
    B: BarSource,
    S: Strategy,
    E: ExecutionHandler,
{
    let mut ticker = interval(heartbeat);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // Stays false once every sender is gone
    let mut cancellable = true;

    tracing::info!(heartbeat_ms = heartbeat.as_millis() as u64, "Starting paced replay");

    loop {
        if *cancel.borrow() {
            tracing::info!(ticks = sim.ticks(), "Replay cancelled");
            return Ok(ReplayOutcome::Cancelled { ticks: sim.ticks() });
        }

        tokio::select! {
            _ = ticker.tick() => {
                match sim.step()? {
                    TickOutcome::Continued => {
                        if let Some(holdings) = sim.portfolio().latest_holdings() {
                            tracing::info!(
                                tick = sim.ticks(),
                                timestamp = %holdings.timestamp,
                                cash = %holdings.cash,
                                commission = %holdings.commission,
                                total = %holdings.total,
                                "Heartbeat"
                            );
                        }
                    }
                    TickOutcome::Terminated => {
                        tracing::info!(ticks = sim.ticks(), "Replay complete");
                        return Ok(ReplayOutcome::Completed { ticks: sim.ticks() });
                    }
                }
            }
            changed = cancel.changed(), if cancellable => {
                if changed.is_err() {
                    cancellable = false;
                }
            }
        }
    }
}
