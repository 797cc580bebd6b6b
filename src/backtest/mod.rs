//! Backtesting module
//!
//! Event-loop scheduler over a bar source, plus analytics and paced replay

mod analytics;
mod replay;
mod simulator;

pub use analytics::{
    drawdown_series, max_drawdown, sharpe_ratio, AnalyticsError, BacktestResult,
    BacktestSummary, Drawdown, DrawdownPoint, EquityCurve, EquityPoint,
};
pub use replay::{run_paced, ReplayOutcome};
pub use simulator::{BacktestSimulator, SimulatorState, TickOutcome};

use crate::data::DataError;
use crate::execution::{ExecutionError, OrderId};
use crate::portfolio::PortfolioError;
use crate::signal::SignalError;
use crate::strategy::StrategyError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// When the portfolio snapshots holdings within a tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotTiming {
    /// While dispatching the Market event, right after the strategy ran.
    /// Same-tick fills show up in the next snapshot.
    #[default]
    OnMarket,
    /// After the tick's queue is fully drained
    EndOfTick,
}

/// Backtest configuration
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    /// Initial capital
    pub initial_capital: Decimal,
    /// Sampling frequency used to annualise the Sharpe ratio
    pub periods_per_year: u32,
    pub snapshot: SnapshotTiming,
    /// Initial snapshot time; defaults to the first tick of the bar source
    pub start: Option<DateTime<Utc>>,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            initial_capital: dec!(100000),
            periods_per_year: 252,
            snapshot: SnapshotTiming::OnMarket,
            start: None,
        }
    }
}

/// Errors that abort a backtest run
#[derive(Debug, Error)]
pub enum BacktestError {
    #[error(transparent)]
    Data(#[from] DataError),
    #[error(transparent)]
    InvalidSignal(#[from] SignalError),
    #[error(transparent)]
    Strategy(#[from] StrategyError),
    #[error(transparent)]
    Portfolio(#[from] PortfolioError),
    #[error(transparent)]
    Execution(#[from] ExecutionError),
    #[error(transparent)]
    Analytics(#[from] AnalyticsError),
    /// Execution reported more shares than were ordered
    #[error("Order {order_id} filled {filled} of {ordered} shares")]
    Overfilled {
        order_id: OrderId,
        ordered: u64,
        filled: u64,
    },
    /// Bar source has no timeline to start from
    #[error("Bar source has no ticks")]
    EmptySource,
    /// A previous tick failed; state is no longer consistent
    #[error("Backtest was aborted by an earlier error")]
    Aborted,
}
