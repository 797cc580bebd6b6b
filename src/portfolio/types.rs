//! Portfolio types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::data::DataError;

/// Running account state updated by fills
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holdings {
    /// Signed cost accumulated per instrument since the start of the run
    pub market_values: BTreeMap<String, Decimal>,
    /// Free cash
    pub cash: Decimal,
    /// Cumulative commission paid
    pub commission: Decimal,
    /// Cash-flow total: initial capital less every fill's cost and commission
    pub total: Decimal,
}

impl Holdings {
    /// Flat account holding only `initial_capital` in cash
    pub fn new(instruments: &[String], initial_capital: Decimal) -> Self {
        Self {
            market_values: instruments
                .iter()
                .map(|i| (i.clone(), Decimal::ZERO))
                .collect(),
            cash: initial_capital,
            commission: Decimal::ZERO,
            total: initial_capital,
        }
    }
}

/// Positions as of one tick
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionSnapshot {
    pub timestamp: DateTime<Utc>,
    pub positions: BTreeMap<String, i64>,
}

impl PositionSnapshot {
    /// Position in `instrument`, 0 when not held
    pub fn position(&self, instrument: &str) -> i64 {
        self.positions.get(instrument).copied().unwrap_or(0)
    }
}

/// Holdings marked to the latest close as of one tick.
///
/// `total == cash + sum(market_values)` always holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoldingsSnapshot {
    pub timestamp: DateTime<Utc>,
    /// Position x latest close per instrument
    pub market_values: BTreeMap<String, Decimal>,
    pub cash: Decimal,
    /// Cumulative commission
    pub commission: Decimal,
    pub total: Decimal,
}

impl HoldingsSnapshot {
    /// Market value of `instrument`, 0 when absent
    pub fn market_value(&self, instrument: &str) -> Decimal {
        self.market_values
            .get(instrument)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }
}

/// Portfolio accounting errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PortfolioError {
    /// Signal or fill for an instrument the portfolio does not track
    #[error("Unknown instrument: {0}")]
    UnknownInstrument(String),
    /// Open position without any price to mark it at
    #[error("No price to mark {position} units of {instrument} at {timestamp}")]
    MissingPrice {
        instrument: String,
        position: i64,
        timestamp: DateTime<Utc>,
    },
    /// Accounting arithmetic left the representable range
    #[error("Arithmetic overflow while computing {0}")]
    Overflow(&'static str),
    #[error(transparent)]
    Data(#[from] DataError),
}
