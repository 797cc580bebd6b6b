//! Execution types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use crate::data::DataError;

/// Order identifier
pub type OrderId = Uuid;

/// Order direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderDirection {
    Buy,
    Sell,
}

impl OrderDirection {
    /// +1 for BUY, -1 for SELL
    pub fn sign(self) -> i64 {
        match self {
            OrderDirection::Buy => 1,
            OrderDirection::Sell => -1,
        }
    }
}

impl fmt::Display for OrderDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderDirection::Buy => f.write_str("BUY"),
            OrderDirection::Sell => f.write_str("SELL"),
        }
    }
}

/// Order type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderType {
    /// Market order (immediate execution)
    Market,
    /// Limit order (price specified)
    Limit,
}

/// A sized, directional instruction to the execution layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Order identifier
    pub id: OrderId,
    /// Instrument code
    pub instrument: String,
    /// Share quantity
    pub quantity: u64,
    /// Trade direction
    pub direction: OrderDirection,
    /// Order type
    pub order_type: OrderType,
}

impl Order {
    /// Create a market order with a fresh id
    pub fn market(
        instrument: impl Into<String>,
        quantity: u64,
        direction: OrderDirection,
    ) -> Self {
        Self {
            id: OrderId::new_v4(),
            instrument: instrument.into(),
            quantity,
            direction,
            order_type: OrderType::Market,
        }
    }
}

/// Commission schedule: a flat minimum with a proportional component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionSchedule {
    /// Minimum charge per fill
    pub minimum: Decimal,
    /// Charge per share
    pub rate: Decimal,
}

impl CommissionSchedule {
    /// Commission for a fill of `quantity` shares, `None` on overflow
    pub fn commission(&self, quantity: u64) -> Option<Decimal> {
        let proportional = Decimal::from(quantity).checked_mul(self.rate)?;
        Some(proportional.max(self.minimum))
    }
}

impl Default for CommissionSchedule {
    fn default() -> Self {
        Self {
            minimum: dec!(5),
            rate: dec!(0.0002),
        }
    }
}

/// A fill (executed order)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fill {
    /// Originating order
    pub order_id: OrderId,
    /// Bar timestamp at which the order filled
    pub timestamp: DateTime<Utc>,
    /// Instrument code
    pub instrument: String,
    /// Execution venue tag
    pub venue: String,
    /// Filled quantity
    pub quantity: u64,
    /// Trade direction
    pub direction: OrderDirection,
    /// Unsigned notional: quantity x fill price
    pub fill_cost: Decimal,
    /// Commission charged, >= 0
    pub commission: Decimal,
}

impl Fill {
    /// Create a fill; `commission = None` applies the default schedule
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        order_id: OrderId,
        timestamp: DateTime<Utc>,
        instrument: impl Into<String>,
        venue: impl Into<String>,
        quantity: u64,
        direction: OrderDirection,
        fill_cost: Decimal,
        commission: Option<Decimal>,
    ) -> Self {
        Self {
            order_id,
            timestamp,
            instrument: instrument.into(),
            venue: venue.into(),
            quantity,
            direction,
            fill_cost,
            // u64::MAX x 0.0002 is well inside Decimal range
            commission: commission
                .or_else(|| CommissionSchedule::default().commission(quantity))
                .unwrap_or(Decimal::MAX),
        }
    }

    /// Cost with the direction sign applied (BUY positive, SELL negative)
    pub fn signed_cost(&self) -> Decimal {
        Decimal::from(self.direction.sign()) * self.fill_cost
    }
}

/// Execution errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExecutionError {
    /// Bar source lookup failed
    #[error(transparent)]
    Data(#[from] DataError),
    /// No bar released yet for the instrument
    #[error("No price available for {0}")]
    NoPrice(String),
    /// Proportional commission overflowed
    #[error("Commission overflow for {instrument}: {quantity} x {rate}")]
    CommissionOverflow {
        instrument: String,
        quantity: u64,
        rate: Decimal,
    },
    /// Notional overflowed
    #[error("Fill cost overflow for {instrument}: {quantity} @ {price}")]
    Overflow {
        instrument: String,
        quantity: u64,
        price: Decimal,
    },
}
