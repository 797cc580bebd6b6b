//! Bar and data error types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One OHLCV observation for an instrument
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bar {
    /// Instrument code
    pub instrument: String,
    /// Bar timestamp
    pub timestamp: DateTime<Utc>,
    pub open: Decimal,
    pub low: Decimal,
    pub high: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
}

impl Bar {
    /// Copy of this bar re-stamped at `timestamp` (pad fill)
    pub fn padded_to(&self, timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            ..self.clone()
        }
    }
}

/// Bar source errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DataError {
    /// Query against an instrument that was not registered
    #[error("Unknown instrument: {0}")]
    UnknownInstrument(String),
    /// No instruments registered
    #[error("No instruments registered")]
    EmptyUniverse,
    /// Registered instrument without any bars
    #[error("No bars for instrument: {0}")]
    NoData(String),
    /// Timestamps not strictly increasing
    #[error("Bars for {instrument} are not strictly increasing at {timestamp}")]
    UnorderedSeries {
        instrument: String,
        timestamp: DateTime<Utc>,
    },
    /// Bar stored under a different instrument's series
    #[error("Bar at {timestamp} is tagged {found}, expected {expected}")]
    MismatchedInstrument {
        expected: String,
        found: String,
        timestamp: DateTime<Utc>,
    },
    /// Source has not produced a tick yet
    #[error("Bar source has not advanced yet")]
    NotStarted,
}
