//! Signal types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Directional intent expressed by a strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignalDirection {
    /// Open a long position
    Long,
    /// Open a short position
    Short,
    /// Close an existing position
    Exit,
}

impl fmt::Display for SignalDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SignalDirection::Long => "LONG",
            SignalDirection::Short => "SHORT",
            SignalDirection::Exit => "EXIT",
        };
        f.write_str(s)
    }
}

impl FromStr for SignalDirection {
    type Err = SignalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "LONG" => Ok(SignalDirection::Long),
            "SHORT" => Ok(SignalDirection::Short),
            "EXIT" => Ok(SignalDirection::Exit),
            _ => Err(SignalError::UnknownDirection(s.to_string())),
        }
    }
}

/// Invalid signal errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignalError {
    /// Direction outside LONG / SHORT / EXIT
    #[error("Invalid signal: unknown direction {0:?}")]
    UnknownDirection(String),
    /// Strength must be strictly positive
    #[error("Invalid signal: strength must be > 0, got {0}")]
    NonPositiveStrength(Decimal),
    /// Signal for an instrument the bar source does not know
    #[error("Invalid signal: unregistered instrument {0}")]
    UnregisteredInstrument(String),
}

/// A strategy's directional intent for one instrument, not yet sized
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signal {
    /// Instrument code
    pub instrument: String,
    /// Timestamp of the bar that produced the signal
    pub timestamp: DateTime<Utc>,
    /// Trade direction
    pub direction: SignalDirection,
    /// Sizing strength, > 0
    pub strength: Decimal,
}

impl Signal {
    /// Create a validated signal
    pub fn new(
        instrument: impl Into<String>,
        timestamp: DateTime<Utc>,
        direction: SignalDirection,
        strength: Decimal,
    ) -> Result<Self, SignalError> {
        let signal = Self {
            instrument: instrument.into(),
            timestamp,
            direction,
            strength,
        };
        signal.validate()?;
        Ok(signal)
    }

    /// Check the strength invariant
    pub fn validate(&self) -> Result<(), SignalError> {
        if self.strength <= Decimal::ZERO {
            return Err(SignalError::NonPositiveStrength(self.strength));
        }
        Ok(())
    }
}
