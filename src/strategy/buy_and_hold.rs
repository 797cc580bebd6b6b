//! Buy-and-hold benchmark strategy

use super::{Strategy, StrategyError};
use crate::data::BarSource;
use crate::signal::{Signal, SignalDirection};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;

/// Emits one LONG signal per instrument the first time it has a bar, then
/// stays silent for that instrument.
#[derive(Debug, Clone)]
pub struct BuyAndHold {
    strength: Decimal,
    bought: HashMap<String, bool>,
}

impl BuyAndHold {
    /// Create a strategy for `instruments` with the given signal strength
    pub fn new(instruments: &[String], strength: Decimal) -> Self {
        Self {
            strength,
            bought: instruments.iter().map(|i| (i.clone(), false)).collect(),
        }
    }

    /// Whether a LONG signal was already emitted for `instrument`
    pub fn has_bought(&self, instrument: &str) -> bool {
        self.bought.get(instrument).copied().unwrap_or(false)
    }
}

impl Default for BuyAndHold {
    fn default() -> Self {
        Self {
            strength: dec!(10),
            bought: HashMap::new(),
        }
    }
}

impl Strategy for BuyAndHold {
    fn on_market(&mut self, bars: &dyn BarSource) -> Result<Vec<Signal>, StrategyError> {
        let mut signals = Vec::new();

        for instrument in bars.instruments() {
            let bought = self.bought.entry(instrument.clone()).or_insert(false);
            if *bought {
                continue;
            }
            if let Some(bar) = bars.latest_bar(instrument)? {
                signals.push(Signal::new(
                    instrument.clone(),
                    bar.timestamp,
                    SignalDirection::Long,
                    self.strength,
                )?);
                *bought = true;
            }
        }

        Ok(signals)
    }
}
