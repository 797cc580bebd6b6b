//! Strategy module
//!
//! Strategies read the bar source on every Market event and emit signals.
//! They never touch the portfolio or execution layers.

mod buy_and_hold;

pub use buy_and_hold::BuyAndHold;

use crate::data::{BarSource, DataError};
use crate::signal::{Signal, SignalError};
use thiserror::Error;

/// Strategy errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StrategyError {
    #[error(transparent)]
    Data(#[from] DataError),
    #[error(transparent)]
    InvalidSignal(#[from] SignalError),
}

/// Trait for signal generators
pub trait Strategy {
    /// React to a Market event
    fn on_market(&mut self, bars: &dyn BarSource) -> Result<Vec<Signal>, StrategyError>;
}

impl<T: Strategy + ?Sized> Strategy for Box<T> {
    fn on_market(&mut self, bars: &dyn BarSource) -> Result<Vec<Signal>, StrategyError> {
        (**self).on_market(bars)
    }
}
