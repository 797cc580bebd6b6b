//! Execution module
//!
//! Converts orders into fills

mod simulated;
mod types;

pub use simulated::SimulatedExecution;
pub use types::{
    CommissionSchedule, ExecutionError, Fill, Order, OrderDirection, OrderId, OrderType,
};

use crate::data::BarSource;

/// Trait for execution handler implementations
pub trait ExecutionHandler {
    /// Execute an order, returning zero or more fills whose quantities sum to
    /// at most the order quantity
    fn execute(
        &mut self,
        order: &Order,
        bars: &dyn BarSource,
    ) -> Result<Vec<Fill>, ExecutionError>;
}

impl<T: ExecutionHandler + ?Sized> ExecutionHandler for Box<T> {
    fn execute(
        &mut self,
        order: &Order,
        bars: &dyn BarSource,
    ) -> Result<Vec<Fill>, ExecutionError> {
        (**self).execute(order, bars)
    }
}
