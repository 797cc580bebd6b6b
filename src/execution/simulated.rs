//! Simulated execution: immediate fills at the latest close

use super::{CommissionSchedule, ExecutionError, ExecutionHandler, Fill, Order};
use crate::data::BarSource;

/// Fills every order in full at the instrument's latest close.
///
/// No slippage, latency, partial fills or rejections.
#[derive(Debug, Clone)]
pub struct SimulatedExecution {
    venue: String,
    commission: CommissionSchedule,
}

impl SimulatedExecution {
    /// Create a simulator tagging fills with `venue`
    pub fn new(venue: impl Into<String>, commission: CommissionSchedule) -> Self {
        Self {
            venue: venue.into(),
            commission,
        }
    }

    /// Venue tag stamped on fills
    pub fn venue(&self) -> &str {
        &self.venue
    }
}

impl Default for SimulatedExecution {
    fn default() -> Self {
        Self::new("SIM", CommissionSchedule::default())
    }
}

impl ExecutionHandler for SimulatedExecution {
    fn execute(
        &mut self,
        order: &Order,
        bars: &dyn BarSource,
    ) -> Result<Vec<Fill>, ExecutionError> {
        if order.quantity == 0 {
            tracing::warn!(
                order_id = %order.id,
                instrument = %order.instrument,
                "Zero quantity order not filled"
            );
            return Ok(vec![]);
        }

        let bar = bars
            .latest_bar(&order.instrument)?
            .ok_or_else(|| ExecutionError::NoPrice(order.instrument.clone()))?;

        let fill_cost = bar
            .close
            .checked_mul(order.quantity.into())
            .ok_or_else(|| ExecutionError::Overflow {
                instrument: order.instrument.clone(),
                quantity: order.quantity,
                price: bar.close,
            })?;

        let commission = self.commission.commission(order.quantity).ok_or_else(|| {
            ExecutionError::CommissionOverflow {
                instrument: order.instrument.clone(),
                quantity: order.quantity,
                rate: self.commission.rate,
            }
        })?;

        let fill = Fill::new(
            order.id,
            bar.timestamp,
            order.instrument.clone(),
            self.venue.clone(),
            order.quantity,
            order.direction,
            fill_cost,
            Some(commission),
        );

        tracing::debug!(
            order_id = %order.id,
            instrument = %fill.instrument,
            direction = %fill.direction,
            quantity = fill.quantity,
            price = %bar.close,
            commission = %fill.commission,
            "Simulated fill"
        );

        Ok(vec![fill])
    }
}
