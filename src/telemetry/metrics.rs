//! Backtest metrics
//!
//! Recorded through the `metrics` facade; without an installed recorder the
//! calls are no-ops.

use crate::event::EventKind;
use crate::execution::Fill;
use crate::portfolio::HoldingsSnapshot;
use metrics::{counter, gauge};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// Counter metric types
#[derive(Debug, Clone, Copy)]
pub enum CounterMetric {
    /// Events dispatched, labelled by kind
    Events,
    /// Ticks fully drained
    Ticks,
    /// Fills applied to the portfolio
    Fills,
}

/// Gauge metric types
#[derive(Debug, Clone, Copy)]
pub enum GaugeMetric {
    /// Marked portfolio total
    Equity,
    /// Free cash
    Cash,
    /// Cumulative commission
    Commission,
}

impl CounterMetric {
    pub fn name(self) -> &'static str {
        match self {
            CounterMetric::Events => "bt_events_total",
            CounterMetric::Ticks => "bt_ticks_total",
            CounterMetric::Fills => "bt_fills_total",
        }
    }
}

impl GaugeMetric {
    pub fn name(self) -> &'static str {
        match self {
            GaugeMetric::Equity => "bt_equity",
            GaugeMetric::Cash => "bt_cash",
            GaugeMetric::Commission => "bt_commission",
        }
    }
}

/// Count a dispatched event
pub fn record_event(kind: EventKind) {
    counter!(CounterMetric::Events.name(), "kind" => kind.as_str()).increment(1);
}

/// Count an applied fill
pub fn record_fill(fill: &Fill) {
    counter!(CounterMetric::Fills.name(), "instrument" => fill.instrument.clone()).increment(1);
}

/// Count a completed tick and publish the latest holdings
pub fn record_tick(holdings: Option<&HoldingsSnapshot>) {
    counter!(CounterMetric::Ticks.name()).increment(1);

    if let Some(h) = holdings {
        set_gauge(GaugeMetric::Equity, h.total);
        set_gauge(GaugeMetric::Cash, h.cash);
        set_gauge(GaugeMetric::Commission, h.commission);
    }
}

/// Set a gauge value
pub fn set_gauge(metric: GaugeMetric, value: Decimal) {
    match value.to_f64() {
        Some(v) => gauge!(metric.name()).set(v),
        None => tracing::debug!(metric = metric.name(), value = %value, "Gauge value not representable"),
    }
}
