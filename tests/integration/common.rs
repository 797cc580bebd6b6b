//! Shared fixtures

use chrono::{DateTime, Duration, TimeZone, Utc};
use event_backtest::data::{Bar, HistoricBarSource};
use rust_decimal::Decimal;
use std::collections::HashMap;

pub fn day(n: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::days(n)
}

pub fn bar(instrument: &str, timestamp: DateTime<Utc>, close: Decimal) -> Bar {
    Bar {
        instrument: instrument.to_string(),
        timestamp,
        open: close,
        low: close,
        high: close,
        close,
        volume: Decimal::from(1000),
    }
}

/// Daily bars starting at day 0, one per close
pub fn series(instrument: &str, closes: &[Decimal]) -> Vec<Bar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, c)| bar(instrument, day(i as i64), *c))
        .collect()
}

pub fn source(series_by_instrument: Vec<(&str, Vec<Bar>)>) -> HistoricBarSource {
    let instruments = series_by_instrument
        .iter()
        .map(|(i, _)| i.to_string())
        .collect();
    let bars = series_by_instrument
        .into_iter()
        .map(|(i, s)| (i.to_string(), s))
        .collect::<HashMap<_, _>>();
    HistoricBarSource::new(instruments, bars).unwrap()
}
