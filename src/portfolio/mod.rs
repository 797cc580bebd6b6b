//! Portfolio accounting
//!
//! Converts signals into orders, applies fills to positions and holdings,
//! and snapshots holdings marked to market once per tick.

mod types;

pub use types::{Holdings, HoldingsSnapshot, PortfolioError, PositionSnapshot};

use crate::data::{BarSource, DataError};
use crate::execution::{Fill, Order, OrderDirection};
use crate::signal::{Signal, SignalDirection};
use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::BTreeMap;

/// Shares per unit of signal strength
const QUANTITY_PER_STRENGTH: Decimal = dec!(100);

/// Position and holdings state machine
#[derive(Debug, Clone)]
pub struct Portfolio {
    instruments: Vec<String>,
    initial_capital: Decimal,
    current_positions: BTreeMap<String, i64>,
    current_holdings: Holdings,
    all_positions: Vec<PositionSnapshot>,
    all_holdings: Vec<HoldingsSnapshot>,
}

impl Portfolio {
    /// Create a flat portfolio and record the initial snapshot at `start`
    pub fn new(instruments: &[String], start: DateTime<Utc>, initial_capital: Decimal) -> Self {
        let current_positions: BTreeMap<String, i64> =
            instruments.iter().map(|i| (i.clone(), 0)).collect();
        let current_holdings = Holdings::new(instruments, initial_capital);

        let initial_positions = PositionSnapshot {
            timestamp: start,
            positions: current_positions.clone(),
        };
        let initial_holdings = HoldingsSnapshot {
            timestamp: start,
            market_values: current_holdings.market_values.clone(),
            cash: initial_capital,
            commission: Decimal::ZERO,
            total: initial_capital,
        };

        Self {
            instruments: instruments.to_vec(),
            initial_capital,
            current_positions,
            current_holdings,
            all_positions: vec![initial_positions],
            all_holdings: vec![initial_holdings],
        }
    }

    pub fn instruments(&self) -> &[String] {
        &self.instruments
    }

    pub fn initial_capital(&self) -> Decimal {
        self.initial_capital
    }

    /// Current signed position in `instrument`
    pub fn position(&self, instrument: &str) -> Result<i64, PortfolioError> {
        self.current_positions
            .get(instrument)
            .copied()
            .ok_or_else(|| PortfolioError::UnknownInstrument(instrument.to_string()))
    }

    pub fn current_positions(&self) -> &BTreeMap<String, i64> {
        &self.current_positions
    }

    pub fn current_holdings(&self) -> &Holdings {
        &self.current_holdings
    }

    /// Position history, one entry per snapshot including the initial one
    pub fn all_positions(&self) -> &[PositionSnapshot] {
        &self.all_positions
    }

    /// Holdings history, one entry per snapshot including the initial one
    pub fn all_holdings(&self) -> &[HoldingsSnapshot] {
        &self.all_holdings
    }

    /// Most recent marked snapshot
    pub fn latest_holdings(&self) -> Option<&HoldingsSnapshot> {
        self.all_holdings.last()
    }

    /// Size a signal into an order.
    ///
    /// LONG and SHORT only open from a flat position; EXIT only closes an
    /// existing position in the opposite direction. Anything else, or a
    /// quantity that floors to zero, yields no order.
    pub fn on_signal(&self, signal: &Signal) -> Result<Option<Order>, PortfolioError> {
        let position = self.position(&signal.instrument)?;

        let quantity = signal
            .strength
            .checked_mul(QUANTITY_PER_STRENGTH)
            .map(|q| q.floor())
            .and_then(|q| q.to_u64())
            .ok_or(PortfolioError::Overflow("order quantity"))?;

        let direction = match (signal.direction, position) {
            (SignalDirection::Long, 0) => OrderDirection::Buy,
            (SignalDirection::Short, 0) => OrderDirection::Sell,
            (SignalDirection::Exit, p) if p < 0 => OrderDirection::Buy,
            (SignalDirection::Exit, p) if p > 0 => OrderDirection::Sell,
            _ => {
                tracing::debug!(
                    instrument = %signal.instrument,
                    direction = %signal.direction,
                    position,
                    "Signal does not change exposure"
                );
                return Ok(None);
            }
        };

        if quantity == 0 {
            tracing::warn!(
                instrument = %signal.instrument,
                strength = %signal.strength,
                "Signal strength sizes to zero shares, no order"
            );
            return Ok(None);
        }

        Ok(Some(Order::market(
            signal.instrument.clone(),
            quantity,
            direction,
        )))
    }

    /// Apply a fill to positions and holdings
    pub fn on_fill(&mut self, fill: &Fill) -> Result<(), PortfolioError> {
        let position = self
            .current_positions
            .get_mut(&fill.instrument)
            .ok_or_else(|| PortfolioError::UnknownInstrument(fill.instrument.clone()))?;
        let value = self
            .current_holdings
            .market_values
            .get_mut(&fill.instrument)
            .ok_or_else(|| PortfolioError::UnknownInstrument(fill.instrument.clone()))?;

        let delta = i64::try_from(fill.quantity)
            .ok()
            .and_then(|q| q.checked_mul(fill.direction.sign()))
            .ok_or(PortfolioError::Overflow("fill quantity"))?;
        let new_position = position
            .checked_add(delta)
            .ok_or(PortfolioError::Overflow("position"))?;

        let signed_cost = fill.signed_cost();
        let outflow = signed_cost
            .checked_add(fill.commission)
            .ok_or(PortfolioError::Overflow("fill outflow"))?;

        let cash = self
            .current_holdings
            .cash
            .checked_sub(outflow)
            .ok_or(PortfolioError::Overflow("cash"))?;
        let commission = self
            .current_holdings
            .commission
            .checked_add(fill.commission)
            .ok_or(PortfolioError::Overflow("commission"))?;
        let total = self
            .current_holdings
            .total
            .checked_sub(outflow)
            .ok_or(PortfolioError::Overflow("total"))?;
        let new_value = value
            .checked_add(signed_cost)
            .ok_or(PortfolioError::Overflow("market value"))?;

        // All checks passed, commit
        *position = new_position;
        *value = new_value;
        self.current_holdings.cash = cash;
        self.current_holdings.commission = commission;
        self.current_holdings.total = total;

        tracing::debug!(
            instrument = %fill.instrument,
            direction = %fill.direction,
            quantity = fill.quantity,
            position = new_position,
            cash = %cash,
            "Applied fill"
        );

        Ok(())
    }

    /// Snapshot positions and holdings marked at the latest close
    pub fn on_tick(&mut self, bars: &dyn BarSource) -> Result<(), PortfolioError> {
        let timestamp = bars.current_timestamp().ok_or(DataError::NotStarted)?;

        let mut market_values = BTreeMap::new();
        let mut total = self.current_holdings.cash;

        for instrument in &self.instruments {
            let position = self.current_positions.get(instrument).copied().unwrap_or(0);
            let value = match bars.latest_bar(instrument)? {
                Some(bar) => Decimal::from(position)
                    .checked_mul(bar.close)
                    .ok_or(PortfolioError::Overflow("market value"))?,
                None if position == 0 => Decimal::ZERO,
                None => {
                    return Err(PortfolioError::MissingPrice {
                        instrument: instrument.clone(),
                        position,
                        timestamp,
                    })
                }
            };
            total = total
                .checked_add(value)
                .ok_or(PortfolioError::Overflow("total"))?;
            market_values.insert(instrument.clone(), value);
        }

        self.all_positions.push(PositionSnapshot {
            timestamp,
            positions: self.current_positions.clone(),
        });
        self.all_holdings.push(HoldingsSnapshot {
            timestamp,
            market_values,
            cash: self.current_holdings.cash,
            commission: self.current_holdings.commission,
            total,
        });

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Bar;
    use crate::execution::OrderId;
    use chrono::TimeZone;
    use proptest::prelude::*;
    use std::collections::HashMap;

    /// Bar source with one fixed bar per instrument
    struct FixedBars {
        instruments: Vec<String>,
        bars: HashMap<String, Vec<Bar>>,
        timestamp: Option<DateTime<Utc>>,
    }

    impl FixedBars {
        fn new(closes: &[(&str, Decimal)]) -> Self {
            let timestamp = ts(2);
            let bars = closes
                .iter()
                .map(|(instrument, close)| {
                    let bar = Bar {
                        instrument: instrument.to_string(),
                        timestamp,
                        open: *close,
                        low: *close,
                        high: *close,
                        close: *close,
                        volume: dec!(1),
                    };
                    (instrument.to_string(), vec![bar])
                })
                .collect();
            Self {
                instruments: closes.iter().map(|(i, _)| i.to_string()).collect(),
                bars,
                timestamp: Some(timestamp),
            }
        }
    }

    impl BarSource for FixedBars {
        fn instruments(&self) -> &[String] {
            &self.instruments
        }

        fn latest_bars(&self, instrument: &str, n: usize) -> Result<&[Bar], DataError> {
            let bars = self
                .bars
                .get(instrument)
                .ok_or_else(|| DataError::UnknownInstrument(instrument.to_string()))?;
            if bars.len() < n {
                return Ok(&bars[..0]);
            }
            Ok(&bars[bars.len() - n..])
        }

        fn start_timestamp(&self) -> Option<DateTime<Utc>> {
            self.timestamp
        }

        fn current_timestamp(&self) -> Option<DateTime<Utc>> {
            self.timestamp
        }

        fn advance(&mut self) -> bool {
            false
        }
    }

    fn ts(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap()
    }

    fn instruments() -> Vec<String> {
        vec!["AAA".to_string(), "BBB".to_string()]
    }

    fn portfolio() -> Portfolio {
        Portfolio::new(&instruments(), ts(1), dec!(100000))
    }

    fn signal(instrument: &str, direction: SignalDirection, strength: Decimal) -> Signal {
        Signal::new(instrument, ts(2), direction, strength).unwrap()
    }

    fn fill(instrument: &str, direction: OrderDirection, quantity: u64, price: Decimal) -> Fill {
        Fill::new(
            OrderId::new_v4(),
            ts(2),
            instrument,
            "SIM",
            quantity,
            direction,
            price * Decimal::from(quantity),
            None,
        )
    }

    #[test]
    fn test_initial_snapshot() {
        let p = portfolio();
        assert_eq!(p.all_holdings().len(), 1);
        assert_eq!(p.all_positions().len(), 1);

        let first = &p.all_holdings()[0];
        assert_eq!(first.timestamp, ts(1));
        assert_eq!(first.total, dec!(100000));
        assert_eq!(first.cash, dec!(100000));
        assert_eq!(first.market_value("AAA"), dec!(0));
        assert_eq!(p.all_positions()[0].position("BBB"), 0);
    }

    #[test]
    fn test_long_from_flat_buys_floor_of_strength() {
        let p = portfolio();
        let order = p
            .on_signal(&signal("AAA", SignalDirection::Long, dec!(10)))
            .unwrap()
            .unwrap();
        assert_eq!(order.direction, OrderDirection::Buy);
        assert_eq!(order.quantity, 1000);

        let order = p
            .on_signal(&signal("AAA", SignalDirection::Long, dec!(2.567)))
            .unwrap()
            .unwrap();
        assert_eq!(order.quantity, 256);
    }

    #[test]
    fn test_short_from_flat_sells() {
        let p = portfolio();
        let order = p
            .on_signal(&signal("AAA", SignalDirection::Short, dec!(1)))
            .unwrap()
            .unwrap();
        assert_eq!(order.direction, OrderDirection::Sell);
        assert_eq!(order.quantity, 100);
    }

    #[test]
    fn test_no_duplicate_entry() {
        let mut p = portfolio();
        p.on_fill(&fill("AAA", OrderDirection::Buy, 100, dec!(10)))
            .unwrap();

        assert_eq!(
            p.on_signal(&signal("AAA", SignalDirection::Long, dec!(1)))
                .unwrap(),
            None
        );
        assert_eq!(
            p.on_signal(&signal("AAA", SignalDirection::Short, dec!(1)))
                .unwrap(),
            None
        );
    }

    #[test]
    fn test_exit_closes_opposite_side_only() {
        let mut p = portfolio();

        // Nothing to exit while flat
        assert_eq!(
            p.on_signal(&signal("AAA", SignalDirection::Exit, dec!(1)))
                .unwrap(),
            None
        );

        p.on_fill(&fill("AAA", OrderDirection::Buy, 100, dec!(10)))
            .unwrap();
        let exit_long = p
            .on_signal(&signal("AAA", SignalDirection::Exit, dec!(1)))
            .unwrap()
            .unwrap();
        assert_eq!(exit_long.direction, OrderDirection::Sell);

        p.on_fill(&fill("BBB", OrderDirection::Sell, 100, dec!(20)))
            .unwrap();
        let exit_short = p
            .on_signal(&signal("BBB", SignalDirection::Exit, dec!(1)))
            .unwrap()
            .unwrap();
        assert_eq!(exit_short.direction, OrderDirection::Buy);
    }

    #[test]
    fn test_zero_quantity_signal_skipped() {
        let p = portfolio();
        assert_eq!(
            p.on_signal(&signal("AAA", SignalDirection::Long, dec!(0.001)))
                .unwrap(),
            None
        );
    }

    #[test]
    fn test_unknown_instrument_surfaces() {
        let mut p = portfolio();
        assert_eq!(
            p.on_signal(&signal("ZZZ", SignalDirection::Long, dec!(1)))
                .unwrap_err(),
            PortfolioError::UnknownInstrument("ZZZ".to_string())
        );
        assert!(p
            .on_fill(&fill("ZZZ", OrderDirection::Buy, 1, dec!(1)))
            .is_err());
    }

    #[test]
    fn test_on_fill_updates_accounts() {
        let mut p = portfolio();
        p.on_fill(&fill("AAA", OrderDirection::Buy, 1000, dec!(10)))
            .unwrap();

        assert_eq!(p.position("AAA").unwrap(), 1000);
        let h = p.current_holdings();
        assert_eq!(h.cash, dec!(89995));
        assert_eq!(h.commission, dec!(5));
        assert_eq!(h.market_values["AAA"], dec!(10000));
        assert_eq!(h.total, dec!(89995));

        p.on_fill(&fill("AAA", OrderDirection::Sell, 400, dec!(12)))
            .unwrap();
        assert_eq!(p.position("AAA").unwrap(), 600);
        let h = p.current_holdings();
        assert_eq!(h.cash, dec!(89995) + dec!(4800) - dec!(5));
        assert_eq!(h.commission, dec!(10));
        assert_eq!(h.market_values["AAA"], dec!(5200));
    }

    #[test]
    fn test_on_tick_marks_to_latest_close() {
        let mut p = portfolio();
        p.on_fill(&fill("AAA", OrderDirection::Buy, 1000, dec!(10)))
            .unwrap();
        p.on_fill(&fill("BBB", OrderDirection::Sell, 100, dec!(20)))
            .unwrap();

        let bars = FixedBars::new(&[("AAA", dec!(12)), ("BBB", dec!(25))]);
        p.on_tick(&bars).unwrap();

        let snap = p.latest_holdings().unwrap();
        assert_eq!(snap.timestamp, ts(2));
        assert_eq!(snap.market_value("AAA"), dec!(12000));
        assert_eq!(snap.market_value("BBB"), dec!(-2500));
        // 100000 - 10000 - 5 + 2000 - 5
        assert_eq!(snap.cash, dec!(91990));
        assert_eq!(snap.total, dec!(91990) + dec!(12000) - dec!(2500));
        assert_eq!(p.all_positions().last().unwrap().position("BBB"), -100);
    }

    #[test]
    fn test_on_tick_requires_started_source() {
        let mut p = portfolio();
        let mut bars = FixedBars::new(&[("AAA", dec!(1)), ("BBB", dec!(1))]);
        bars.timestamp = None;
        assert_eq!(
            p.on_tick(&bars).unwrap_err(),
            PortfolioError::Data(DataError::NotStarted)
        );
    }

    #[test]
    fn test_on_tick_missing_price_for_open_position() {
        let mut p = portfolio();
        p.on_fill(&fill("BBB", OrderDirection::Buy, 10, dec!(20)))
            .unwrap();

        let mut bars = FixedBars::new(&[("AAA", dec!(1)), ("BBB", dec!(20))]);
        bars.bars.insert("BBB".to_string(), vec![]);
        assert!(matches!(
            p.on_tick(&bars).unwrap_err(),
            PortfolioError::MissingPrice { position: 10, .. }
        ));
    }

    #[test]
    fn test_flat_instrument_without_bar_counts_zero() {
        let mut p = portfolio();
        let mut bars = FixedBars::new(&[("AAA", dec!(1)), ("BBB", dec!(20))]);
        bars.bars.insert("BBB".to_string(), vec![]);
        p.on_tick(&bars).unwrap();
        assert_eq!(p.latest_holdings().unwrap().total, dec!(100000));
    }

    fn fill_strategy() -> impl Strategy<Value = (bool, bool, u64, u32)> {
        (any::<bool>(), any::<bool>(), 0u64..5_000, 1u32..50_000)
    }

    proptest! {
        #[test]
        fn prop_snapshot_total_matches_cash_plus_marked_positions(
            fills in prop::collection::vec(fill_strategy(), 0..40),
            close_a in 1u32..100_000,
            close_b in 1u32..100_000,
        ) {
            let mut p = portfolio();
            let mut expected_a = 0i64;
            let mut expected_b = 0i64;
            let mut last_commission = Decimal::ZERO;

            for (is_a, is_buy, quantity, price_cents) in fills {
                let instrument = if is_a { "AAA" } else { "BBB" };
                let direction = if is_buy { OrderDirection::Buy } else { OrderDirection::Sell };
                let price = Decimal::new(i64::from(price_cents), 2);
                p.on_fill(&fill(instrument, direction, quantity, price)).unwrap();

                let signed = direction.sign() * quantity as i64;
                if is_a { expected_a += signed } else { expected_b += signed }

                let commission = p.current_holdings().commission;
                prop_assert!(commission >= last_commission);
                last_commission = commission;
            }

            let a = Decimal::new(i64::from(close_a), 2);
            let b = Decimal::new(i64::from(close_b), 2);
            let bars = FixedBars::new(&[("AAA", a), ("BBB", b)]);
            p.on_tick(&bars).unwrap();

            prop_assert_eq!(p.position("AAA").unwrap(), expected_a);
            prop_assert_eq!(p.position("BBB").unwrap(), expected_b);

            let snap = p.latest_holdings().unwrap();
            let marked: Decimal = snap.market_values.values().copied().sum();
            prop_assert_eq!(snap.total, snap.cash + marked);
            prop_assert_eq!(
                snap.total,
                snap.cash + Decimal::from(expected_a) * a + Decimal::from(expected_b) * b
            );
        }
    }
}
