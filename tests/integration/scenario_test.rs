//! End-to-end scheduler scenarios

use crate::common::{bar, day, series, source};
use event_backtest::backtest::{
    AnalyticsError, BacktestConfig, BacktestSimulator, SimulatorState, SnapshotTiming,
    TickOutcome,
};
use event_backtest::data::BarSource;
use event_backtest::execution::SimulatedExecution;
use event_backtest::strategy::BuyAndHold;
use rust_decimal_macros::dec;

#[test]
fn test_two_instrument_buy_and_hold() {
    let bars = source(vec![
        ("A", series("A", &[dec!(10), dec!(11), dec!(12)])),
        ("B", series("B", &[dec!(20), dec!(19), dec!(21)])),
    ]);
    let strategy = BuyAndHold::new(bars.instruments(), dec!(10));
    let mut sim = BacktestSimulator::new(
        bars,
        strategy,
        SimulatedExecution::default(),
        BacktestConfig::default(),
    )
    .unwrap();

    let result = sim.run().unwrap();
    let portfolio = sim.portfolio();

    assert_eq!(portfolio.position("A").unwrap(), 1000);
    assert_eq!(portfolio.position("B").unwrap(), 1000);

    let fills_cost = dec!(1000) * dec!(10) + dec!(1000) * dec!(20);
    let commissions = dec!(10);
    let last = result.holdings.last().unwrap();
    assert_eq!(last.timestamp, day(2));
    assert_eq!(
        last.total,
        dec!(100000) - fills_cost - commissions + (dec!(1000) * dec!(12) + dec!(1000) * dec!(21))
    );
    assert_eq!(result.summary.total_commission, commissions);
    assert_eq!(result.summary.fills, 2);

    // total == cash + marked positions at every snapshot
    for snapshot in &result.holdings {
        let marked: rust_decimal::Decimal = snapshot.market_values.values().copied().sum();
        assert_eq!(snapshot.total, snapshot.cash + marked);
    }

    // Commission and equity curve length never shrink
    let commissions: Vec<_> = result.holdings.iter().map(|h| h.commission).collect();
    assert!(commissions.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(result.equity_curve.len(), result.holdings.len());
}

#[test]
fn test_scheduler_terminates_after_last_tick() {
    let bars = source(vec![("A", series("A", &[dec!(10), dec!(11)]))]);
    let strategy = BuyAndHold::new(bars.instruments(), dec!(1));
    let mut sim = BacktestSimulator::new(
        bars,
        strategy,
        SimulatedExecution::default(),
        BacktestConfig::default(),
    )
    .unwrap();

    assert_eq!(sim.step().unwrap(), TickOutcome::Continued);
    assert_eq!(sim.step().unwrap(), TickOutcome::Continued);
    assert_eq!(sim.state(), SimulatorState::Running);
    // Second tick fully drained before termination
    assert_eq!(sim.portfolio().all_holdings().len(), 3);
    assert_eq!(sim.portfolio().position("A").unwrap(), 100);

    assert_eq!(sim.step().unwrap(), TickOutcome::Terminated);
    assert_eq!(sim.state(), SimulatorState::Terminated);
    assert_eq!(sim.ticks(), 2);
}

#[test]
fn test_late_starting_instrument_bought_on_first_bar() {
    let bars = source(vec![
        ("A", series("A", &[dec!(10), dec!(11), dec!(12)])),
        ("B", vec![bar("B", day(2), dec!(30))]),
    ]);
    let strategy = BuyAndHold::new(bars.instruments(), dec!(1));
    let mut sim = BacktestSimulator::new(
        bars,
        strategy,
        SimulatedExecution::default(),
        BacktestConfig {
            snapshot: SnapshotTiming::EndOfTick,
            ..Default::default()
        },
    )
    .unwrap();

    sim.step().unwrap();
    sim.step().unwrap();
    assert_eq!(sim.portfolio().position("B").unwrap(), 0);

    sim.step().unwrap();
    assert_eq!(sim.portfolio().position("B").unwrap(), 100);
    let last = sim.portfolio().latest_holdings().unwrap();
    assert_eq!(last.market_value("B"), dec!(3000));
}

#[test]
fn test_gap_is_pad_filled() {
    // B has no bar on day 1; its day 0 close carries forward
    let bars = source(vec![
        ("A", series("A", &[dec!(10), dec!(11), dec!(12)])),
        (
            "B",
            vec![bar("B", day(0), dec!(20)), bar("B", day(2), dec!(22))],
        ),
    ]);
    let strategy = BuyAndHold::new(bars.instruments(), dec!(1));
    let mut sim = BacktestSimulator::new(
        bars,
        strategy,
        SimulatedExecution::default(),
        BacktestConfig {
            snapshot: SnapshotTiming::EndOfTick,
            ..Default::default()
        },
    )
    .unwrap();

    sim.step().unwrap();
    sim.step().unwrap();
    let latest = sim.bars().latest_bar("B").unwrap().unwrap();
    assert_eq!(latest.timestamp, day(1));
    assert_eq!(latest.close, dec!(20));
    assert_eq!(
        sim.portfolio().latest_holdings().unwrap().market_value("B"),
        dec!(2000)
    );
}

#[test]
fn test_flat_prices_after_entry_have_zero_variance() {
    let bars = source(vec![("A", series("A", &[dec!(10); 5]))]);
    let strategy = BuyAndHold::new(bars.instruments(), dec!(1));
    let mut sim = BacktestSimulator::new(
        bars,
        strategy,
        SimulatedExecution::default(),
        BacktestConfig {
            snapshot: SnapshotTiming::EndOfTick,
            ..Default::default()
        },
    )
    .unwrap();

    let result = sim.run().unwrap();
    // Only the first tick moves equity (commission); later returns are all 0
    let returns = result.equity_curve.returns();
    assert_eq!(
        event_backtest::backtest::sharpe_ratio(&returns[1..], 252),
        Err(AnalyticsError::ZeroVariance)
    );
    assert!(result.summary.sharpe_ratio.is_some());
    assert_eq!(result.summary.drawdown_duration, 5);
}
