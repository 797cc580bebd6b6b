//! Backtest simulator engine

use super::{
    BacktestConfig, BacktestError, BacktestResult, BacktestSummary, EquityCurve, SnapshotTiming,
};
use crate::data::BarSource;
use crate::event::{Event, EventQueue};
use crate::execution::{ExecutionHandler, Order};
use crate::portfolio::Portfolio;
use crate::signal::{Signal, SignalError};
use crate::strategy::Strategy;
use crate::telemetry;

/// Scheduler state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulatorState {
    Running,
    /// Bar source exhausted
    Terminated,
    /// A handler failed mid-tick
    Aborted,
}

/// Result of a single tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// A tick was released and fully drained
    Continued,
    /// The bar source is exhausted
    Terminated,
}

/// Runs backtest simulation.
///
/// Each tick advances the bar source, enqueues one Market event and drains
/// the queue to exhaustion in FIFO order before returning.
pub struct BacktestSimulator<B, S, E> {
    bars: B,
    strategy: S,
    execution: E,
    portfolio: Portfolio,
    queue: EventQueue,
    config: BacktestConfig,
    state: SimulatorState,
    ticks: usize,
    fills: usize,
}

impl<B, S, E> BacktestSimulator<B, S, E>
where
    B: BarSource,
    S: Strategy,
    E: ExecutionHandler,
{
    /// Create a new simulator
    pub fn new(
        bars: B,
        strategy: S,
        execution: E,
        config: BacktestConfig,
    ) -> Result<Self, BacktestError> {
        let start = config
            .start
            .or_else(|| bars.start_timestamp())
            .ok_or(BacktestError::EmptySource)?;
        let portfolio = Portfolio::new(bars.instruments(), start, config.initial_capital);

        Ok(Self {
            bars,
            strategy,
            execution,
            portfolio,
            queue: EventQueue::new(),
            config,
            state: SimulatorState::Running,
            ticks: 0,
            fills: 0,
        })
    }

    pub fn state(&self) -> SimulatorState {
        self.state
    }

    pub fn portfolio(&self) -> &Portfolio {
        &self.portfolio
    }

    pub fn bars(&self) -> &B {
        &self.bars
    }

    pub fn config(&self) -> &BacktestConfig {
        &self.config
    }

    /// Ticks fully processed so far
    pub fn ticks(&self) -> usize {
        self.ticks
    }

    /// Fills applied so far
    pub fn fills(&self) -> usize {
        self.fills
    }

    /// Run one tick
    pub fn step(&mut self) -> Result<TickOutcome, BacktestError> {
        match self.state {
            SimulatorState::Running => {}
            SimulatorState::Terminated => return Ok(TickOutcome::Terminated),
            SimulatorState::Aborted => return Err(BacktestError::Aborted),
        }

        if !self.bars.advance() {
            self.state = SimulatorState::Terminated;
            tracing::debug!(ticks = self.ticks, "Bar source exhausted");
            return Ok(TickOutcome::Terminated);
        }

        self.queue.push(Event::Market);
        if let Err(e) = self.drain() {
            self.state = SimulatorState::Aborted;
            self.queue.clear();
            tracing::error!(
                error = %e,
                tick = self.ticks + 1,
                timestamp = ?self.bars.current_timestamp(),
                "Backtest aborted"
            );
            return Err(e);
        }

        self.ticks += 1;
        telemetry::record_tick(self.portfolio.latest_holdings());
        Ok(TickOutcome::Continued)
    }

    /// Run until the bar source is exhausted
    pub fn run(&mut self) -> Result<BacktestResult, BacktestError> {
        tracing::info!(
            instruments = self.bars.instruments().len(),
            initial_capital = %self.config.initial_capital,
            snapshot = ?self.config.snapshot,
            "Starting backtest"
        );

        while self.step()? == TickOutcome::Continued {}

        let result = self.result()?;
        tracing::info!(
            ticks = result.summary.ticks,
            fills = result.summary.fills,
            total_return_pct = result.summary.total_return_pct,
            sharpe_ratio = ?result.summary.sharpe_ratio,
            max_drawdown_pct = result.summary.max_drawdown_pct,
            "Backtest complete"
        );
        Ok(result)
    }

    /// Results for the ticks processed so far
    pub fn result(&self) -> Result<BacktestResult, BacktestError> {
        let equity_curve = EquityCurve::from_snapshots(self.portfolio.all_holdings())?;
        let summary = BacktestSummary::compute(
            &equity_curve,
            self.config.periods_per_year,
            self.ticks,
            self.fills,
            self.portfolio.current_holdings().commission,
        )?;

        Ok(BacktestResult {
            summary,
            positions: self.portfolio.all_positions().to_vec(),
            holdings: self.portfolio.all_holdings().to_vec(),
            equity_curve,
        })
    }

    fn drain(&mut self) -> Result<(), BacktestError> {
        while let Some(event) = self.queue.poll() {
            telemetry::record_event(event.kind());

            match event {
                Event::Market => {
                    let signals = self.strategy.on_market(&self.bars)?;
                    for signal in signals {
                        self.validate_signal(&signal)?;
                        self.queue.push(Event::Signal(signal));
                    }
                    if self.config.snapshot == SnapshotTiming::OnMarket {
                        self.portfolio.on_tick(&self.bars)?;
                    }
                }
                Event::Signal(signal) => {
                    if let Some(order) = self.portfolio.on_signal(&signal)? {
                        tracing::debug!(
                            order_id = %order.id,
                            instrument = %order.instrument,
                            direction = %order.direction,
                            quantity = order.quantity,
                            "Order generated"
                        );
                        self.queue.push(Event::Order(order));
                    }
                }
                Event::Order(order) => {
                    let fills = self.execution.execute(&order, &self.bars)?;
                    check_fill_quantity(&order, fills.iter().map(|f| f.quantity))?;
                    self.queue.extend(fills.into_iter().map(Event::Fill));
                }
                Event::Fill(fill) => {
                    self.portfolio.on_fill(&fill)?;
                    self.fills += 1;
                    telemetry::record_fill(&fill);
                }
            }
        }

        if self.config.snapshot == SnapshotTiming::EndOfTick {
            self.portfolio.on_tick(&self.bars)?;
        }
        Ok(())
    }

    fn validate_signal(&self, signal: &Signal) -> Result<(), SignalError> {
        signal.validate()?;
        if !self.bars.instruments().contains(&signal.instrument) {
            return Err(SignalError::UnregisteredInstrument(
                signal.instrument.clone(),
            ));
        }
        Ok(())
    }
}

fn check_fill_quantity(
    order: &Order,
    quantities: impl Iterator<Item = u64>,
) -> Result<(), BacktestError> {
    let filled = quantities.fold(0u64, |acc, q| acc.saturating_add(q));
    if filled > order.quantity {
        return Err(BacktestError::Overfilled {
            order_id: order.id,
            ordered: order.quantity,
            filled,
        });
    }
    Ok(())
}
