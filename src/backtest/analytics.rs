//! Backtest analytics and reporting
//!
//! Pure functions over finite sequences. Inputs and outputs are `f64`;
//! any non-finite value is reported as an error.

use crate::portfolio::{HoldingsSnapshot, PositionSnapshot};
use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Relative tolerance under which the return series counts as constant
const VARIANCE_TOLERANCE: f64 = 1e-12;

/// Analytics errors
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AnalyticsError {
    /// Not enough samples for the statistic
    #[error("Insufficient data for {0}")]
    InsufficientData(&'static str),
    /// Returns have zero standard deviation, Sharpe ratio undefined
    #[error("Return series has zero variance")]
    ZeroVariance,
    /// NaN or infinity in an input or intermediate value
    #[error("Non-finite value in {0}")]
    NonFinite(&'static str),
}

/// One equity curve sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub timestamp: DateTime<Utc>,
    /// Marked portfolio total
    pub total: Decimal,
    /// `total[i] / total[i-1] - 1`, `None` for the first sample
    pub returns: Option<f64>,
    /// Cumulative product of `1 + returns`, starting at 1.0
    pub equity: f64,
}

/// Normalised equity curve derived from holdings snapshots
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EquityCurve {
    points: Vec<EquityPoint>,
}

impl EquityCurve {
    /// Build the curve from the holdings history
    pub fn from_snapshots(history: &[HoldingsSnapshot]) -> Result<Self, AnalyticsError> {
        let mut points = Vec::with_capacity(history.len());
        let mut previous: Option<f64> = None;
        let mut equity = 1.0_f64;

        for snapshot in history {
            let total = snapshot
                .total
                .to_f64()
                .filter(|t| t.is_finite())
                .ok_or(AnalyticsError::NonFinite("holdings total"))?;

            let returns = match previous {
                Some(prev) => {
                    let r = total / prev - 1.0;
                    if !r.is_finite() {
                        return Err(AnalyticsError::NonFinite("returns"));
                    }
                    equity *= 1.0 + r;
                    Some(r)
                }
                None => None,
            };

            points.push(EquityPoint {
                timestamp: snapshot.timestamp,
                total: snapshot.total,
                returns,
                equity,
            });
            previous = Some(total);
        }

        Ok(Self { points })
    }

    pub fn points(&self) -> &[EquityPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Return series with the undefined first element excluded
    pub fn returns(&self) -> Vec<f64> {
        self.points.iter().filter_map(|p| p.returns).collect()
    }

    /// Equity values, one per sample
    pub fn equity(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.equity).collect()
    }

    /// Final equity less one, 0 for an empty curve
    pub fn total_return(&self) -> f64 {
        self.points.last().map_or(0.0, |p| p.equity - 1.0)
    }
}

/// Annualised Sharpe ratio with population statistics and a zero
/// risk-free rate.
///
/// `sqrt(periods_per_year) * mean(returns) / stddev(returns)`
pub fn sharpe_ratio(returns: &[f64], periods_per_year: u32) -> Result<f64, AnalyticsError> {
    if returns.is_empty() {
        return Err(AnalyticsError::InsufficientData("sharpe ratio"));
    }
    if returns.iter().any(|r| !r.is_finite()) {
        return Err(AnalyticsError::NonFinite("returns"));
    }

    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    let std_dev = variance.sqrt();

    if std_dev == 0.0 || std_dev <= mean.abs() * VARIANCE_TOLERANCE {
        return Err(AnalyticsError::ZeroVariance);
    }

    let sharpe = f64::from(periods_per_year).sqrt() * mean / std_dev;
    if !sharpe.is_finite() {
        return Err(AnalyticsError::NonFinite("sharpe ratio"));
    }
    Ok(sharpe)
}

/// Per-sample drawdown state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DrawdownPoint {
    /// Running high-water mark
    pub hwm: f64,
    /// `hwm - equity`
    pub drawdown: f64,
    /// Consecutive samples below the high-water mark
    pub duration: usize,
}

/// Worst drawdown over a curve
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Drawdown {
    pub max_drawdown: f64,
    pub max_duration: usize,
}

/// Drawdown and duration for every sample. The high-water mark starts at 0.
pub fn drawdown_series(equity: &[f64]) -> Result<Vec<DrawdownPoint>, AnalyticsError> {
    let mut series = Vec::with_capacity(equity.len());
    let mut hwm = 0.0_f64;
    let mut duration = 0usize;

    for &value in equity {
        if !value.is_finite() {
            return Err(AnalyticsError::NonFinite("equity curve"));
        }
        hwm = hwm.max(value);
        let drawdown = hwm - value;
        duration = if drawdown == 0.0 { 0 } else { duration + 1 };
        series.push(DrawdownPoint {
            hwm,
            drawdown,
            duration,
        });
    }

    Ok(series)
}

/// Maximum drawdown and maximum drawdown duration; zeros for an empty curve
pub fn max_drawdown(equity: &[f64]) -> Result<Drawdown, AnalyticsError> {
    let series = drawdown_series(equity)?;
    Ok(series.iter().fold(Drawdown::default(), |acc, p| Drawdown {
        max_drawdown: acc.max_drawdown.max(p.drawdown),
        max_duration: acc.max_duration.max(p.duration),
    }))
}

/// Summary statistics from backtest
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BacktestSummary {
    /// Total return in percent
    pub total_return_pct: f64,
    /// `None` when undefined (zero variance or no returns)
    pub sharpe_ratio: Option<f64>,
    /// Maximum drawdown in equity-curve units (initial equity 1.0), x100
    pub max_drawdown_pct: f64,
    /// Longest run of samples below the high-water mark
    pub drawdown_duration: usize,
    /// Ticks processed
    pub ticks: usize,
    /// Fills applied
    pub fills: usize,
    /// Cumulative commission
    pub total_commission: Decimal,
}

impl BacktestSummary {
    /// Compute the summary from an equity curve
    pub fn compute(
        curve: &EquityCurve,
        periods_per_year: u32,
        ticks: usize,
        fills: usize,
        total_commission: Decimal,
    ) -> Result<Self, AnalyticsError> {
        let sharpe_ratio = match sharpe_ratio(&curve.returns(), periods_per_year) {
            Ok(sharpe) => Some(sharpe),
            Err(e @ (AnalyticsError::ZeroVariance | AnalyticsError::InsufficientData(_))) => {
                tracing::warn!(reason = %e, "Sharpe ratio undefined");
                None
            }
            Err(e) => return Err(e),
        };
        let drawdown = max_drawdown(&curve.equity())?;

        Ok(Self {
            total_return_pct: curve.total_return() * 100.0,
            sharpe_ratio,
            max_drawdown_pct: drawdown.max_drawdown * 100.0,
            drawdown_duration: drawdown.max_duration,
            ticks,
            fills,
            total_commission,
        })
    }

    /// Format as table for CLI output
    pub fn format_table(&self) -> String {
        let sharpe = self
            .sharpe_ratio
            .map_or_else(|| "undefined".to_string(), |s| format!("{:.4}", s));

        format!(
            r#"
══════════════════════════════════════════════════════
               BACKTEST RESULTS
══════════════════════════════════════════════════════

PERFORMANCE
───────────────────────────────────────────────────────
Total Return:     {:+.2}%
Sharpe Ratio:     {}
Max Drawdown:     {:.2}%
Drawdown Length:  {}

ACTIVITY
───────────────────────────────────────────────────────
Ticks:            {}
Fills:            {}
Commission:       {:.2}
══════════════════════════════════════════════════════
"#,
            self.total_return_pct,
            sharpe,
            self.max_drawdown_pct,
            self.drawdown_duration,
            self.ticks,
            self.fills,
            self.total_commission,
        )
    }
}

/// Complete backtest results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    /// Summary statistics
    pub summary: BacktestSummary,
    /// Position history
    pub positions: Vec<PositionSnapshot>,
    /// Holdings history
    pub holdings: Vec<HoldingsSnapshot>,
    pub equity_curve: EquityCurve,
}
