//! Market data module
//!
//! Bar replay for backtesting plus CSV and Parquet bar storage

mod align;
mod csv;
mod historic;
mod parquet;
mod types;

pub use align::{align_bars, AlignedBars, AlignedSeries};
pub use self::csv::{load_csv_bars, parse_timestamp};
pub use historic::HistoricBarSource;
pub use self::parquet::{load_parquet_bars, ParquetReader, ParquetWriter};
pub use types::{Bar, DataError};

use chrono::{DateTime, Utc};

/// Trait for bar source implementations
pub trait BarSource {
    /// Registered instruments, in registration order
    fn instruments(&self) -> &[String];

    /// The `n` most recent bars for `instrument`, oldest first.
    ///
    /// Empty when fewer than `n` bars have been released.
    fn latest_bars(&self, instrument: &str, n: usize) -> Result<&[Bar], DataError>;

    /// Timestamp of the first tick of the replay
    fn start_timestamp(&self) -> Option<DateTime<Utc>>;

    /// Timestamp of the most recent tick, `None` before the first advance
    fn current_timestamp(&self) -> Option<DateTime<Utc>>;

    /// Release the next tick; `false` once the timeline is exhausted
    fn advance(&mut self) -> bool;

    /// Most recent bar for `instrument`, if any has been released
    fn latest_bar(&self, instrument: &str) -> Result<Option<&Bar>, DataError> {
        Ok(self.latest_bars(instrument, 1)?.first())
    }
}

/// Sort a loaded series by time and clip it to `[start, end]`
pub(crate) fn prepare_series(
    mut bars: Vec<Bar>,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> Vec<Bar> {
    bars.retain(|b| {
        start.map_or(true, |s| b.timestamp >= s) && end.map_or(true, |e| b.timestamp <= e)
    });
    bars.sort_by_key(|b| b.timestamp);
    bars
}
