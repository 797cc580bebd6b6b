//! Cursor-based replay over pre-aligned historical bars

use super::{align_bars, AlignedSeries, Bar, BarSource, DataError};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Replays aligned bars one tick at a time.
///
/// The replay buffer for an instrument is `bars[..cursor - offset]`;
/// advancing only moves the shared cursor.
#[derive(Debug, Clone)]
pub struct HistoricBarSource {
    instruments: Vec<String>,
    timeline: Vec<DateTime<Utc>>,
    series: HashMap<String, AlignedSeries>,
    /// Number of ticks released so far
    cursor: usize,
}

impl HistoricBarSource {
    /// Create a source for `instruments` from raw per-instrument bars
    pub fn new(
        instruments: Vec<String>,
        bars: HashMap<String, Vec<Bar>>,
    ) -> Result<Self, DataError> {
        let mut unique: Vec<String> = Vec::with_capacity(instruments.len());
        for instrument in instruments {
            if !unique.contains(&instrument) {
                unique.push(instrument);
            }
        }

        let aligned = align_bars(&unique, bars)?;

        tracing::info!(
            instruments = unique.len(),
            ticks = aligned.timeline.len(),
            "Aligned historical bars"
        );

        Ok(Self {
            instruments: unique,
            timeline: aligned.timeline,
            series: aligned.series,
            cursor: 0,
        })
    }

    /// Total number of ticks in the combined timeline
    pub fn len(&self) -> usize {
        self.timeline.len()
    }

    /// Whether the combined timeline is empty
    pub fn is_empty(&self) -> bool {
        self.timeline.is_empty()
    }

    /// Number of ticks released so far
    pub fn ticks_released(&self) -> usize {
        self.cursor
    }

    fn visible(&self, instrument: &str) -> Result<&[Bar], DataError> {
        let series = self
            .series
            .get(instrument)
            .ok_or_else(|| DataError::UnknownInstrument(instrument.to_string()))?;
        let count = self.cursor.saturating_sub(series.offset);
        Ok(&series.bars[..count])
    }
}

impl BarSource for HistoricBarSource {
    fn instruments(&self) -> &[String] {
        &self.instruments
    }

    fn latest_bars(&self, instrument: &str, n: usize) -> Result<&[Bar], DataError> {
        let visible = self.visible(instrument)?;
        if visible.len() < n {
            return Ok(&visible[..0]);
        }
        Ok(&visible[visible.len() - n..])
    }

    fn start_timestamp(&self) -> Option<DateTime<Utc>> {
        self.timeline.first().copied()
    }

    fn current_timestamp(&self) -> Option<DateTime<Utc>> {
        self.cursor
            .checked_sub(1)
            .and_then(|i| self.timeline.get(i))
            .copied()
    }

    fn advance(&mut self) -> bool {
        if self.cursor >= self.timeline.len() {
            return false;
        }
        self.cursor += 1;
        true
    }
}
