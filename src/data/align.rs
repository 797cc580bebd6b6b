//! Multi-instrument time alignment
//!
//! Builds the combined timeline (union of every instrument's timestamps)
//! and pad-fills each instrument onto it.

use super::{Bar, DataError};
use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, HashMap};

/// One instrument's bars on the combined timeline
#[derive(Debug, Clone)]
pub struct AlignedSeries {
    /// Timeline index of the instrument's first observation
    pub offset: usize,
    /// Bars from `offset` to the end of the timeline, gaps pad-filled
    pub bars: Vec<Bar>,
}

/// Bars for several instruments on a common timeline
#[derive(Debug, Clone)]
pub struct AlignedBars {
    /// Sorted union of all timestamps
    pub timeline: Vec<DateTime<Utc>>,
    /// Aligned bars per instrument
    pub series: HashMap<String, AlignedSeries>,
}

/// Align per-instrument bar series onto their combined timeline.
///
/// Every series must be strictly increasing in time and tagged with its
/// own instrument. Instruments listed in `instruments` without any bars
/// are rejected.
pub fn align_bars(
    instruments: &[String],
    mut bars: HashMap<String, Vec<Bar>>,
) -> Result<AlignedBars, DataError> {
    if instruments.is_empty() {
        return Err(DataError::EmptyUniverse);
    }

    let mut all_timestamps = BTreeSet::new();
    for instrument in instruments {
        let series = bars
            .get(instrument)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| DataError::NoData(instrument.clone()))?;

        if let Some(bar) = series.iter().find(|b| b.instrument != *instrument) {
            return Err(DataError::MismatchedInstrument {
                expected: instrument.clone(),
                found: bar.instrument.clone(),
                timestamp: bar.timestamp,
            });
        }
        for pair in series.windows(2) {
            if pair[1].timestamp <= pair[0].timestamp {
                return Err(DataError::UnorderedSeries {
                    instrument: instrument.clone(),
                    timestamp: pair[1].timestamp,
                });
            }
        }
        all_timestamps.extend(series.iter().map(|b| b.timestamp));
    }
    let timeline: Vec<DateTime<Utc>> = all_timestamps.into_iter().collect();

    let mut series = HashMap::with_capacity(instruments.len());
    for instrument in instruments {
        let raw = bars.remove(instrument).unwrap_or_default();
        let first = raw
            .first()
            .map(|b| b.timestamp)
            .ok_or_else(|| DataError::NoData(instrument.clone()))?;
        let offset = timeline.partition_point(|ts| *ts < first);

        let mut aligned = Vec::with_capacity(timeline.len() - offset);
        let mut source = raw.into_iter().peekable();
        for ts in &timeline[offset..] {
            match source.peek() {
                Some(bar) if bar.timestamp == *ts => {
                    if let Some(bar) = source.next() {
                        aligned.push(bar);
                    }
                }
                _ => {
                    // offset guarantees a prior bar exists
                    if let Some(prev) = aligned.last() {
                        let padded = prev.padded_to(*ts);
                        aligned.push(padded);
                    }
                }
            }
        }

        series.insert(instrument.clone(), AlignedSeries { offset, bars: aligned });
    }

    Ok(AlignedBars { timeline, series })
}
