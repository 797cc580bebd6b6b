//! CSV bar loading, one file per instrument

use super::{prepare_series, Bar};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

const COLUMNS: [&str; 6] = ["timestamp", "open", "low", "high", "close", "volume"];

/// Parse a bar timestamp.
///
/// Accepts RFC 3339, `%Y-%m-%d %H:%M:%S` (UTC) and `%Y-%m-%d` (midnight UTC).
pub fn parse_timestamp(raw: &str) -> anyhow::Result<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    if let Ok(ts) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Ok(ts.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        if let Some(ts) = date.and_hms_opt(0, 0, 0) {
            return Ok(ts.and_utc());
        }
    }
    Err(anyhow::anyhow!("Unrecognised timestamp: {}", raw))
}

/// Read bars for one instrument from a CSV file with a header row
pub fn read_csv_file(path: &Path, instrument: &str) -> anyhow::Result<Vec<Bar>> {
    let mut reader = ::csv::ReaderBuilder::new()
        .trim(::csv::Trim::All)
        .from_path(path)?;

    let headers = reader.headers()?.clone();
    let mut index = [0usize; 6];
    for (slot, column) in index.iter_mut().zip(COLUMNS) {
        *slot = headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(column))
            .ok_or_else(|| anyhow::anyhow!("{:?}: missing column '{}'", path, column))?;
    }

    let mut bars = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record?;
        let field = |i: usize| -> anyhow::Result<&str> {
            record
                .get(index[i])
                .ok_or_else(|| anyhow::anyhow!("{:?}: short row {}", path, line + 2))
        };
        let number = |i: usize| -> anyhow::Result<Decimal> {
            let raw = field(i)?;
            Decimal::from_str(raw).map_err(|e| {
                anyhow::anyhow!("{:?} row {}: bad {} '{}': {}", path, line + 2, COLUMNS[i], raw, e)
            })
        };

        bars.push(Bar {
            instrument: instrument.to_string(),
            timestamp: parse_timestamp(field(0)?)?,
            open: number(1)?,
            low: number(2)?,
            high: number(3)?,
            close: number(4)?,
            volume: number(5)?,
        });
    }

    tracing::debug!(path = ?path, instrument, count = bars.len(), "Read CSV bars");
    Ok(bars)
}

/// Load `<dir>/<INSTRUMENT>.csv` for every instrument, clipped to `[start, end]`
pub fn load_csv_bars(
    dir: &Path,
    instruments: &[String],
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> anyhow::Result<HashMap<String, Vec<Bar>>> {
    let mut out = HashMap::with_capacity(instruments.len());
    for instrument in instruments {
        let path = dir.join(format!("{}.csv", instrument));
        let bars = read_csv_file(&path, instrument)?;
        out.insert(instrument.clone(), prepare_series(bars, start, end));
    }
    Ok(out)
}
