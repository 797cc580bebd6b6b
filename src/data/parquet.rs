//! Parquet bar storage and backtest output writer

use super::{prepare_series, Bar};
use crate::backtest::EquityPoint;
use crate::portfolio::HoldingsSnapshot;
use arrow::array::{Array, ArrayRef, Float64Array, StringArray, TimestampMicrosecondArray};
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;
use chrono::{DateTime, Utc};
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

fn timestamp_field() -> Field {
    Field::new(
        "timestamp",
        DataType::Timestamp(TimeUnit::Microsecond, Some("UTC".into())),
        false,
    )
}

/// Bar schema fields
pub fn bar_schema() -> Schema {
    Schema::new(vec![
        timestamp_field(),
        Field::new("instrument", DataType::Utf8, false),
        Field::new("open", DataType::Utf8, false), // Store as string for Decimal precision
        Field::new("low", DataType::Utf8, false),
        Field::new("high", DataType::Utf8, false),
        Field::new("close", DataType::Utf8, false),
        Field::new("volume", DataType::Utf8, false),
    ])
}

/// Equity curve schema fields
pub fn equity_schema() -> Schema {
    Schema::new(vec![
        timestamp_field(),
        Field::new("total", DataType::Utf8, false),
        Field::new("returns", DataType::Float64, true),
        Field::new("equity_curve", DataType::Float64, false),
    ])
}

/// Holdings schema: fixed columns followed by one market value column per instrument
pub fn holdings_schema(instruments: &[String]) -> Schema {
    let mut fields = vec![
        timestamp_field(),
        Field::new("cash", DataType::Utf8, false),
        Field::new("commission", DataType::Utf8, false),
        Field::new("total", DataType::Utf8, false),
    ];
    for instrument in instruments {
        fields.push(Field::new(instrument.as_str(), DataType::Utf8, false));
    }
    Schema::new(fields)
}

fn timestamps(values: impl Iterator<Item = DateTime<Utc>>) -> ArrayRef {
    let micros: Vec<i64> = values.map(|ts| ts.timestamp_micros()).collect();
    Arc::new(TimestampMicrosecondArray::from(micros).with_timezone("UTC"))
}

fn decimals(values: impl Iterator<Item = Decimal>) -> ArrayRef {
    let strings: Vec<String> = values.map(|d| d.to_string()).collect();
    Arc::new(StringArray::from(
        strings.iter().map(|s| s.as_str()).collect::<Vec<_>>(),
    ))
}

/// Writes bars and backtest output to Parquet files
pub struct ParquetWriter {
    output_dir: PathBuf,
}

impl ParquetWriter {
    /// Create a new Parquet writer
    pub fn new(output_dir: PathBuf) -> Self {
        Self { output_dir }
    }

    /// Ensure output directory exists
    pub fn ensure_dir(&self) -> anyhow::Result<()> {
        fs::create_dir_all(&self.output_dir)?;
        Ok(())
    }

    /// File path for a named output
    pub fn file_path(&self, name: &str) -> PathBuf {
        self.output_dir.join(format!("{}.parquet", name))
    }

    fn write_batch(
        &self,
        path: &Path,
        schema: Arc<Schema>,
        columns: Vec<ArrayRef>,
    ) -> anyhow::Result<()> {
        self.ensure_dir()?;

        let file = File::create(path)?;
        let props = WriterProperties::builder()
            .set_compression(Compression::SNAPPY)
            .build();

        let mut writer = ArrowWriter::try_new(file, schema.clone(), Some(props))?;
        let batch = RecordBatch::try_new(schema, columns)?;
        writer.write(&batch)?;
        writer.close()?;
        Ok(())
    }

    /// Write bars to a Parquet file
    pub fn write_bars(&self, path: &Path, bars: &[Bar]) -> anyhow::Result<()> {
        if bars.is_empty() {
            return Ok(());
        }

        let instruments: Vec<&str> = bars.iter().map(|b| b.instrument.as_str()).collect();
        let columns = vec![
            timestamps(bars.iter().map(|b| b.timestamp)),
            Arc::new(StringArray::from(instruments)) as ArrayRef,
            decimals(bars.iter().map(|b| b.open)),
            decimals(bars.iter().map(|b| b.low)),
            decimals(bars.iter().map(|b| b.high)),
            decimals(bars.iter().map(|b| b.close)),
            decimals(bars.iter().map(|b| b.volume)),
        ];
        self.write_batch(path, Arc::new(bar_schema()), columns)?;

        tracing::debug!(path = ?path, count = bars.len(), "Wrote bars to Parquet");
        Ok(())
    }

    /// Write the equity curve to a Parquet file
    pub fn write_equity_curve(&self, path: &Path, curve: &[EquityPoint]) -> anyhow::Result<()> {
        if curve.is_empty() {
            return Ok(());
        }

        let returns: Vec<Option<f64>> = curve.iter().map(|p| p.returns).collect();
        let equity: Vec<f64> = curve.iter().map(|p| p.equity).collect();
        let columns = vec![
            timestamps(curve.iter().map(|p| p.timestamp)),
            decimals(curve.iter().map(|p| p.total)),
            Arc::new(Float64Array::from(returns)) as ArrayRef,
            Arc::new(Float64Array::from(equity)) as ArrayRef,
        ];
        self.write_batch(path, Arc::new(equity_schema()), columns)?;

        tracing::debug!(path = ?path, count = curve.len(), "Wrote equity curve to Parquet");
        Ok(())
    }

    /// Write the holdings history to a Parquet file
    pub fn write_holdings(
        &self,
        path: &Path,
        instruments: &[String],
        history: &[HoldingsSnapshot],
    ) -> anyhow::Result<()> {
        if history.is_empty() {
            return Ok(());
        }

        let mut columns = vec![
            timestamps(history.iter().map(|h| h.timestamp)),
            decimals(history.iter().map(|h| h.cash)),
            decimals(history.iter().map(|h| h.commission)),
            decimals(history.iter().map(|h| h.total)),
        ];
        for instrument in instruments {
            columns.push(decimals(history.iter().map(|h| h.market_value(instrument))));
        }
        self.write_batch(path, Arc::new(holdings_schema(instruments)), columns)?;

        tracing::debug!(path = ?path, count = history.len(), "Wrote holdings to Parquet");
        Ok(())
    }
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> anyhow::Result<&'a StringArray> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<StringArray>())
        .ok_or_else(|| anyhow::anyhow!("Invalid {} column", name))
}

/// Reader for Parquet bar files
pub struct ParquetReader {
    path: PathBuf,
}

impl ParquetReader {
    /// Create a new reader for a Parquet file
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Read bars from a Parquet file written by [`ParquetWriter::write_bars`]
    pub fn read_bars(&self) -> anyhow::Result<Vec<Bar>> {
        use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

        let file = File::open(&self.path)?;
        let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
        let reader = builder.build()?;

        let mut bars = Vec::new();

        for batch_result in reader {
            let batch = batch_result?;

            let timestamps = batch
                .column_by_name("timestamp")
                .and_then(|c| c.as_any().downcast_ref::<TimestampMicrosecondArray>())
                .ok_or_else(|| anyhow::anyhow!("Invalid timestamp column"))?;

            let instruments = string_column(&batch, "instrument")?;
            let open = string_column(&batch, "open")?;
            let low = string_column(&batch, "low")?;
            let high = string_column(&batch, "high")?;
            let close = string_column(&batch, "close")?;
            let volume = string_column(&batch, "volume")?;

            for i in 0..batch.num_rows() {
                if timestamps.is_null(i) {
                    return Err(anyhow::anyhow!("Null timestamp at row {}", i));
                }
                let timestamp = DateTime::from_timestamp_micros(timestamps.value(i))
                    .ok_or_else(|| anyhow::anyhow!("Invalid timestamp"))?;

                bars.push(Bar {
                    instrument: instruments.value(i).to_string(),
                    timestamp,
                    open: Decimal::from_str(open.value(i))?,
                    low: Decimal::from_str(low.value(i))?,
                    high: Decimal::from_str(high.value(i))?,
                    close: Decimal::from_str(close.value(i))?,
                    volume: Decimal::from_str(volume.value(i))?,
                });
            }
        }

        Ok(bars)
    }

    /// Get the file path
    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

/// Load `<dir>/<INSTRUMENT>.parquet` for every instrument, clipped to `[start, end]`
pub fn load_parquet_bars(
    dir: &Path,
    instruments: &[String],
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> anyhow::Result<HashMap<String, Vec<Bar>>> {
    let mut out = HashMap::with_capacity(instruments.len());
    for instrument in instruments {
        let reader = ParquetReader::new(dir.join(format!("{}.parquet", instrument)));
        let bars: Vec<Bar> = reader
            .read_bars()?
            .into_iter()
            .filter(|b| &b.instrument == instrument)
            .collect();
        tracing::debug!(
            path = ?reader.path(),
            instrument = %instrument,
            count = bars.len(),
            "Read Parquet bars"
        );
        out.insert(instrument.clone(), prepare_series(bars, start, end));
    }
    Ok(out)
}
