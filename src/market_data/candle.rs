use anyhow::{Context, Result};
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Data types
// ---------------------------------------------------------------------------

/// A single OHLCV bar.  Sequences of candles are always oldest-first and are
/// treated as uniformly sampled: indicator windows count bars, not time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    #[serde(default)]
    pub open_time: i64,
    #[serde(default)]
    pub close_time: i64,
    #[serde(default)]
    pub open: f64,
    #[serde(default)]
    pub high: f64,
    #[serde(default)]
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    #[serde(default)]
    pub quote_volume: f64,
    #[serde(default)]
    pub trades_count: u64,
}

impl Candle {
    /// Parse one row of the exchange REST kline format:
    ///
    /// ```json
    /// [1700000000000, "37000.00", "37050.00", "36990.00", "37020.00",
    ///  "123.456", 1700000059999, "4567890.12", 1500, "60.1", "2224455.6", "0"]
    /// ```
    ///
    /// Only the first nine columns are read; trailing columns are ignored.
    pub fn from_kline_row(row: &serde_json::Value) -> Result<Self> {
        let cols = row.as_array().context("kline row is not a JSON array")?;
        if cols.len() < 9 {
            anyhow::bail!("kline row has {} columns, expected at least 9", cols.len());
        }

        Ok(Self {
            open_time: parse_i64(&cols[0], "open_time")?,
            open: parse_string_f64(&cols[1], "open")?,
            high: parse_string_f64(&cols[2], "high")?,
            low: parse_string_f64(&cols[3], "low")?,
            close: parse_string_f64(&cols[4], "close")?,
            volume: parse_string_f64(&cols[5], "volume")?,
            close_time: parse_i64(&cols[6], "close_time")?,
            quote_volume: parse_string_f64(&cols[7], "quote_volume")?,
            trades_count: cols[8].as_u64().context("missing field trades_count")?,
        })
    }

    /// Open time as a UTC timestamp, if `open_time` is a valid millisecond
    /// epoch value.
    pub fn open_datetime(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.open_time).single()
    }
}

/// Parse a JSON array of candles.  Each element may be a kline row (array) or
/// a candle object.
pub fn parse_candles(value: &serde_json::Value) -> Result<Vec<Candle>> {
    let items = value.as_array().context("candle list is not a JSON array")?;

    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            if item.is_array() {
                Candle::from_kline_row(item).with_context(|| format!("bad kline row at index {i}"))
            } else {
                serde_json::from_value(item.clone())
                    .with_context(|| format!("bad candle object at index {i}"))
            }
        })
        .collect()
}

/// Close prices, oldest first.
pub fn closes(candles: &[Candle]) -> Vec<f64> {
    candles.iter().map(|c| c.close).collect()
}

/// Exchanges send numeric kline values as JSON strings; accept both.
fn parse_string_f64(val: &serde_json::Value, name: &str) -> Result<f64> {
    match val {
        serde_json::Value::String(s) => s
            .parse::<f64>()
            .with_context(|| format!("failed to parse {name} as f64: {s}")),
        serde_json::Value::Number(n) => n
            .as_f64()
            .with_context(|| format!("field {name} is not a valid f64")),
        _ => anyhow::bail!("field {name} has unexpected JSON type"),
    }
}

fn parse_i64(val: &serde_json::Value, name: &str) -> Result<i64> {
    match val {
        serde_json::Value::String(s) => s
            .parse::<i64>()
            .with_context(|| format!("failed to parse {name} as i64: {s}")),
        _ => val.as_i64().with_context(|| format!("missing field {name}")),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
