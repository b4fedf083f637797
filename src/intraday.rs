// =============================================================================
// Intraday signal alignment
// =============================================================================
//
// Indicator series are computed over the full bar history, while the intraday
// record only covers the most recent few bars.  Alignment keeps the trailing
// `mid_prices.len()` values of each indicator series so the buffers line up
// with the newest end of the intraday window.
//
// Buffers are cleared (keeping capacity) and rebuilt on every call, so
// repeated alignment with the same inputs is idempotent.

use std::collections::HashMap;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::indicators::bollinger::BollingerSeries;
use crate::market_data::{closes, Candle};

/// Recent mid-prices for a symbol plus the indicator values aligned to them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntradayRecord {
    pub mid_prices: Vec<f64>,
    #[serde(default)]
    pub obv_values: Vec<f64>,
    #[serde(default)]
    pub bollinger_upper: Vec<f64>,
    #[serde(default)]
    pub bollinger_middle: Vec<f64>,
    #[serde(default)]
    pub bollinger_lower: Vec<f64>,
}

impl IntradayRecord {
    pub fn new(mid_prices: Vec<f64>) -> Self {
        Self {
            mid_prices,
            ..Self::default()
        }
    }

    /// Build a record whose mid-prices are the closes of the last `window`
    /// candles (oldest first).
    pub fn from_candles(candles: &[Candle], window: usize) -> Self {
        let start = candles.len().saturating_sub(window);
        Self::new(closes(&candles[start..]))
    }

    /// Overwrite the indicator buffers with the trailing window of `obv` and
    /// of each band in `bollinger`.
    ///
    /// * Empty `mid_prices` => all buffers end up empty.
    /// * `bollinger == None` => only the OBV buffer is populated.
    /// * A source shorter than `mid_prices` is copied whole.
    ///
    /// Mid-prices are never modified.
    pub fn align_signals(&mut self, obv: &[f64], bollinger: Option<&BollingerSeries>) {
        self.clear_signals();

        let target_len = self.mid_prices.len();
        if target_len == 0 {
            return;
        }

        extend_trailing(&mut self.obv_values, obv, target_len);
        if let Some(bb) = bollinger {
            extend_trailing(&mut self.bollinger_upper, &bb.upper, target_len);
            extend_trailing(&mut self.bollinger_middle, &bb.middle, target_len);
            extend_trailing(&mut self.bollinger_lower, &bb.lower, target_len);
        }
    }

    fn clear_signals(&mut self) {
        self.obv_values.clear();
        self.bollinger_upper.clear();
        self.bollinger_middle.clear();
        self.bollinger_lower.clear();
    }
}

/// Align indicator series into `record`.  A missing record is a no-op.
pub fn align_intraday_signals(
    record: Option<&mut IntradayRecord>,
    obv: &[f64],
    bollinger: Option<&BollingerSeries>,
) {
    if let Some(record) = record {
        record.align_signals(obv, bollinger);
    }
}

/// Append the last `target_len` entries of `source` (or all of it, if shorter)
/// to `dest`, preserving order.
fn extend_trailing(dest: &mut Vec<f64>, source: &[f64], target_len: usize) {
    let start = source.len().saturating_sub(target_len);
    dest.extend_from_slice(&source[start..]);
}

// ---------------------------------------------------------------------------
// IntradayStore -- thread-safe records per symbol
// ---------------------------------------------------------------------------

/// Per-symbol intraday records behind a single `RwLock`.
///
/// Alignment mutates a record in place (clear, then append), so all writes go
/// through the write lock; readers get cloned snapshots.
#[derive(Default)]
pub struct IntradayStore {
    records: RwLock<HashMap<String, IntradayRecord>>,
}

impl IntradayStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the mid-prices for `symbol`.  Existing indicator buffers are
    /// cleared since they no longer line up with the new prices.
    pub fn set_mid_prices(&self, symbol: &str, mid_prices: Vec<f64>) {
        let mut map = self.records.write();
        let record = map.entry(symbol.to_string()).or_default();
        record.mid_prices = mid_prices;
        record.clear_signals();
    }

    /// Align indicator series into the record for `symbol`.  Unknown symbols
    /// are left untouched.  Returns whether a record was updated.
    pub fn align(&self, symbol: &str, obv: &[f64], bollinger: Option<&BollingerSeries>) -> bool {
        let mut map = self.records.write();
        let record = map.get_mut(symbol);
        let found = record.is_some();
        align_intraday_signals(record, obv, bollinger);
        if !found {
            debug!(symbol, "no intraday record to align");
        }
        found
    }

    /// Cloned snapshot of the record for `symbol`.
    pub fn get(&self, symbol: &str) -> Option<IntradayRecord> {
        self.records.read().get(symbol).cloned()
    }

    /// Symbols currently held, sorted.
    pub fn symbols(&self) -> Vec<String> {
        let mut symbols: Vec<String> = self.records.read().keys().cloned().collect();
        symbols.sort();
        symbols
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn series(len: usize) -> Vec<f64> {
        (0..len).map(|i| i as f64).collect()
    }

    fn bands(len: usize) -> BollingerSeries {
        BollingerSeries {
            upper: (0..len).map(|i| 100.0 + i as f64).collect(),
            middle: (0..len).map(|i| 50.0 + i as f64).collect(),
            lower: (0..len).map(|i| i as f64).collect(),
        }
    }

    #[test]
    fn align_keeps_trailing_window() {
        let obv = series(10);
        let mut record = IntradayRecord::new(vec![1.0, 2.0, 3.0]);
        record.align_signals(&obv, None);
        assert_eq!(record.obv_values, obv[7..10].to_vec());
    }

    #[test]
    fn align_short_source_copied_whole() {
        let obv = series(2);
        let bb = bands(2);
        let mut record = IntradayRecord::new(vec![1.0; 5]);
        record.align_signals(&obv, Some(&bb));
        assert_eq!(record.obv_values, obv);
        assert_eq!(record.bollinger_upper, bb.upper);
        assert_eq!(record.bollinger_middle, bb.middle);
        assert_eq!(record.bollinger_lower, bb.lower);
    }

    #[test]
    fn align_bands_trimmed_independently() {
        let bb = BollingerSeries {
            upper: series(6),
            middle: series(3),
            lower: series(1),
        };
        let mut record = IntradayRecord::new(vec![0.0; 4]);
        record.align_signals(&series(8), Some(&bb));
        assert_eq!(record.obv_values, vec![4.0, 5.0, 6.0, 7.0]);
        assert_eq!(record.bollinger_upper, vec![2.0, 3.0, 4.0, 5.0]);
        assert_eq!(record.bollinger_middle, vec![0.0, 1.0, 2.0]);
        assert_eq!(record.bollinger_lower, vec![0.0]);
    }

    #[test]
    fn align_keeps_zero_warmup_values() {
        let bb = BollingerSeries {
            upper: vec![0.0, 0.0, 3.0],
            middle: vec![0.0, 0.0, 2.0],
            lower: vec![0.0, 0.0, 1.0],
        };
        let mut record = IntradayRecord::new(vec![0.0; 3]);
        record.align_signals(&[0.0, 1.0, 2.0], Some(&bb));
        assert_eq!(record.bollinger_upper, vec![0.0, 0.0, 3.0]);
        assert_eq!(record.bollinger_lower, vec![0.0, 0.0, 1.0]);
    }

    #[test]
    fn align_without_bollinger_leaves_bands_empty() {
        let mut record = IntradayRecord::new(vec![0.0; 2]);
        record.bollinger_upper = vec![9.0, 9.0];
        record.align_signals(&series(5), None);
        assert_eq!(record.obv_values, vec![3.0, 4.0]);
        assert!(record.bollinger_upper.is_empty());
        assert!(record.bollinger_middle.is_empty());
        assert!(record.bollinger_lower.is_empty());
    }

    #[test]
    fn align_empty_mid_prices_clears_buffers() {
        let mut record = IntradayRecord {
            mid_prices: Vec::new(),
            obv_values: vec![1.0, 2.0],
            bollinger_upper: vec![3.0],
            bollinger_middle: vec![2.0],
            bollinger_lower: vec![1.0],
        };
        record.align_signals(&series(5), Some(&bands(5)));
        assert!(record.obv_values.is_empty());
        assert!(record.bollinger_upper.is_empty());
        assert!(record.bollinger_middle.is_empty());
        assert!(record.bollinger_lower.is_empty());
    }

    #[test]
    fn align_is_idempotent() {
        let obv = series(12);
        let bb = bands(12);
        let mut record = IntradayRecord::new(vec![1.0; 4]);
        record.align_signals(&obv, Some(&bb));
        let first = record.clone();
        record.align_signals(&obv, Some(&bb));
        assert_eq!(record, first);
        assert_eq!(record.obv_values.len(), 4);
    }

    #[test]
    fn align_preserves_mid_prices_and_capacity() {
        let mut record = IntradayRecord::new(vec![7.0, 8.0]);
        record.obv_values = Vec::with_capacity(64);
        record.align_signals(&series(10), None);
        assert_eq!(record.mid_prices, vec![7.0, 8.0]);
        assert!(record.obv_values.capacity() >= 64);
    }

    #[test]
    fn align_missing_record_is_noop() {
        align_intraday_signals(None, &series(3), Some(&bands(3)));

        let mut record = IntradayRecord::new(vec![0.0]);
        align_intraday_signals(Some(&mut record), &series(3), None);
        assert_eq!(record.obv_values, vec![2.0]);
    }

    #[test]
    fn from_candles_takes_last_closes() {
        let candles: Vec<Candle> = (0..5)
            .map(|i| Candle {
                open_time: i * 60_000,
                close_time: i * 60_000 + 59_999,
                open: 0.0,
                high: 0.0,
                low: 0.0,
                close: 10.0 + i as f64,
                volume: 1.0,
                quote_volume: 0.0,
                trades_count: 0,
            })
            .collect();
        assert_eq!(IntradayRecord::from_candles(&candles, 3).mid_prices, vec![12.0, 13.0, 14.0]);
        assert_eq!(IntradayRecord::from_candles(&candles, 10).mid_prices.len(), 5);
        assert!(IntradayRecord::from_candles(&candles, 0).mid_prices.is_empty());
    }

    #[test]
    fn store_align_and_get() {
        let store = IntradayStore::new();
        assert!(!store.align("BTCUSDT", &series(5), None));

        store.set_mid_prices("BTCUSDT", vec![1.0, 2.0]);
        assert!(store.align("BTCUSDT", &series(5), Some(&bands(5))));

        let record = store.get("BTCUSDT").expect("record exists");
        assert_eq!(record.obv_values, vec![3.0, 4.0]);
        assert_eq!(record.bollinger_middle, vec![53.0, 54.0]);
        assert_eq!(store.symbols(), vec!["BTCUSDT".to_string()]);
    }

    #[test]
    fn store_new_prices_reset_buffers() {
        let store = IntradayStore::new();
        store.set_mid_prices("ETHUSDT", vec![1.0]);
        store.align("ETHUSDT", &series(3), None);
        store.set_mid_prices("ETHUSDT", vec![1.0, 2.0]);
        assert!(store.get("ETHUSDT").unwrap().obv_values.is_empty());
    }

    #[test]
    fn store_concurrent_alignment() {
        let store = Arc::new(IntradayStore::new());
        store.set_mid_prices("BTCUSDT", vec![0.0; 3]);
        let obv = series(20);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                let obv = obv.clone();
                std::thread::spawn(move || {
                    for _ in 0..50 {
                        store.align("BTCUSDT", &obv, None);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(store.get("BTCUSDT").unwrap().obv_values, vec![17.0, 18.0, 19.0]);
    }
}
