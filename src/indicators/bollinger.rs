// =============================================================================
// Bollinger Bands
// =============================================================================
//
// Bollinger Bands consist of a middle band (SMA), an upper band (SMA + 2σ),
// and a lower band (SMA - 2σ), where σ is the population standard deviation
// of the trailing `period` closes.
//
// Alongside the full band series we report a snapshot of the final window:
//   bandwidth = (upper - lower) / middle
//   z_score   = (last_close - middle) / σ
//
// Insufficient data is not an error: the series stays zero-filled and the
// snapshot is the zero value.

use serde::{Deserialize, Serialize};

use crate::market_data::{self, Candle};

/// Number of standard deviations between the middle band and each outer band.
pub const BAND_STD_MULTIPLIER: f64 = 2.0;

/// Full-length band series, index-aligned with the input candles.
///
/// Entries before index `period - 1` are zero (not enough history).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BollingerSeries {
    pub upper: Vec<f64>,
    pub middle: Vec<f64>,
    pub lower: Vec<f64>,
}

impl BollingerSeries {
    fn zeroed(len: usize) -> Self {
        Self {
            upper: vec![0.0; len],
            middle: vec![0.0; len],
            lower: vec![0.0; len],
        }
    }

    pub fn len(&self) -> usize {
        self.middle.len()
    }

    pub fn is_empty(&self) -> bool {
        self.upper.is_empty() && self.middle.is_empty() && self.lower.is_empty()
    }

    /// Whether index `i` holds a computed value for a window of `period`.
    pub fn is_valid_at(&self, i: usize, period: usize) -> bool {
        period > 0 && i + 1 >= period && i < self.len()
    }
}

/// Bollinger reading for the most recent window only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BollingerSnapshot {
    pub middle: f64,
    pub upper: f64,
    pub lower: f64,
    pub bandwidth: f64,
    pub z_score: f64,
}

/// Compute Bollinger Bands over the closes of `candles` with window `period`.
///
/// Returns the full band series and the snapshot of the last window.
///
/// # Edge cases
/// - Empty input => empty series, zero snapshot.
/// - `period == 0` or fewer than `period` candles => zero-filled series of the
///   input length, zero snapshot.
pub fn calculate_bollinger(candles: &[Candle], period: usize) -> (BollingerSeries, BollingerSnapshot) {
    let mut series = BollingerSeries::zeroed(candles.len());
    if period == 0 || candles.len() < period {
        return (series, BollingerSnapshot::default());
    }

    let closes = market_data::closes(candles);

    for i in period - 1..closes.len() {
        let (mean, std_dev) = window_stats(&closes[i + 1 - period..=i]);
        series.middle[i] = mean;
        series.upper[i] = mean + BAND_STD_MULTIPLIER * std_dev;
        series.lower[i] = mean - BAND_STD_MULTIPLIER * std_dev;
    }

    let last = closes.len() - 1;
    let (mean, std_dev) = window_stats(&closes[last + 1 - period..]);
    let upper = series.upper[last];
    let lower = series.lower[last];

    let snapshot = BollingerSnapshot {
        middle: mean,
        upper,
        lower,
        bandwidth: bandwidth(upper, lower, mean).unwrap_or(0.0),
        z_score: z_score(closes[last], mean, std_dev).unwrap_or(0.0),
    };

    (series, snapshot)
}

// =============================================================================
// Internal helpers
// =============================================================================

/// Mean and population standard deviation of a non-empty window.
fn window_stats(window: &[f64]) -> (f64, f64) {
    let n = window.len() as f64;
    let mean = window.iter().sum::<f64>() / n;
    let variance = window.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
    (mean, variance.sqrt())
}

/// Relative band width.  `None` when the middle band is zero.
fn bandwidth(upper: f64, lower: f64, middle: f64) -> Option<f64> {
    if middle == 0.0 {
        return None;
    }
    Some((upper - lower) / middle)
}

/// Distance of `close` from the middle band in standard deviations.  `None`
/// when the window has no dispersion.
fn z_score(close: f64, middle: f64, std_dev: f64) -> Option<f64> {
    if std_dev > 0.0 {
        Some((close - middle) / std_dev)
    } else {
        None
    }
}
