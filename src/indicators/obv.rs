// =============================================================================
// On-Balance Volume (OBV)
// =============================================================================
//
// OBV is a running total of volume signed by the direction of the close:
//   OBV_0 = 0
//   OBV_t = OBV_{t-1} + volume_t   if close_t > close_{t-1}
//   OBV_t = OBV_{t-1} - volume_t   if close_t < close_{t-1}
//   OBV_t = OBV_{t-1}              otherwise
//
// The output is index-aligned with the input candles.

use crate::market_data::Candle;

/// Compute the full OBV series for `candles` (oldest first).
///
/// Empty input yields an empty vector.
pub fn calculate_obv(candles: &[Candle]) -> Vec<f64> {
    let mut obv = Vec::with_capacity(candles.len());
    let Some(first) = candles.first() else {
        return obv;
    };

    let mut running = 0.0_f64;
    let mut prev_close = first.close;
    obv.push(running);

    for candle in &candles[1..] {
        if candle.close > prev_close {
            running += candle.volume;
        } else if candle.close < prev_close {
            running -= candle.volume;
        }
        prev_close = candle.close;
        obv.push(running);
    }

    obv
}

/// Return the most recent OBV value, or `None` for an empty input.
pub fn current_obv(candles: &[Candle]) -> Option<f64> {
    calculate_obv(candles).last().copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bars(closes: &[f64], volumes: &[f64]) -> Vec<Candle> {
        closes
            .iter()
            .zip(volumes)
            .enumerate()
            .map(|(i, (&close, &volume))| Candle {
                open_time: i as i64 * 60_000,
                close_time: i as i64 * 60_000 + 59_999,
                open: close,
                high: close,
                low: close,
                close,
                volume,
                quote_volume: close * volume,
                trades_count: 1,
            })
            .collect()
    }

    #[test]
    fn obv_empty_input() {
        assert!(calculate_obv(&[]).is_empty());
        assert_eq!(current_obv(&[]), None);
    }

    #[test]
    fn obv_single_bar_is_zero() {
        let series = calculate_obv(&bars(&[10.0], &[500.0]));
        assert_eq!(series, vec![0.0]);
    }

    #[test]
    fn obv_mixed_moves() {
        let series = calculate_obv(&bars(&[10.0, 11.0, 10.0, 12.0], &[100.0, 50.0, 80.0, 60.0]));
        assert_eq!(series, vec![0.0, 50.0, -30.0, 30.0]);
    }

    #[test]
    fn obv_flat_close_keeps_value() {
        let series = calculate_obv(&bars(&[5.0, 6.0, 6.0, 6.0], &[1.0, 2.0, 3.0, 4.0]));
        assert_eq!(series, vec![0.0, 2.0, 2.0, 2.0]);
    }

    #[test]
    fn obv_step_matches_close_direction() {
        let closes = [100.0, 101.5, 101.5, 99.0, 99.5, 98.0, 98.0, 103.0];
        let volumes = [10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0, 80.0];
        let series = calculate_obv(&bars(&closes, &volumes));

        assert_eq!(series.len(), closes.len());
        assert_eq!(series[0], 0.0);
        for i in 1..closes.len() {
            let step = series[i] - series[i - 1];
            let expected = if closes[i] > closes[i - 1] {
                volumes[i]
            } else if closes[i] < closes[i - 1] {
                -volumes[i]
            } else {
                0.0
            };
            assert!((step - expected).abs() < 1e-12, "step {i}: {step} != {expected}");
        }
        assert_eq!(current_obv(&bars(&closes, &volumes)), series.last().copied());
    }
}
