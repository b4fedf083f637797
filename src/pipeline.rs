// =============================================================================
// Enrichment Pipeline
// =============================================================================
//
// Runs both calculators over a symbol's bar history and aligns the results
// into an intraday record built from the recent bars:
//
//   bars ──► OBV ───────┐
//        └─► Bollinger ─┴─► align ──► IntradayRecord
//   intraday_bars ─────────────────────┘

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::SignalError;
use crate::indicators::bollinger::{calculate_bollinger, BollingerSnapshot};
use crate::indicators::obv::calculate_obv;
use crate::intraday::{IntradayRecord, IntradayStore};
use crate::market_data::Candle;
use crate::runtime_config::SignalConfig;

/// Derived signals for one symbol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalReport {
    pub symbol: String,
    /// Number of bars the indicators were computed over.
    pub bars: usize,
    /// Open time of the newest bar.
    pub as_of: Option<DateTime<Utc>>,
    pub obv_latest: f64,
    pub bollinger: BollingerSnapshot,
    pub intraday: IntradayRecord,
}

/// Bar histories for one symbol.
#[derive(Debug, Clone, Default)]
pub struct SymbolBars {
    pub symbol: String,
    /// Full history the indicators are computed over.
    pub bars: Vec<Candle>,
    /// Recent bars that supply the intraday mid-prices.
    pub intraday_bars: Vec<Candle>,
}

/// Compute OBV and Bollinger Bands over `bars` and align them into an
/// intraday record built from the last `config.intraday_window` of
/// `intraday_bars`.
///
/// Fails only when `config` is invalid.  Short histories produce zero-valued
/// Bollinger output (logged at `warn`).
pub fn enrich(
    symbol: &str,
    bars: &[Candle],
    intraday_bars: &[Candle],
    config: &SignalConfig,
) -> Result<SignalReport, SignalError> {
    config.validate()?;
    let period = config.bollinger_period;

    warn_if_short(symbol, bars.len(), period);

    let obv = calculate_obv(bars);
    let (bands, snapshot) = calculate_bollinger(bars, period);

    let mut intraday = IntradayRecord::from_candles(intraday_bars, config.intraday_window);
    intraday.align_signals(&obv, Some(&bands));

    Ok(build_report(symbol, bars, &obv, snapshot, intraday))
}

/// Enrich several symbols at once, writing each aligned record into `store`.
///
/// Calculators for different symbols run on separate threads since they share
/// no state; alignment goes through the store's write lock.  Reports come back
/// in input order.  Duplicate symbols are rejected, since they would share one
/// record.
pub fn enrich_all(
    inputs: &[SymbolBars],
    config: &SignalConfig,
    store: &IntradayStore,
) -> Result<Vec<SignalReport>, SignalError> {
    config.validate()?;

    let mut seen = HashSet::new();
    if let Some(dup) = inputs.iter().find(|i| !seen.insert(i.symbol.as_str())) {
        return Err(SignalError::invalid_argument(format!(
            "duplicate symbol {}",
            dup.symbol
        )));
    }

    let reports = std::thread::scope(|scope| {
        let handles: Vec<_> = inputs
            .iter()
            .map(|input| scope.spawn(move || enrich_into_store(input, config, store)))
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().unwrap_or_else(|panic| std::panic::resume_unwind(panic)))
            .collect::<Vec<_>>()
    });

    info!(symbols = reports.len(), "enrichment complete");
    Ok(reports)
}

fn enrich_into_store(input: &SymbolBars, config: &SignalConfig, store: &IntradayStore) -> SignalReport {
    let period = config.bollinger_period;
    warn_if_short(&input.symbol, input.bars.len(), period);

    let obv = calculate_obv(&input.bars);
    let (bands, snapshot) = calculate_bollinger(&input.bars, period);

    let window = IntradayRecord::from_candles(&input.intraday_bars, config.intraday_window);
    store.set_mid_prices(&input.symbol, window.mid_prices);
    store.align(&input.symbol, &obv, Some(&bands));
    let intraday = store.get(&input.symbol).unwrap_or_default();

    build_report(&input.symbol, &input.bars, &obv, snapshot, intraday)
}

fn warn_if_short(symbol: &str, bars: usize, period: usize) {
    if bars < period {
        warn!(
            symbol,
            bars,
            period,
            "insufficient bars for Bollinger Bands; snapshot will be zero"
        );
    }
}

fn build_report(
    symbol: &str,
    bars: &[Candle],
    obv: &[f64],
    snapshot: BollingerSnapshot,
    intraday: IntradayRecord,
) -> SignalReport {
    debug!(
        symbol,
        bars = bars.len(),
        intraday_len = intraday.mid_prices.len(),
        middle = snapshot.middle,
        z_score = snapshot.z_score,
        "signals enriched"
    );

    SignalReport {
        symbol: symbol.to_string(),
        bars: bars.len(),
        as_of: bars.last().and_then(Candle::open_datetime),
        obv_latest: obv.last().copied().unwrap_or(0.0),
        bollinger: snapshot,
        intraday,
    }
}
