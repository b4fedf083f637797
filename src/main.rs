// =============================================================================
// Market Signals — Command-line Entry Point
// =============================================================================
//
// Usage: market-signals <candles.json> [intraday.json]
//
// Each input file is either a JSON object mapping symbol -> candle list, or a
// bare candle list attributed to the first configured symbol.  Candle lists
// may hold exchange kline rows or candle objects.  Reports are printed to
// stdout as pretty JSON.
// =============================================================================

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use market_signals::intraday::IntradayStore;
use market_signals::market_data::{parse_candles, Candle};
use market_signals::pipeline::{enrich_all, SymbolBars};
use market_signals::{validate_period, SignalConfig};

fn main() -> Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config_path =
        std::env::var("SIGNALS_CONFIG").unwrap_or_else(|_| "signals_config.json".to_string());
    let mut config = SignalConfig::load(&config_path).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        SignalConfig::default()
    });

    if let Ok(raw) = std::env::var("SIGNALS_BOLLINGER_PERIOD") {
        let period: i64 = raw
            .trim()
            .parse()
            .with_context(|| format!("SIGNALS_BOLLINGER_PERIOD is not an integer: {raw}"))?;
        config.bollinger_period = validate_period(period)?;
    }

    // ── 2. Inputs ────────────────────────────────────────────────────────
    let mut args = std::env::args().skip(1);
    let candles_path = args
        .next()
        .context("usage: market-signals <candles.json> [intraday.json]")?;
    let intraday_path = args.next();

    let mut history = load_candle_file(&candles_path, &config)?;
    let mut intraday = match &intraday_path {
        Some(path) => load_candle_file(path, &config)?,
        None => history.clone(),
    };

    let mut symbols: Vec<String> = config
        .symbols
        .iter()
        .filter(|s| history.contains_key(*s))
        .cloned()
        .collect();
    if symbols.is_empty() {
        symbols = history.keys().cloned().collect();
        symbols.sort();
    }

    let inputs: Vec<SymbolBars> = symbols
        .into_iter()
        .map(|symbol| {
            let bars = history.remove(&symbol).unwrap_or_default();
            let intraday_bars = intraday.remove(&symbol).unwrap_or_default();
            if intraday_bars.is_empty() {
                warn!(symbol = %symbol, "no intraday candles; intraday record will be empty");
            }
            SymbolBars {
                symbol,
                bars,
                intraday_bars,
            }
        })
        .collect();

    info!(
        symbols = inputs.len(),
        bollinger_period = config.bollinger_period,
        intraday_window = config.intraday_window,
        "computing signals"
    );

    // ── 3. Enrich & report ───────────────────────────────────────────────
    let store = IntradayStore::new();
    let reports = enrich_all(&inputs, &config, &store)?;

    let out = serde_json::to_string_pretty(&reports).context("failed to serialise reports")?;
    println!("{out}");
    Ok(())
}

/// Read a candle file into a symbol -> candles map.
fn load_candle_file(path: impl AsRef<Path>, config: &SignalConfig) -> Result<HashMap<String, Vec<Candle>>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read candles from {}", path.display()))?;
    let root: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse candles JSON from {}", path.display()))?;

    let mut out = HashMap::new();
    match &root {
        serde_json::Value::Object(map) => {
            for (symbol, list) in map {
                let candles = parse_candles(list)
                    .with_context(|| format!("bad candles for {symbol} in {}", path.display()))?;
                out.insert(symbol.to_uppercase(), candles);
            }
        }
        _ => {
            let symbol = config
                .symbols
                .first()
                .cloned()
                .context("bare candle list requires at least one configured symbol")?;
            let candles = parse_candles(&root)
                .with_context(|| format!("bad candles in {}", path.display()))?;
            out.insert(symbol, candles);
        }
    }

    info!(path = %path.display(), symbols = out.len(), "candles loaded");
    Ok(out)
}
