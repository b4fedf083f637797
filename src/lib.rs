// =============================================================================
// Market Signals — OBV and Bollinger enrichment for bar histories
// =============================================================================

pub mod error;
pub mod indicators;
pub mod intraday;
pub mod market_data;
pub mod pipeline;
pub mod runtime_config;

pub use error::{validate_period, SignalError};
pub use indicators::{calculate_bollinger, calculate_obv, BollingerSeries, BollingerSnapshot};
pub use intraday::{align_intraday_signals, IntradayRecord, IntradayStore};
pub use market_data::Candle;
pub use pipeline::{enrich, enrich_all, SignalReport, SymbolBars};
pub use runtime_config::SignalConfig;
