// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Pure, side-effect-free indicator calculators.  Each takes an oldest-first
// candle slice and returns freshly allocated, index-aligned output; missing
// history shows up as zero values, never as an error.

pub mod bollinger;
pub mod obv;

pub use bollinger::{calculate_bollinger, BollingerSeries, BollingerSnapshot};
pub use obv::{calculate_obv, current_obv};
