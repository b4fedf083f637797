// =============================================================================
// Signal Configuration — JSON-backed settings with atomic save
// =============================================================================
//
// All fields carry `#[serde(default)]` so that adding new fields never breaks
// loading an older config file.  Values are validated at the boundary before
// any indicator runs.
//
// =============================================================================

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::SignalError;

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_bollinger_period() -> usize {
    20
}

fn default_intraday_window() -> usize {
    10
}

fn default_symbols() -> Vec<String> {
    vec!["BTCUSDT".to_string()]
}

// =============================================================================
// SignalConfig
// =============================================================================

/// Parameters for the enrichment pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalConfig {
    /// Bollinger window length in bars.
    #[serde(default = "default_bollinger_period")]
    pub bollinger_period: usize,

    /// Number of most recent bars kept in the intraday record.
    #[serde(default = "default_intraday_window")]
    pub intraday_window: usize,

    /// Symbols to report on, in output order.
    #[serde(default = "default_symbols")]
    pub symbols: Vec<String>,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            bollinger_period: default_bollinger_period(),
            intraday_window: default_intraday_window(),
            symbols: default_symbols(),
        }
    }
}

impl SignalConfig {
    /// Reject settings the calculators cannot use.
    pub fn validate(&self) -> Result<(), SignalError> {
        if self.bollinger_period == 0 {
            return Err(SignalError::invalid_argument("bollinger_period must be >= 1"));
        }
        Ok(())
    }

    /// Load configuration from a JSON file at `path`.
    ///
    /// A missing file is an error so the caller can fall back to defaults with
    /// a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read signal config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse signal config from {}", path.display()))?;

        config
            .validate()
            .with_context(|| format!("invalid signal config in {}", path.display()))?;

        info!(
            path = %path.display(),
            bollinger_period = config.bollinger_period,
            intraday_window = config.intraday_window,
            symbols = ?config.symbols,
            "signal config loaded"
        );

        Ok(config)
    }

    /// Persist the configuration to `path` using an atomic write (write to
    /// `.tmp`, then rename).
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content = serde_json::to_string_pretty(self)
            .context("failed to serialise signal config to JSON")?;

        let tmp_path = path.with_extension("json.tmp");

        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("failed to write tmp config to {}", tmp_path.display()))?;

        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to rename tmp config to {}", path.display()))?;

        info!(path = %path.display(), "signal config saved (atomic)");
        Ok(())
    }
}
