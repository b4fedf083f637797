// =============================================================================
// Error types
// =============================================================================
//
// The calculators never fail: insufficient data is reported as zero-valued
// output.  Errors only arise at the caller boundary, where parameters are
// validated before any computation runs.

use thiserror::Error;

/// Errors raised when validating inputs to the signal pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignalError {
    /// A parameter is outside its valid domain (e.g. a non-positive period).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl SignalError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}

/// Convert a caller-supplied window length into a usable period.
///
/// Zero and negative values are rejected with [`SignalError::InvalidArgument`].
pub fn validate_period(period: i64) -> Result<usize, SignalError> {
    if period <= 0 {
        return Err(SignalError::invalid_argument(format!(
            "period must be >= 1, got {period}"
        )));
    }
    usize::try_from(period)
        .map_err(|_| SignalError::invalid_argument(format!("period {period} does not fit in usize")))
}
