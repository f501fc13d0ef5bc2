//! Forecast error types

use thiserror::Error;

/// Errors that can occur during demand forecasting.
///
/// Only [`ForecastError::InvalidParameter`] and [`ForecastError::DataSource`]
/// are expected to reach callers of the engine; the remaining variants are
/// produced by model fitting and recovered through the fallback chain.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForecastError {
    /// Insufficient data points for the operation
    #[error("Insufficient data: need at least {required} points, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    /// Invalid parameter value
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    /// Model fitting failed
    #[error("Model fitting failed: {0}")]
    FitError(String),

    /// A fit ran past its wall-clock budget
    #[error("Deadline exceeded: {elapsed_ms} ms elapsed, budget {budget_ms} ms")]
    DeadlineExceeded { budget_ms: u64, elapsed_ms: u64 },

    /// Numerical computation error
    #[error("Numerical error: {0}")]
    NumericalError(String),

    /// The observation store could not answer a query
    #[error("Data source error: {0}")]
    DataSource(String),
}

impl ForecastError {
    /// Shorthand for an [`ForecastError::InvalidParameter`] error.
    pub fn invalid(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error is a caller-side parameter problem.
    pub fn is_parameter_error(&self) -> bool {
        matches!(self, Self::InvalidParameter { .. })
    }
}
