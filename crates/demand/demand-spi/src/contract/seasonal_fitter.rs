//! The seasonal ARIMA fitting capability.

use crate::error::ForecastError;
use crate::model::{Deadline, SarimaOrder};

/// Result type for fitter operations.
pub type Result<T> = std::result::Result<T, ForecastError>;

/// Output of one successful fit.
#[derive(Debug, Clone, PartialEq)]
pub struct FittedModel {
    /// Orders actually fitted (seasonal terms may have been dropped)
    pub order: SarimaOrder,
    /// Forecast for the requested horizon
    pub forecast: Vec<f64>,
    /// One-step in-sample predictions aligned with the last `fitted.len()` observations
    pub fitted: Vec<f64>,
    pub aic: f64,
}

/// Fits one seasonal ARIMA order to a series.
///
/// Implementations should call [`Deadline::check`] between iterations and
/// return any failure as an error; the selector turns errors into a discarded
/// candidate.
pub trait SeasonalModelFitter: Send + Sync {
    fn fit(
        &self,
        data: &[f64],
        order: &SarimaOrder,
        horizon: usize,
        deadline: &Deadline,
    ) -> Result<FittedModel>;
}
