//! Candidate model types produced by model selection.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::forecast_record::ConfidenceTier;

/// Seasonal ARIMA orders `(p,d,q)x(P,D,Q,s)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SarimaOrder {
    pub p: usize,
    pub d: usize,
    pub q: usize,
    pub seasonal_p: usize,
    pub seasonal_d: usize,
    pub seasonal_q: usize,
    pub period: usize,
}

impl SarimaOrder {
    pub fn new(order: (usize, usize, usize), seasonal: (usize, usize, usize, usize)) -> Self {
        Self {
            p: order.0,
            d: order.1,
            q: order.2,
            seasonal_p: seasonal.0,
            seasonal_d: seasonal.1,
            seasonal_q: seasonal.2,
            period: seasonal.3,
        }
    }

    /// The four orders searched by default: the seasonal order mirrors the
    /// non-seasonal one.
    pub fn default_candidates(period: usize) -> Vec<SarimaOrder> {
        [(1, 1, 1), (0, 1, 1), (1, 1, 0), (1, 0, 1)]
            .into_iter()
            .map(|(p, d, q)| SarimaOrder::new((p, d, q), (p, d, q, period)))
            .collect()
    }

    pub fn has_seasonal_terms(&self) -> bool {
        self.period > 1 && (self.seasonal_p + self.seasonal_d + self.seasonal_q) > 0
    }

    /// Same non-seasonal orders with the seasonal part removed.
    pub fn without_seasonal(&self) -> Self {
        Self::new((self.p, self.d, self.q), (0, 0, 0, 0))
    }

    /// Observations needed before a fit is attempted.
    pub fn min_observations(&self) -> usize {
        let seasonal = if self.has_seasonal_terms() {
            self.period * (self.seasonal_p + self.seasonal_q + self.seasonal_d)
        } else {
            0
        };
        self.p + self.d + self.q + seasonal + 10
    }
}

impl fmt::Display for SarimaOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SARIMA({},{},{})x({},{},{},{})",
            self.p, self.d, self.q, self.seasonal_p, self.seasonal_d, self.seasonal_q, self.period
        )
    }
}

/// In-sample fit quality.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitMetrics {
    pub mae: f64,
    pub rmse: f64,
    /// Mean absolute percentage error, in percent
    pub mape: f64,
    pub aic: f64,
}

/// A fitted model bound to one series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateModel {
    pub name: String,
    pub order: SarimaOrder,
    /// Forecast for the requested horizon
    pub forecast: Vec<f64>,
    pub metrics: FitMetrics,
}

impl CandidateModel {
    pub fn confidence(&self) -> ConfidenceTier {
        ConfidenceTier::from_mape(self.metrics.mape)
    }
}

/// Result of model selection on one series.
#[derive(Debug, Clone, PartialEq)]
pub enum FitOutcome {
    /// At least one candidate fitted; the lowest-AIC one
    Fitted(CandidateModel),
    /// The series is too short to attempt fitting
    Insufficient { required: usize, actual: usize },
    /// Every candidate failed or timed out
    Failed(String),
}

impl FitOutcome {
    pub fn is_fitted(&self) -> bool {
        matches!(self, FitOutcome::Fitted(_))
    }

    pub fn into_model(self) -> Option<CandidateModel> {
        match self {
            FitOutcome::Fitted(model) => Some(model),
            _ => None,
        }
    }
}
