//! Model selection trait.

use crate::model::{FitOutcome, TimeSeries};

/// Chooses a model for one weekly series.
///
/// Selection never fails: insufficient data and fitting failures are
/// reported through [`FitOutcome`] so the caller can fall back.
pub trait ModelSelector {
    fn select(&self, series: &TimeSeries, horizon: usize) -> FitOutcome;
}
