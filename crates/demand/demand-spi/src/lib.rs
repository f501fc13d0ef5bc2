//! Demand Forecasting Service Provider Interface
//!
//! Defines the domain model and the contracts the forecasting engine needs
//! from its collaborators:
//! - Observation records, grouping keys and weekly time series
//! - Candidate models, fit outcomes and forecast records
//! - Traits for the data store, the seasonal model fitter and model selection

pub mod contract;
pub mod error;
pub mod model;

// Re-export all public items at the crate root for convenience
pub use contract::{FittedModel, ModelSelector, ObservationSource, SeasonalModelFitter};
pub use error::ForecastError;
pub use model::{
    normalize_label, CandidateModel, ConfidenceTier, Deadline, Dimension, FitMetrics, FitOutcome,
    ForecastMethod, ForecastRecord, GroupKey, GroupSeries, Measure, Metric, ObservationRecord,
    ProportionTable, RecordFilter, SarimaOrder, TimeSeries, WeekForecast, UNKNOWN_LABEL,
};

/// Result type for forecasting operations.
pub type Result<T> = std::result::Result<T, ForecastError>;
