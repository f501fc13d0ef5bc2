//! Demand Forecasting Consumer API
//!
//! Configuration types, the forecast request and the serializable report
//! returned to consumers.

mod config;
mod report;
mod request;

pub use config::{EngineConfig, SelectorConfig};
pub use report::{ForecastReport, ForecastSummary, ForecastWeek, GroupForecast};
pub use request::{ForecastPlan, ForecastRequest, HorizonOverrides};

// Re-export SPI types
pub use demand_spi::{
    CandidateModel, ConfidenceTier, Deadline, Dimension, FitMetrics, FitOutcome, FittedModel,
    ForecastError, ForecastMethod, ForecastRecord, GroupKey, GroupSeries, Measure, Metric,
    ModelSelector, ObservationRecord, ObservationSource, ProportionTable, RecordFilter, Result,
    SarimaOrder, SeasonalModelFitter, TimeSeries, WeekForecast,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        EngineConfig, ForecastPlan, ForecastReport, ForecastRequest, ForecastSummary,
        GroupForecast, HorizonOverrides, SelectorConfig,
    };
    pub use demand_spi::{
        ConfidenceTier, Dimension, ForecastError, GroupKey, Metric, ObservationRecord,
        ObservationSource, RecordFilter, Result,
    };
}
