//! Demand Forecasting Core
//!
//! Core implementations of the forecasting engine:
//! - Weekly series construction per grouping key
//! - Seasonal ARIMA fitting and bounded model selection
//! - Moving-average and simple-average fallbacks
//! - Proportional allocation and parent/child reconciliation
//! - The hierarchy orchestrator tying the levels together

pub mod calendar;
pub mod fallback;
pub mod metrics;
mod orchestrator;
mod proportion;
mod reconcile;
mod sarima;
mod selector;
mod series_builder;
mod source;

pub use fallback::{simple_average, MovingAverageFallback, SimpleAverageEstimate};
pub use orchestrator::{HierarchicalForecaster, HierarchyForecast};
pub use proportion::ProportionAllocator;
pub use reconcile::Reconciler;
pub use sarima::ConditionalSarimaFitter;
pub use selector::SarimaSelector;
pub use series_builder::SeriesBuilder;
pub use source::InMemorySource;

// Re-export from API for convenience
pub use demand_api::{
    EngineConfig, ForecastPlan, ForecastReport, ForecastRequest, ForecastSummary, GroupForecast,
    HorizonOverrides, SelectorConfig,
};

// Re-export SPI traits and types
pub use demand_spi::{
    FittedModel, ForecastError, ModelSelector, ObservationSource, Result, SeasonalModelFitter,
};
