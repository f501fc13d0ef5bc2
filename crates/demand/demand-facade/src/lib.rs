//! Demand Forecasting Facade
//!
//! High-level API for hierarchical demand forecasting. Re-exports all public
//! types from the demand stack for convenient usage.
//!
//! # Example
//!
//! ```ignore
//! use demand_facade::prelude::*;
//!
//! let source = InMemorySource::new(records);
//! let engine = HierarchicalForecaster::new(source, EngineConfig::default());
//! let report = engine.forecast(&ForecastRequest::new(8).metric("enquiries"))?;
//! println!("{} states forecast", report.summary.num_states);
//! ```

// Re-export everything from API (which includes SPI)
pub use demand_api::*;

// Core implementations
pub use demand_core::{
    calendar, fallback, metrics, simple_average, ConditionalSarimaFitter, HierarchicalForecaster,
    HierarchyForecast, InMemorySource, MovingAverageFallback, ProportionAllocator, Reconciler,
    SarimaSelector, SeriesBuilder, SimpleAverageEstimate,
};

// Remaining SPI model types
pub use demand_spi::{normalize_label, UNKNOWN_LABEL};

/// Prelude module for convenient imports
pub mod prelude {
    // Traits
    pub use demand_spi::{ModelSelector, ObservationSource, SeasonalModelFitter};

    // Configuration, request and report
    pub use demand_api::{
        EngineConfig, ForecastReport, ForecastRequest, ForecastSummary, GroupForecast,
        SelectorConfig,
    };

    // Domain types and errors
    pub use demand_spi::{
        ConfidenceTier, Dimension, FitOutcome, ForecastError, ForecastMethod, ForecastRecord,
        GroupKey, Measure, Metric, ObservationRecord, RecordFilter, Result, SarimaOrder,
    };

    // Implementations
    pub use demand_core::{
        ConditionalSarimaFitter, HierarchicalForecaster, InMemorySource, SarimaSelector,
        SeriesBuilder,
    };
}
