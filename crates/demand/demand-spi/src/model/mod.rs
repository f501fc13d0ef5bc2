//! Model module containing the forecasting domain types.
//!
//! - [`Dimension`] / [`GroupKey`] - Typed grouping keys
//! - [`ObservationRecord`] / [`RecordFilter`] - Input records and filters
//! - [`TimeSeries`] / [`GroupSeries`] - Weekly aggregated series
//! - [`SarimaOrder`] / [`CandidateModel`] / [`FitOutcome`] - Model fitting results
//! - [`ForecastRecord`] - Per-group forecast output
//! - [`ProportionTable`] - Historical child shares for allocation

mod candidate;
mod deadline;
mod dimension;
mod filter;
mod forecast_record;
mod observation;
mod proportion;
mod series;

pub use candidate::{CandidateModel, FitMetrics, FitOutcome, SarimaOrder};
pub use deadline::Deadline;
pub use dimension::{normalize_label, Dimension, GroupKey, UNKNOWN_LABEL};
pub use filter::RecordFilter;
pub use forecast_record::{ConfidenceTier, ForecastMethod, ForecastRecord, WeekForecast};
pub use observation::{Measure, Metric, ObservationRecord};
pub use proportion::ProportionTable;
pub use series::{GroupSeries, TimeSeries};
