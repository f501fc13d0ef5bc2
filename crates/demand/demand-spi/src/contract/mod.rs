//! Contract module containing the provider traits.
//!
//! - [`ObservationSource`] - Read access to the external record store
//! - [`SeasonalModelFitter`] - The provided seasonal ARIMA capability
//! - [`ModelSelector`] - Bounded model selection over one series

mod model_selector;
mod observation_source;
mod seasonal_fitter;

pub use model_selector::ModelSelector;
pub use observation_source::ObservationSource;
pub use seasonal_fitter::{FittedModel, SeasonalModelFitter};
