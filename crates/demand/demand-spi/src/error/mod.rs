//! Error module containing forecasting error types.

mod forecast_error;

pub use forecast_error::ForecastError;
