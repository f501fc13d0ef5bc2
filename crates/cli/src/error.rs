//! Errors surfaced by the command-line front end.

use std::path::PathBuf;
use thiserror::Error;

use demand_facade::ForecastError;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no usable rows in {0}")]
    EmptyInput(PathBuf),

    #[error(transparent)]
    Forecast(#[from] ForecastError),
}

pub type CliResult<T> = std::result::Result<T, CliError>;
