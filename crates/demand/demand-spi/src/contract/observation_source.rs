//! Read access to the external observation store.

use crate::error::ForecastError;
use crate::model::{ObservationRecord, RecordFilter};

/// Result type for observation source operations.
pub type Result<T> = std::result::Result<T, ForecastError>;

/// The data store the engine reads from.
///
/// Each call returns an owned snapshot; the engine never writes back.
pub trait ObservationSource {
    /// Records matching `filter`, in any order.
    fn query(&self, filter: &RecordFilter) -> Result<Vec<ObservationRecord>>;
}

impl<S: ObservationSource + ?Sized> ObservationSource for &S {
    fn query(&self, filter: &RecordFilter) -> Result<Vec<ObservationRecord>> {
        (**self).query(filter)
    }
}
