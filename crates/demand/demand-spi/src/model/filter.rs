//! Record filters passed to the observation store.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::dimension::{normalize_label, Dimension};
use super::observation::ObservationRecord;

/// Date-range and dimension-value filter over observation records.
///
/// Dimension values are compared after normalization, so a filter value of
/// `"Unknown"` selects records whose value is blank.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordFilter {
    /// Inclusive lower bound on the record date
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    /// Inclusive upper bound on the record date
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    /// Accepted values per dimension; an absent dimension is unrestricted
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub values: BTreeMap<Dimension, BTreeSet<String>>,
}

impl RecordFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to records dated within `[start, end]`.
    pub fn between(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        self.start_date = start;
        self.end_date = end;
        self
    }

    /// Accept `value` for `dimension` (in addition to already accepted values).
    pub fn with_value(mut self, dimension: Dimension, value: impl AsRef<str>) -> Self {
        self.values
            .entry(dimension)
            .or_default()
            .insert(normalize_label(value.as_ref()));
        self
    }

    /// Copy of this filter restricted to exactly one value of `dimension`.
    pub fn narrowed(&self, dimension: Dimension, value: impl AsRef<str>) -> Self {
        let mut narrowed = self.clone();
        let mut only = BTreeSet::new();
        only.insert(normalize_label(value.as_ref()));
        narrowed.values.insert(dimension, only);
        narrowed
    }

    /// Whether the caller supplied any date bound.
    pub fn has_date_range(&self) -> bool {
        self.start_date.is_some() || self.end_date.is_some()
    }

    pub fn matches(&self, record: &ObservationRecord) -> bool {
        if let Some(start) = self.start_date {
            if record.date < start {
                return false;
            }
        }
        if let Some(end) = self.end_date {
            if record.date > end {
                return false;
            }
        }
        self.values
            .iter()
            .all(|(dimension, accepted)| accepted.contains(&record.label(*dimension)))
    }
}
