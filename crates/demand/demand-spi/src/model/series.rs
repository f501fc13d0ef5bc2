//! Weekly aggregated time series.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::dimension::GroupKey;
use super::observation::Measure;

/// A weekly series for one group key and one measure.
///
/// Weeks are strictly increasing and unique; construction from a map keyed
/// by week start guarantees both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    key: GroupKey,
    measure: Measure,
    weeks: Vec<NaiveDate>,
    values: Vec<f64>,
}

impl TimeSeries {
    /// Build from week-start → aggregated value.
    pub fn from_weekly(key: GroupKey, measure: Measure, weekly: BTreeMap<NaiveDate, f64>) -> Self {
        let (weeks, values) = weekly.into_iter().unzip();
        Self {
            key,
            measure,
            weeks,
            values,
        }
    }

    pub fn key(&self) -> &GroupKey {
        &self.key
    }

    pub fn measure(&self) -> Measure {
        self.measure
    }

    pub fn weeks(&self) -> &[NaiveDate] {
        &self.weeks
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Returns the number of weeks.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if the series has no weeks.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn last_week(&self) -> Option<NaiveDate> {
        self.weeks.last().copied()
    }

    pub fn total(&self) -> f64 {
        self.values.iter().sum()
    }

    /// Mean of the last `window` weeks (all weeks when shorter).
    pub fn tail_mean(&self, window: usize) -> Option<f64> {
        if self.values.is_empty() || window == 0 {
            return None;
        }
        let start = self.values.len().saturating_sub(window);
        let tail = &self.values[start..];
        Some(tail.iter().sum::<f64>() / tail.len() as f64)
    }
}

/// The series built for one group key, one per requested measure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSeries {
    pub key: GroupKey,
    pub enquiries: Option<TimeSeries>,
    pub order_value: Option<TimeSeries>,
}

impl GroupSeries {
    pub fn new(key: GroupKey) -> Self {
        Self {
            key,
            enquiries: None,
            order_value: None,
        }
    }

    pub fn series(&self, measure: Measure) -> Option<&TimeSeries> {
        match measure {
            Measure::Enquiries => self.enquiries.as_ref(),
            Measure::OrderValue => self.order_value.as_ref(),
        }
    }

    pub fn set(&mut self, series: TimeSeries) {
        match series.measure() {
            Measure::Enquiries => self.enquiries = Some(series),
            Measure::OrderValue => self.order_value = Some(series),
        }
    }

    /// Number of weeks covered; both measures share the same week index.
    pub fn weeks(&self) -> usize {
        self.enquiries
            .as_ref()
            .or(self.order_value.as_ref())
            .map(TimeSeries::len)
            .unwrap_or(0)
    }
}
