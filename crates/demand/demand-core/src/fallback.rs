//! Fallback estimators used when no model can be fitted.

use std::collections::BTreeMap;

use demand_spi::{Dimension, GroupKey, Measure, Metric, ObservationRecord, TimeSeries};

use crate::calendar::span_weeks;

/// Repeats the mean of the last `window` weeks over the horizon.
///
/// # Example
///
/// ```rust
/// use demand_core::fallback::MovingAverageFallback;
///
/// let fallback = MovingAverageFallback::new(4);
/// let values = [10.0, 12.0, 11.0, 13.0, 14.0, 12.0, 15.0, 13.0, 14.0, 16.0, 15.0, 14.0];
/// assert_eq!(fallback.forecast_values(&values, 2), vec![14.75, 14.75]);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct MovingAverageFallback {
    window: usize,
}

impl Default for MovingAverageFallback {
    fn default() -> Self {
        Self { window: 4 }
    }
}

impl MovingAverageFallback {
    /// Create a fallback averaging the last `window` weeks (at least 1)
    pub fn new(window: usize) -> Self {
        Self {
            window: window.max(1),
        }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Forecast from raw weekly values; all weeks are used when fewer than
    /// `window` exist. An empty history forecasts zeros.
    pub fn forecast_values(&self, values: &[f64], horizon: usize) -> Vec<f64> {
        let start = values.len().saturating_sub(self.window);
        let tail = &values[start..];
        let mean = if tail.is_empty() {
            0.0
        } else {
            tail.iter().sum::<f64>() / tail.len() as f64
        };
        vec![mean; horizon]
    }

    pub fn forecast(&self, series: &TimeSeries, horizon: usize) -> Vec<f64> {
        self.forecast_values(series.values(), horizon)
    }
}

/// Weekly averages of one group derived from raw totals.
#[derive(Debug, Clone, PartialEq)]
pub struct SimpleAverageEstimate {
    pub key: GroupKey,
    pub enquiries: f64,
    pub order_value: f64,
}

impl SimpleAverageEstimate {
    pub fn weekly(&self, measure: Measure) -> f64 {
        match measure {
            Measure::Enquiries => self.enquiries,
            Measure::OrderValue => self.order_value,
        }
    }
}

/// Per-group weekly averages over the date span of `records`.
///
/// The span is at least one week. Enquiries never average below 0.1 per
/// week. Groups with a blank value are skipped.
pub fn simple_average(
    records: &[ObservationRecord],
    dimension: Dimension,
    metric: Metric,
) -> Vec<SimpleAverageEstimate> {
    let (Some(first), Some(last)) = (
        records.iter().map(|r| r.date).min(),
        records.iter().map(|r| r.date).max(),
    ) else {
        return Vec::new();
    };
    let span = span_weeks(first, last).max(1.0);

    let mut totals: BTreeMap<GroupKey, (f64, f64)> = BTreeMap::new();
    for record in records {
        let key = record.group_key(dimension);
        if key.is_unknown() {
            continue;
        }
        let entry = totals.entry(key).or_insert((0.0, 0.0));
        entry.0 += record.count();
        entry.1 += record.order_value;
    }

    totals
        .into_iter()
        .map(|(key, (count, value))| SimpleAverageEstimate {
            key,
            enquiries: if metric.includes(Measure::Enquiries) {
                (count / span).max(0.1)
            } else {
                0.0
            },
            order_value: if metric.includes(Measure::OrderValue) {
                value / span
            } else {
                0.0
            },
        })
        .collect()
}
