//! Weekly series construction per grouping key.

use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use demand_spi::{Dimension, GroupKey, GroupSeries, Measure, Metric, ObservationRecord, TimeSeries};

use crate::calendar::{week_range, week_start};

/// Aggregates records into weekly series, one [`GroupSeries`] per key.
///
/// Weeks start on Monday. Keys observed in fewer than `min_weeks` distinct
/// weeks are dropped; the remaining series are re-indexed to a continuous
/// weekly range with missing weeks set to 0.
#[derive(Debug, Clone)]
pub struct SeriesBuilder {
    min_weeks: usize,
    since: Option<NaiveDate>,
}

impl Default for SeriesBuilder {
    fn default() -> Self {
        Self {
            min_weeks: 2,
            since: None,
        }
    }
}

impl SeriesBuilder {
    pub fn new(min_weeks: usize) -> Self {
        Self {
            min_weeks,
            since: None,
        }
    }

    /// Ignore records dated before `start`.
    pub fn since(mut self, start: Option<NaiveDate>) -> Self {
        self.since = start;
        self
    }

    /// Build the series of every key of `dimension`, ordered by key.
    pub fn build(
        &self,
        records: &[ObservationRecord],
        dimension: Dimension,
        metric: Metric,
    ) -> Vec<GroupSeries> {
        let mut weekly: BTreeMap<GroupKey, BTreeMap<Measure, BTreeMap<NaiveDate, f64>>> =
            BTreeMap::new();
        let mut observed: BTreeMap<GroupKey, BTreeSet<NaiveDate>> = BTreeMap::new();

        for record in records {
            if self.since.is_some_and(|start| record.date < start) {
                continue;
            }
            let key = record.group_key(dimension);
            let week = week_start(record.date);
            observed.entry(key.clone()).or_default().insert(week);

            let per_measure = weekly.entry(key).or_default();
            for &measure in metric.measures() {
                *per_measure
                    .entry(measure)
                    .or_default()
                    .entry(week)
                    .or_insert(0.0) += record.measure(measure);
            }
        }

        let mut result = Vec::new();
        let mut skipped = 0usize;

        for (key, per_measure) in weekly {
            let weeks = observed.get(&key).map(BTreeSet::len).unwrap_or(0);
            if weeks < self.min_weeks {
                debug!(%key, weeks, "Skipping group with too few weeks");
                skipped += 1;
                continue;
            }

            let mut group = GroupSeries::new(key.clone());
            for (measure, values) in per_measure {
                group.set(TimeSeries::from_weekly(key.clone(), measure, fill_gaps(values)));
            }
            result.push(group);
        }

        debug!(
            dimension = %dimension,
            series = result.len(),
            skipped,
            "Built weekly series"
        );
        result
    }
}

/// Re-index to every week between the first and last observed week.
fn fill_gaps(values: BTreeMap<NaiveDate, f64>) -> BTreeMap<NaiveDate, f64> {
    let (Some(first), Some(last)) = (
        values.keys().next().copied(),
        values.keys().next_back().copied(),
    ) else {
        return values;
    };
    week_range(first, last)
        .into_iter()
        .map(|week| (week, values.get(&week).copied().unwrap_or(0.0)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn record(date: NaiveDate, state: &str, value: f64) -> ObservationRecord {
        ObservationRecord::new(date)
            .with(Dimension::State, state)
            .with_order_value(value)
    }

    #[test]
    fn test_weekly_aggregation_sums_duplicates() {
        let records = vec![
            record(date(2026, 1, 5), "Alpha", 100.0),
            record(date(2026, 1, 8), "Alpha", 50.0),
            record(date(2026, 1, 12), "Alpha", 25.0),
        ];
        let series = SeriesBuilder::default().build(&records, Dimension::State, Metric::Both);
        assert_eq!(series.len(), 1);

        let enquiries = series[0].series(Measure::Enquiries).unwrap();
        assert_eq!(enquiries.weeks(), &[date(2026, 1, 5), date(2026, 1, 12)]);
        assert_eq!(enquiries.values(), &[2.0, 1.0]);

        let value = series[0].series(Measure::OrderValue).unwrap();
        assert_eq!(value.values(), &[150.0, 25.0]);
    }

    #[test]
    fn test_single_week_groups_are_dropped() {
        let records = vec![
            record(date(2026, 1, 5), "Alpha", 0.0),
            record(date(2026, 1, 6), "Alpha", 0.0),
            record(date(2026, 1, 5), "Beta", 0.0),
            record(date(2026, 1, 19), "Beta", 0.0),
        ];
        let series = SeriesBuilder::default().build(&records, Dimension::State, Metric::Enquiries);
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].key.value(), "Beta");
    }

    #[test]
    fn test_gaps_are_filled_with_zero() {
        let records = vec![
            record(date(2026, 1, 5), "Beta", 0.0),
            record(date(2026, 1, 19), "Beta", 0.0),
        ];
        let series = SeriesBuilder::default().build(&records, Dimension::State, Metric::Enquiries);
        let enquiries = series[0].series(Measure::Enquiries).unwrap();
        assert_eq!(enquiries.values(), &[1.0, 0.0, 1.0]);
        assert_eq!(series[0].weeks(), 3);
        assert!(series[0].series(Measure::OrderValue).is_none());
    }

    #[test]
    fn test_blank_values_group_as_unknown() {
        let records = vec![
            record(date(2026, 1, 5), "", 0.0),
            record(date(2026, 1, 12), "  ", 0.0),
        ];
        let series = SeriesBuilder::default().build(&records, Dimension::State, Metric::Enquiries);
        assert_eq!(series.len(), 1);
        assert!(series[0].key.is_unknown());
    }

    #[test]
    fn test_since_drops_older_records() {
        let records = vec![
            record(date(2025, 1, 6), "Alpha", 0.0),
            record(date(2026, 1, 5), "Alpha", 0.0),
            record(date(2026, 1, 12), "Alpha", 0.0),
        ];
        let series = SeriesBuilder::default()
            .since(Some(date(2026, 1, 1)))
            .build(&records, Dimension::State, Metric::Enquiries);
        assert_eq!(series[0].weeks(), 2);
    }

    #[test]
    fn test_no_records_no_series() {
        let series = SeriesBuilder::default().build(&[], Dimension::Sector, Metric::Both);
        assert!(series.is_empty());
    }
}
