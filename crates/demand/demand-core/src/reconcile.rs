//! Top-down reconciliation of child forecasts against their parent.

use tracing::debug;

use demand_spi::{ForecastRecord, Measure, Metric};

/// Scales children so their totals match the parent, per measure.
///
/// Reconciliation only runs when the children have a positive total that
/// differs from the parent's by more than the tolerance. Children with a zero
/// total are left untouched. Enquiry counts are apportioned with the
/// largest-remainder method so that they sum exactly to the parent total.
#[derive(Debug, Clone, Copy)]
pub struct Reconciler {
    tolerance: f64,
}

impl Default for Reconciler {
    fn default() -> Self {
        Self { tolerance: 0.01 }
    }
}

impl Reconciler {
    pub fn new(tolerance: f64) -> Self {
        Self { tolerance }
    }

    /// Reconciled copies of `children`.
    pub fn reconcile(
        &self,
        parent: &ForecastRecord,
        children: &[ForecastRecord],
        metric: Metric,
    ) -> Vec<ForecastRecord> {
        let mut result = children.to_vec();

        for &measure in metric.measures() {
            let parent_total = parent.total(measure);
            let child_total: f64 = result.iter().map(|c| c.total(measure)).sum();

            if child_total <= 0.0 || (parent_total - child_total).abs() <= self.tolerance {
                continue;
            }

            let ratio = parent_total / child_total;
            debug!(
                parent = %parent.key,
                %measure,
                parent_total,
                child_total,
                ratio,
                "Reconciling children"
            );

            match measure {
                Measure::Enquiries => scale_counts(&mut result, ratio, parent.total_enquiries()),
                Measure::OrderValue => scale_values(&mut result, ratio),
            }
        }

        result
    }
}

fn scale_values(children: &mut [ForecastRecord], ratio: f64) {
    for child in children.iter_mut().filter(|c| c.total_order_value() > 0.0) {
        for week in &mut child.weeks {
            if let Some(value) = week.order_value.as_mut() {
                *value *= ratio;
            }
        }
        child.reconciled = true;
    }
}

fn scale_counts(children: &mut [ForecastRecord], ratio: f64, parent_total: u64) {
    // (child index, week index) of every cell that gets rescaled
    let cells: Vec<(usize, usize)> = children
        .iter()
        .enumerate()
        .filter(|(_, c)| c.total_enquiries() > 0)
        .flat_map(|(i, c)| {
            c.weeks
                .iter()
                .enumerate()
                .filter(|(_, w)| w.enquiries.is_some())
                .map(move |(j, _)| (i, j))
        })
        .collect();

    let targets: Vec<f64> = cells
        .iter()
        .map(|&(i, j)| children[i].weeks[j].enquiries.unwrap_or(0) as f64 * ratio)
        .collect();
    let counts = apportion(&targets, parent_total);

    for (&(i, j), count) in cells.iter().zip(counts) {
        children[i].weeks[j].enquiries = Some(count);
        children[i].reconciled = true;
    }
}

/// Round `targets` to whole numbers summing to `total` (largest remainder).
///
/// Ties go to the earlier target.
pub(crate) fn apportion(targets: &[f64], total: u64) -> Vec<u64> {
    let mut counts: Vec<u64> = targets.iter().map(|t| t.max(0.0).floor() as u64).collect();
    let assigned: u64 = counts.iter().sum();
    let remaining = total.saturating_sub(assigned) as usize;

    let mut order: Vec<usize> = (0..targets.len()).collect();
    order.sort_by(|&a, &b| {
        let ra = targets[a].max(0.0) - counts[a] as f64;
        let rb = targets[b].max(0.0) - counts[b] as f64;
        rb.partial_cmp(&ra).unwrap_or(std::cmp::Ordering::Equal)
    });
    for &i in order.iter().take(remaining) {
        counts[i] += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use demand_spi::{ConfidenceTier, Dimension, ForecastMethod, GroupKey, WeekForecast};

    fn record(dimension: Dimension, name: &str, enquiries: &[u64], values: &[f64]) -> ForecastRecord {
        let start = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        ForecastRecord {
            key: GroupKey::new(dimension, name),
            lineage: Vec::new(),
            weeks: enquiries
                .iter()
                .zip(values)
                .enumerate()
                .map(|(i, (e, v))| WeekForecast {
                    week: format!("2026-W{}", 43 + i),
                    date: start + chrono::Duration::weeks(i as i64),
                    enquiries: Some(*e),
                    order_value: Some(*v),
                })
                .collect(),
            confidence: ConfidenceTier::Low,
            method: ForecastMethod::ProportionalAllocation,
            reconciled: false,
        }
    }

    #[test]
    fn test_apportion_keeps_total() {
        assert_eq!(apportion(&[7.5, 7.5, 7.5, 7.5], 30), vec![8, 8, 7, 7]);
        assert_eq!(apportion(&[1.2, 2.7, 3.1], 7), vec![1, 3, 3]);
        assert_eq!(apportion(&[], 0), Vec::<u64>::new());
        assert_eq!(apportion(&[2.0, 3.0], 5), vec![2, 3]);
    }

    #[test]
    fn test_two_dealers_scaled_to_state() {
        let state = record(Dimension::State, "Alpha", &[15, 15], &[1500.0, 1500.0]);
        let d1 = record(Dimension::Dealer, "D1", &[5, 5], &[500.0, 500.0]);
        let d2 = record(Dimension::Dealer, "D2", &[5, 5], &[500.0, 500.0]);

        let reconciled = Reconciler::default().reconcile(&state, &[d1, d2], Metric::Both);

        for child in &reconciled {
            assert!(child.reconciled);
            for week in &child.weeks {
                let count = week.enquiries.unwrap();
                assert!(count == 7 || count == 8, "got {}", count);
                assert!((week.order_value.unwrap() - 750.0).abs() < 1e-9);
            }
        }
        let total: u64 = reconciled.iter().map(|c| c.total_enquiries()).sum();
        assert_eq!(total, 30);
        let value: f64 = reconciled.iter().map(|c| c.total_order_value()).sum();
        assert!((value - 3000.0).abs() <= 0.01);
    }

    #[test]
    fn test_within_tolerance_is_untouched() {
        let state = record(Dimension::State, "Alpha", &[10, 10], &[100.0, 100.0]);
        let d1 = record(Dimension::Dealer, "D1", &[4, 6], &[40.0, 60.0]);
        let d2 = record(Dimension::Dealer, "D2", &[6, 4], &[60.0, 40.005]);

        let reconciled = Reconciler::default().reconcile(&state, &[d1.clone(), d2.clone()], Metric::Both);
        assert_eq!(reconciled, vec![d1, d2]);
    }

    #[test]
    fn test_zero_total_children_untouched() {
        let state = record(Dimension::State, "Alpha", &[20, 20], &[0.0, 0.0]);
        let d1 = record(Dimension::Dealer, "D1", &[5, 5], &[0.0, 0.0]);
        let idle = record(Dimension::Dealer, "D2", &[0, 0], &[0.0, 0.0]);

        let reconciled = Reconciler::default().reconcile(&state, &[d1, idle.clone()], Metric::Both);
        assert_eq!(reconciled[0].total_enquiries(), 40);
        assert_eq!(reconciled[1], idle);
    }

    #[test]
    fn test_children_all_zero_is_noop() {
        let state = record(Dimension::State, "Alpha", &[20], &[10.0]);
        let idle = record(Dimension::Dealer, "D1", &[0], &[0.0]);
        let reconciled = Reconciler::default().reconcile(&state, &[idle.clone()], Metric::Both);
        assert_eq!(reconciled, vec![idle]);
    }

    #[test]
    fn test_only_requested_measures_are_reconciled() {
        let state = record(Dimension::State, "Alpha", &[15, 15], &[1500.0, 1500.0]);
        let d1 = record(Dimension::Dealer, "D1", &[5, 5], &[500.0, 500.0]);

        let reconciled = Reconciler::default().reconcile(&state, &[d1], Metric::OrderValue);
        assert_eq!(reconciled[0].total_enquiries(), 10);
        assert!((reconciled[0].total_order_value() - 3000.0).abs() < 1e-9);
        assert!(reconciled[0].reconciled);
    }

    #[test]
    fn test_scaling_down() {
        let dealer = record(Dimension::Dealer, "D1", &[3, 3], &[30.0, 30.0]);
        let a = record(Dimension::Location, "Pune", &[4, 4], &[40.0, 40.0]);
        let b = record(Dimension::Location, "Nashik", &[2, 2], &[20.0, 20.0]);

        let reconciled = Reconciler::new(0.01).reconcile(&dealer, &[a, b], Metric::Both);
        assert_eq!(reconciled[0].weeks.iter().map(|w| w.enquiries.unwrap()).collect::<Vec<_>>(), vec![2, 2]);
        assert_eq!(reconciled[1].weeks.iter().map(|w| w.enquiries.unwrap()).collect::<Vec<_>>(), vec![1, 1]);
        assert!((reconciled[0].total_order_value() - 40.0).abs() < 1e-9);
    }
}
