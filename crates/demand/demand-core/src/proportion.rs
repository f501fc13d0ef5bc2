//! Proportional allocation of a parent forecast to its children.

use std::collections::BTreeMap;

use demand_spi::{Dimension, Measure, Metric, ObservationRecord, ProportionTable};

/// Splits a parent forecast by each child's historical share.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProportionAllocator {
    parent: Dimension,
    child: Dimension,
}

impl ProportionAllocator {
    pub fn new(parent: Dimension, child: Dimension) -> Self {
        Self { parent, child }
    }

    /// Allocator for a hierarchy level (dealer in state, location in dealer).
    pub fn for_child(child: Dimension) -> Option<Self> {
        child.parent().map(|parent| Self::new(parent, child))
    }

    /// Share table from `records`, which should already cover the
    /// proportion window.
    pub fn table(&self, records: &[ObservationRecord], metric: Metric) -> ProportionTable {
        let mut totals: BTreeMap<Measure, BTreeMap<String, BTreeMap<String, f64>>> =
            BTreeMap::new();

        for record in records {
            let parent = record.label(self.parent);
            let child = record.label(self.child);
            for &measure in metric.measures() {
                *totals
                    .entry(measure)
                    .or_default()
                    .entry(parent.clone())
                    .or_default()
                    .entry(child.clone())
                    .or_insert(0.0) += record.measure(measure);
            }
        }

        ProportionTable::from_totals(self.parent, self.child, totals)
    }

    /// Child forecast as parent forecast times share; `None` when the child
    /// has no share and must be excluded.
    pub fn allocate(
        &self,
        table: &ProportionTable,
        measure: Measure,
        parent: &str,
        child: &str,
        parent_forecast: &[f64],
    ) -> Option<Vec<f64>> {
        let share = table.share(measure, parent, child);
        if share <= 0.0 {
            return None;
        }
        Some(
            parent_forecast
                .iter()
                .map(|value| (value * share).max(0.0))
                .collect(),
        )
    }
}
