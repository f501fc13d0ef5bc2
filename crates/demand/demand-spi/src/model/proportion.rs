//! Historical parent/child shares.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::dimension::Dimension;
use super::observation::Measure;

type Shares = BTreeMap<String, BTreeMap<String, f64>>;

/// Share of each child in its parent's historical total, per measure.
///
/// Children without history have no entry; the shares of one parent sum to 1
/// over the children that are present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProportionTable {
    parent: Option<Dimension>,
    child: Option<Dimension>,
    shares: BTreeMap<Measure, Shares>,
}

impl ProportionTable {
    /// Normalize raw totals (`measure → parent → child → total`) into shares.
    pub fn from_totals(
        parent: Dimension,
        child: Dimension,
        totals: BTreeMap<Measure, Shares>,
    ) -> Self {
        let mut shares: BTreeMap<Measure, Shares> = BTreeMap::new();

        for (measure, parents) in totals {
            for (parent_value, children) in parents {
                let parent_total: f64 = children.values().filter(|v| **v > 0.0).sum();
                if parent_total <= 0.0 {
                    continue;
                }
                let normalized: BTreeMap<String, f64> = children
                    .into_iter()
                    .filter(|(_, total)| *total > 0.0)
                    .map(|(child_value, total)| (child_value, total / parent_total))
                    .collect();
                shares
                    .entry(measure)
                    .or_default()
                    .insert(parent_value, normalized);
            }
        }

        Self {
            parent: Some(parent),
            child: Some(child),
            shares,
        }
    }

    pub fn parent_dimension(&self) -> Option<Dimension> {
        self.parent
    }

    pub fn child_dimension(&self) -> Option<Dimension> {
        self.child
    }

    pub fn is_empty(&self) -> bool {
        self.shares.values().all(BTreeMap::is_empty)
    }

    /// Share of `child` within `parent`; 0 when the child has no history.
    pub fn share(&self, measure: Measure, parent: &str, child: &str) -> f64 {
        self.shares
            .get(&measure)
            .and_then(|parents| parents.get(parent))
            .and_then(|children| children.get(child))
            .copied()
            .unwrap_or(0.0)
    }

    /// Children of `parent` with a non-zero share.
    pub fn children(&self, measure: Measure, parent: &str) -> Vec<(&str, f64)> {
        self.shares
            .get(&measure)
            .and_then(|parents| parents.get(parent))
            .map(|children| {
                children
                    .iter()
                    .map(|(name, share)| (name.as_str(), *share))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Sum of the shares recorded for `parent`.
    pub fn parent_sum(&self, measure: Measure, parent: &str) -> f64 {
        self.children(measure, parent).iter().map(|(_, s)| s).sum()
    }
}
