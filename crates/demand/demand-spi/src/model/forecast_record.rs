//! Forecast output records.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::dimension::{Dimension, GroupKey};
use super::observation::Measure;

/// Coarse reliability bucket of a forecast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceTier {
    Low,
    Medium,
    High,
}

impl ConfidenceTier {
    /// Tier from MAPE (percent): < 15 high, < 30 medium, otherwise low.
    /// An undefined MAPE is low.
    pub fn from_mape(mape: f64) -> Self {
        if mape < 15.0 {
            ConfidenceTier::High
        } else if mape < 30.0 {
            ConfidenceTier::Medium
        } else {
            ConfidenceTier::Low
        }
    }

    /// Ordinal score: high = 3, medium = 2, low = 1.
    pub fn score(&self) -> u8 {
        match self {
            ConfidenceTier::Low => 1,
            ConfidenceTier::Medium => 2,
            ConfidenceTier::High => 3,
        }
    }

    /// Tier of an averaged ordinal score: >= 2.5 high, >= 1.5 medium.
    pub fn from_average_score(score: f64) -> Self {
        if score >= 2.5 {
            ConfidenceTier::High
        } else if score >= 1.5 {
            ConfidenceTier::Medium
        } else {
            ConfidenceTier::Low
        }
    }

    /// Overall tier of a set of tiers; low when empty.
    pub fn average<I: IntoIterator<Item = ConfidenceTier>>(tiers: I) -> Self {
        let (sum, n) = tiers
            .into_iter()
            .fold((0u32, 0u32), |(sum, n), t| (sum + t.score() as u32, n + 1));
        if n == 0 {
            return ConfidenceTier::Low;
        }
        Self::from_average_score(sum as f64 / n as f64)
    }
}

impl fmt::Display for ConfidenceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfidenceTier::Low => f.write_str("low"),
            ConfidenceTier::Medium => f.write_str("medium"),
            ConfidenceTier::High => f.write_str("high"),
        }
    }
}

/// How a forecast was produced.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ForecastMethod {
    /// A fitted model, by name
    Fitted(String),
    MovingAverage,
    ProportionalAllocation,
    /// Trailing average from raw totals when no series was usable
    SimpleAverage,
}

impl fmt::Display for ForecastMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ForecastMethod::Fitted(name) => f.write_str(name),
            ForecastMethod::MovingAverage => f.write_str("Moving Average"),
            ForecastMethod::ProportionalAllocation => f.write_str("Proportional Allocation"),
            ForecastMethod::SimpleAverage => f.write_str("Simple Average (Fallback)"),
        }
    }
}

/// Forecast for one future week.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekForecast {
    /// ISO year-week label, e.g. `2026-W43`
    pub week: String,
    /// Week start date
    pub date: NaiveDate,
    pub enquiries: Option<u64>,
    pub order_value: Option<f64>,
}

impl WeekForecast {
    pub fn value(&self, measure: Measure) -> Option<f64> {
        match measure {
            Measure::Enquiries => self.enquiries.map(|v| v as f64),
            Measure::OrderValue => self.order_value,
        }
    }
}

/// Forecast for one group key over the horizon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRecord {
    pub key: GroupKey,
    /// Ancestors from the hierarchy root down, e.g. `[state, dealer]` for a location
    pub lineage: Vec<GroupKey>,
    pub weeks: Vec<WeekForecast>,
    pub confidence: ConfidenceTier,
    pub method: ForecastMethod,
    /// Set when the reconciler scaled this record
    pub reconciled: bool,
}

impl ForecastRecord {
    pub fn horizon(&self) -> usize {
        self.weeks.len()
    }

    pub fn ancestor(&self, dimension: Dimension) -> Option<&GroupKey> {
        self.lineage.iter().find(|k| k.dimension() == dimension)
    }

    pub fn total_enquiries(&self) -> u64 {
        self.weeks.iter().filter_map(|w| w.enquiries).sum()
    }

    pub fn total_order_value(&self) -> f64 {
        self.weeks.iter().filter_map(|w| w.order_value).sum()
    }

    pub fn total(&self, measure: Measure) -> f64 {
        match measure {
            Measure::Enquiries => self.total_enquiries() as f64,
            Measure::OrderValue => self.total_order_value(),
        }
    }

    /// Per-week values of `measure`, 0 where the measure is absent.
    pub fn values(&self, measure: Measure) -> Vec<f64> {
        self.weeks
            .iter()
            .map(|w| w.value(measure).unwrap_or(0.0))
            .collect()
    }
}
