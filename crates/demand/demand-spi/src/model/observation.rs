//! Observation records and the measures aggregated from them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::dimension::{normalize_label, Dimension, GroupKey};
use crate::error::ForecastError;

/// A numeric measure aggregated per week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Measure {
    /// Number of enquiries (each record counts 1)
    Enquiries,
    /// Sum of order value
    OrderValue,
}

impl fmt::Display for Measure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Measure::Enquiries => f.write_str("enquiries"),
            Measure::OrderValue => f.write_str("order_value"),
        }
    }
}

/// Metric selector of a forecast request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Enquiries,
    OrderValue,
    #[default]
    Both,
}

impl Metric {
    /// Measures covered by this selector, enquiries first.
    pub fn measures(&self) -> &'static [Measure] {
        match self {
            Metric::Enquiries => &[Measure::Enquiries],
            Metric::OrderValue => &[Measure::OrderValue],
            Metric::Both => &[Measure::Enquiries, Measure::OrderValue],
        }
    }

    pub fn includes(&self, measure: Measure) -> bool {
        self.measures().contains(&measure)
    }

    /// The measure that decides the reported method of a forecast.
    pub fn primary(&self) -> Measure {
        match self {
            Metric::OrderValue => Measure::OrderValue,
            _ => Measure::Enquiries,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Enquiries => f.write_str("enquiries"),
            Metric::OrderValue => f.write_str("order_value"),
            Metric::Both => f.write_str("both"),
        }
    }
}

impl FromStr for Metric {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "enquiries" => Ok(Metric::Enquiries),
            "order_value" => Ok(Metric::OrderValue),
            "both" => Ok(Metric::Both),
            other => Err(ForecastError::invalid(
                "metric",
                format!("expected enquiries, order_value or both, got '{}'", other),
            )),
        }
    }
}

/// One enquiry event as exposed by the data store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationRecord {
    pub date: NaiveDate,
    pub state: String,
    pub dealer: String,
    pub location: String,
    pub capacity_range: String,
    pub sector: String,
    /// Monetary order value, never negative
    pub order_value: f64,
}

impl ObservationRecord {
    /// A record on `date` with every dimension blank and zero order value.
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            state: String::new(),
            dealer: String::new(),
            location: String::new(),
            capacity_range: String::new(),
            sector: String::new(),
            order_value: 0.0,
        }
    }

    /// Set one dimension value.
    pub fn with(mut self, dimension: Dimension, value: impl Into<String>) -> Self {
        let value = value.into();
        match dimension {
            Dimension::State => self.state = value,
            Dimension::Dealer => self.dealer = value,
            Dimension::Location => self.location = value,
            Dimension::CapacityRange => self.capacity_range = value,
            Dimension::Sector => self.sector = value,
        }
        self
    }

    /// Set the order value; negative or non-finite values are stored as 0.
    pub fn with_order_value(mut self, value: f64) -> Self {
        self.order_value = if value.is_finite() { value.max(0.0) } else { 0.0 };
        self
    }

    /// Raw value of a dimension as stored.
    pub fn raw(&self, dimension: Dimension) -> &str {
        match dimension {
            Dimension::State => &self.state,
            Dimension::Dealer => &self.dealer,
            Dimension::Location => &self.location,
            Dimension::CapacityRange => &self.capacity_range,
            Dimension::Sector => &self.sector,
        }
    }

    /// Normalized value of a dimension.
    pub fn label(&self, dimension: Dimension) -> String {
        normalize_label(self.raw(dimension))
    }

    pub fn group_key(&self, dimension: Dimension) -> GroupKey {
        GroupKey::new(dimension, self.raw(dimension))
    }

    /// Always 1: every record is one enquiry.
    pub fn count(&self) -> f64 {
        1.0
    }

    pub fn measure(&self, measure: Measure) -> f64 {
        match measure {
            Measure::Enquiries => self.count(),
            Measure::OrderValue => self.order_value,
        }
    }
}
