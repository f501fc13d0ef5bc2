//! Serializable forecast report.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use demand_spi::{ConfidenceTier, Dimension, ForecastRecord, WeekForecast};

/// One forecast week as reported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastWeek {
    pub week: String,
    pub date: NaiveDate,
    pub forecasted_enquiries: Option<u64>,
    pub forecasted_value: Option<f64>,
}

impl From<&WeekForecast> for ForecastWeek {
    fn from(week: &WeekForecast) -> Self {
        Self {
            week: week.week.clone(),
            date: week.date,
            forecasted_enquiries: week.enquiries,
            forecasted_value: week.order_value,
        }
    }
}

/// Forecast of one group with its hierarchy labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupForecast {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dealer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity_range: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sector: Option<String>,
    pub forecast_weeks: Vec<ForecastWeek>,
    pub total_forecasted_enquiries: u64,
    pub total_forecasted_value: f64,
    pub confidence: ConfidenceTier,
    pub model_used: String,
    pub reconciled: bool,
}

impl GroupForecast {
    /// Label of `dimension`, if this forecast carries it.
    pub fn label(&self, dimension: Dimension) -> Option<&str> {
        match dimension {
            Dimension::State => self.state.as_deref(),
            Dimension::Dealer => self.dealer.as_deref(),
            Dimension::Location => self.location.as_deref(),
            Dimension::CapacityRange => self.capacity_range.as_deref(),
            Dimension::Sector => self.sector.as_deref(),
        }
    }

    fn set_label(&mut self, dimension: Dimension, value: &str) {
        let value = Some(value.to_string());
        match dimension {
            Dimension::State => self.state = value,
            Dimension::Dealer => self.dealer = value,
            Dimension::Location => self.location = value,
            Dimension::CapacityRange => self.capacity_range = value,
            Dimension::Sector => self.sector = value,
        }
    }

    /// Weekly enquiry forecasts, 0 where absent.
    pub fn enquiries(&self) -> Vec<u64> {
        self.forecast_weeks
            .iter()
            .map(|w| w.forecasted_enquiries.unwrap_or(0))
            .collect()
    }
}

impl From<&ForecastRecord> for GroupForecast {
    fn from(record: &ForecastRecord) -> Self {
        let mut group = Self {
            state: None,
            dealer: None,
            location: None,
            capacity_range: None,
            sector: None,
            forecast_weeks: record.weeks.iter().map(ForecastWeek::from).collect(),
            total_forecasted_enquiries: record.total_enquiries(),
            total_forecasted_value: record.total_order_value(),
            confidence: record.confidence,
            model_used: record.method.to_string(),
            reconciled: record.reconciled,
        };
        for ancestor in &record.lineage {
            group.set_label(ancestor.dimension(), ancestor.value());
        }
        group.set_label(record.key.dimension(), record.key.value());
        group
    }
}

/// Totals and counts over the whole report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSummary {
    /// Sum over the state level
    pub total_forecasted_enquiries: u64,
    /// Sum over the state level
    pub total_forecasted_value: f64,
    /// Average of the state tiers
    pub confidence: ConfidenceTier,
    pub num_states: usize,
    pub num_dealers: usize,
    pub num_locations: usize,
    pub num_ranges: usize,
    pub num_sectors: usize,
}

/// The complete response of one forecast request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastReport {
    pub horizon_weeks: usize,
    pub generated_at: DateTime<Utc>,
    pub as_of: NaiveDate,
    pub state_forecast: Vec<GroupForecast>,
    pub dealer_forecast: Vec<GroupForecast>,
    pub location_forecast: Vec<GroupForecast>,
    pub range_forecast: BTreeMap<String, GroupForecast>,
    pub sector_forecast: BTreeMap<String, GroupForecast>,
    pub summary: ForecastSummary,
}

impl ForecastReport {
    /// Assemble a report from per-level records.
    pub fn assemble(
        horizon_weeks: usize,
        as_of: NaiveDate,
        states: &[ForecastRecord],
        dealers: &[ForecastRecord],
        locations: &[ForecastRecord],
        ranges: &[ForecastRecord],
        sectors: &[ForecastRecord],
    ) -> Self {
        let keyed = |records: &[ForecastRecord]| -> BTreeMap<String, GroupForecast> {
            records
                .iter()
                .map(|r| (r.key.value().to_string(), GroupForecast::from(r)))
                .collect()
        };

        let summary = ForecastSummary {
            total_forecasted_enquiries: states.iter().map(ForecastRecord::total_enquiries).sum(),
            total_forecasted_value: states.iter().map(ForecastRecord::total_order_value).sum(),
            confidence: ConfidenceTier::average(states.iter().map(|r| r.confidence)),
            num_states: states.len(),
            num_dealers: dealers.len(),
            num_locations: locations.len(),
            num_ranges: ranges.len(),
            num_sectors: sectors.len(),
        };

        Self {
            horizon_weeks,
            generated_at: Utc::now(),
            as_of,
            state_forecast: states.iter().map(GroupForecast::from).collect(),
            dealer_forecast: dealers.iter().map(GroupForecast::from).collect(),
            location_forecast: locations.iter().map(GroupForecast::from).collect(),
            range_forecast: keyed(ranges),
            sector_forecast: keyed(sectors),
            summary,
        }
    }

    /// State forecast by name.
    pub fn state(&self, name: &str) -> Option<&GroupForecast> {
        self.state_forecast
            .iter()
            .find(|g| g.state.as_deref() == Some(name))
    }

    /// Dealer forecast by name.
    pub fn dealer(&self, name: &str) -> Option<&GroupForecast> {
        self.dealer_forecast
            .iter()
            .find(|g| g.dealer.as_deref() == Some(name))
    }

    /// Location forecast by dealer and name.
    pub fn location(&self, dealer: &str, name: &str) -> Option<&GroupForecast> {
        self.location_forecast.iter().find(|g| {
            g.dealer.as_deref() == Some(dealer) && g.location.as_deref() == Some(name)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use demand_spi::{ForecastMethod, GroupKey};

    fn week(i: i64, enquiries: u64) -> WeekForecast {
        let date = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap() + chrono::Duration::weeks(i);
        WeekForecast {
            week: format!("2026-W{}", 43 + i),
            date,
            enquiries: Some(enquiries),
            order_value: Some(enquiries as f64 * 100.0),
        }
    }

    fn record(key: GroupKey, lineage: Vec<GroupKey>, values: &[u64], tier: ConfidenceTier) -> ForecastRecord {
        ForecastRecord {
            key,
            lineage,
            weeks: values
                .iter()
                .enumerate()
                .map(|(i, v)| week(i as i64, *v))
                .collect(),
            confidence: tier,
            method: ForecastMethod::MovingAverage,
            reconciled: false,
        }
    }

    #[test]
    fn test_group_labels_from_lineage() {
        let location = record(
            GroupKey::new(Dimension::Location, "Pune"),
            vec![
                GroupKey::new(Dimension::State, "Alpha"),
                GroupKey::new(Dimension::Dealer, "D1"),
            ],
            &[3, 4],
            ConfidenceTier::Low,
        );
        let group = GroupForecast::from(&location);
        assert_eq!(group.label(Dimension::State), Some("Alpha"));
        assert_eq!(group.label(Dimension::Dealer), Some("D1"));
        assert_eq!(group.label(Dimension::Location), Some("Pune"));
        assert_eq!(group.label(Dimension::Sector), None);
        assert_eq!(group.total_forecasted_enquiries, 7);
        assert_eq!(group.total_forecasted_value, 700.0);
        assert_eq!(group.model_used, "Moving Average");
        assert_eq!(group.enquiries(), vec![3, 4]);
    }

    #[test]
    fn test_summary_uses_state_level() {
        let states = vec![
            record(GroupKey::new(Dimension::State, "Alpha"), vec![], &[15, 15], ConfidenceTier::High),
            record(GroupKey::new(Dimension::State, "Beta"), vec![], &[5, 5], ConfidenceTier::Low),
        ];
        let dealers = vec![record(
            GroupKey::new(Dimension::Dealer, "D1"),
            vec![GroupKey::new(Dimension::State, "Alpha")],
            &[15, 15],
            ConfidenceTier::Low,
        )];
        let ranges = vec![record(
            GroupKey::new(Dimension::CapacityRange, "15-62.5"),
            vec![],
            &[2, 2],
            ConfidenceTier::Low,
        )];
        let as_of = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let report = ForecastReport::assemble(2, as_of, &states, &dealers, &[], &ranges, &[]);

        assert_eq!(report.summary.total_forecasted_enquiries, 40);
        assert_eq!(report.summary.confidence, ConfidenceTier::Medium);
        assert_eq!(report.summary.num_states, 2);
        assert_eq!(report.summary.num_dealers, 1);
        assert_eq!(report.summary.num_locations, 0);
        assert_eq!(report.summary.num_ranges, 1);
        assert!(report.range_forecast.contains_key("15-62.5"));
        assert_eq!(report.dealer("D1").unwrap().state.as_deref(), Some("Alpha"));
        assert!(report.state("Gamma").is_none());
    }

    #[test]
    fn test_report_json_shape() {
        let states = vec![record(
            GroupKey::new(Dimension::State, "Alpha"),
            vec![],
            &[15],
            ConfidenceTier::Low,
        )];
        let as_of = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let report = ForecastReport::assemble(1, as_of, &states, &[], &[], &[], &[]);
        let json = serde_json::to_value(&report).unwrap();

        let alpha = &json["state_forecast"][0];
        assert_eq!(alpha["state"], "Alpha");
        assert!(alpha.get("dealer").is_none());
        assert_eq!(alpha["forecast_weeks"][0]["week"], "2026-W43");
        assert_eq!(alpha["forecast_weeks"][0]["date"], "2026-10-19");
        assert_eq!(alpha["forecast_weeks"][0]["forecasted_enquiries"], 15);
        assert_eq!(alpha["confidence"], "low");
        assert_eq!(json["summary"]["num_states"], 1);
        assert_eq!(json["as_of"], "2026-10-19");
    }

    #[test]
    fn test_empty_report() {
        let as_of = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let report = ForecastReport::assemble(0, as_of, &[], &[], &[], &[], &[]);
        assert_eq!(report.summary.total_forecasted_enquiries, 0);
        assert_eq!(report.summary.confidence, ConfidenceTier::Low);
    }
}
