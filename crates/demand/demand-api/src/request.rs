//! Forecast requests and their validated plans.

use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use demand_spi::{Dimension, ForecastError, Metric, RecordFilter, Result};

use crate::config::EngineConfig;

fn default_metric() -> String {
    Metric::default().to_string()
}

/// Horizon overrides for the independent dimensions.
///
/// An absent override uses the request's `horizon_weeks`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HorizonOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sector: Option<i64>,
}

/// A forecast request as received from a caller.
///
/// Values are kept as supplied; [`ForecastRequest::plan`] validates them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRequest {
    /// Weeks to forecast for the state/dealer/location hierarchy
    pub horizon_weeks: i64,
    /// `enquiries`, `order_value` or `both`
    #[serde(default = "default_metric")]
    pub metric: String,
    #[serde(default)]
    pub filter: RecordFilter,
    #[serde(default)]
    pub horizons: HorizonOverrides,
    /// Reference date: forecast weeks start at the week containing it
    pub as_of: NaiveDate,
}

impl ForecastRequest {
    /// A request for `horizon_weeks` of both measures, as of today (UTC).
    pub fn new(horizon_weeks: i64) -> Self {
        Self {
            horizon_weeks,
            metric: default_metric(),
            filter: RecordFilter::default(),
            horizons: HorizonOverrides::default(),
            as_of: Utc::now().date_naive(),
        }
    }

    pub fn metric(mut self, metric: impl Into<String>) -> Self {
        self.metric = metric.into();
        self
    }

    pub fn filter(mut self, filter: RecordFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn range_horizon(mut self, weeks: i64) -> Self {
        self.horizons.range = Some(weeks);
        self
    }

    pub fn sector_horizon(mut self, weeks: i64) -> Self {
        self.horizons.sector = Some(weeks);
        self
    }

    pub fn as_of(mut self, date: NaiveDate) -> Self {
        self.as_of = date;
        self
    }

    /// Validate the request against `config`.
    ///
    /// Without a caller date range the effective filter starts
    /// `trailing_window_weeks` before `as_of`.
    pub fn plan(&self, config: &EngineConfig) -> Result<ForecastPlan> {
        config.validate()?;

        let hierarchy_horizon = non_negative("horizon_weeks", self.horizon_weeks)?;
        let range_horizon = match self.horizons.range {
            Some(weeks) => non_negative("range_horizon_weeks", weeks)?,
            None => hierarchy_horizon,
        };
        let sector_horizon = match self.horizons.sector {
            Some(weeks) => non_negative("sector_horizon_weeks", weeks)?,
            None => hierarchy_horizon,
        };
        let metric: Metric = self.metric.parse()?;

        if let (Some(start), Some(end)) = (self.filter.start_date, self.filter.end_date) {
            if start > end {
                return Err(ForecastError::invalid(
                    "date_range",
                    format!("start date {} is after end date {}", start, end),
                ));
            }
        }

        let filter = if self.filter.has_date_range() {
            self.filter.clone()
        } else {
            let start = weeks_before(self.as_of, config.trailing_window_weeks);
            self.filter.clone().between(Some(start), None)
        };

        Ok(ForecastPlan {
            hierarchy_horizon,
            range_horizon,
            sector_horizon,
            metric,
            filter,
            as_of: self.as_of,
            proportion_window_weeks: config.proportion_window_weeks,
        })
    }
}

fn non_negative(name: &str, weeks: i64) -> Result<usize> {
    usize::try_from(weeks)
        .map_err(|_| ForecastError::invalid(name, format!("must be >= 0, got {}", weeks)))
}

/// `weeks` before `date`, saturating at the earliest representable date.
fn weeks_before(date: NaiveDate, weeks: usize) -> NaiveDate {
    i64::try_from(weeks)
        .ok()
        .and_then(Duration::try_weeks)
        .and_then(|span| date.checked_sub_signed(span))
        .unwrap_or(NaiveDate::MIN)
}

/// A validated request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPlan {
    pub hierarchy_horizon: usize,
    pub range_horizon: usize,
    pub sector_horizon: usize,
    pub metric: Metric,
    /// Filter for the snapshot query, date window applied
    pub filter: RecordFilter,
    pub as_of: NaiveDate,
    pub proportion_window_weeks: usize,
}

impl ForecastPlan {
    /// Horizon used for a dimension.
    pub fn horizon(&self, dimension: Dimension) -> usize {
        match dimension {
            Dimension::CapacityRange => self.range_horizon,
            Dimension::Sector => self.sector_horizon,
            _ => self.hierarchy_horizon,
        }
    }

    /// The snapshot filter restricted to the proportion window, which ends
    /// at the filter's end date (or `as_of` when open-ended).
    pub fn proportion_filter(&self) -> RecordFilter {
        let anchor = self.filter.end_date.unwrap_or(self.as_of);
        let cutoff = weeks_before(anchor, self.proportion_window_weeks);
        let start = match self.filter.start_date {
            Some(start) if start > cutoff => start,
            _ => cutoff,
        };
        self.filter.clone().between(Some(start), self.filter.end_date)
    }
}
