//! Engine and selector configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use demand_spi::{Deadline, ForecastError, Result, SarimaOrder};

/// Most candidate orders a selector may try per series.
const MAX_CANDIDATES: usize = 4;

/// Longest per-candidate budget accepted (one day).
const MAX_DEADLINE_SECS: f64 = 86_400.0;

/// Longest history window accepted (a century of weeks).
const MAX_WINDOW_WEEKS: usize = 5_200;

/// Configuration of the per-series model selector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// Candidate orders tried in turn (at most 4); derived from
    /// `seasonal_period` when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidates: Option<Vec<SarimaOrder>>,
    /// Seasonal period hint in weeks
    pub seasonal_period: usize,
    /// Wall-clock budget per candidate fit in seconds; 0 disables the budget
    pub deadline_secs: f64,
    /// Maximum estimation passes per fit
    pub max_iterations: usize,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            candidates: None,
            seasonal_period: 52,
            deadline_secs: 30.0,
            max_iterations: 50,
        }
    }
}

impl SelectorConfig {
    /// Replace the candidate orders
    pub fn with_candidates(mut self, candidates: Vec<SarimaOrder>) -> Self {
        self.candidates = Some(candidates);
        self
    }

    /// Set the seasonal period used by the default candidates
    pub fn seasonal_period(mut self, period: usize) -> Self {
        self.seasonal_period = period;
        self
    }

    /// Orders the selector tries: the explicit list, else the defaults
    /// for `seasonal_period`.
    pub fn candidate_orders(&self) -> Vec<SarimaOrder> {
        match &self.candidates {
            Some(orders) => orders.clone(),
            None => SarimaOrder::default_candidates(self.seasonal_period),
        }
    }

    /// Set the per-candidate budget in seconds
    pub fn deadline_secs(mut self, secs: f64) -> Self {
        self.deadline_secs = secs;
        self
    }

    /// Set the maximum estimation passes
    pub fn max_iterations(mut self, iterations: usize) -> Self {
        self.max_iterations = iterations;
        self
    }

    /// Per-candidate budget, `None` when unbounded.
    pub fn budget(&self) -> Option<Duration> {
        if self.deadline_secs > 0.0 {
            Duration::try_from_secs_f64(self.deadline_secs).ok()
        } else {
            None
        }
    }

    /// Start a fresh deadline for one candidate.
    pub fn start_deadline(&self) -> Deadline {
        match self.budget() {
            Some(budget) => Deadline::start(budget),
            None => Deadline::unbounded(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        let candidates = self.candidate_orders();
        if candidates.is_empty() {
            return Err(ForecastError::invalid(
                "candidates",
                "at least one candidate order is required",
            ));
        }
        if candidates.len() > MAX_CANDIDATES {
            return Err(ForecastError::invalid(
                "candidates",
                format!(
                    "at most {} candidate orders, got {}",
                    MAX_CANDIDATES,
                    candidates.len()
                ),
            ));
        }
        if !(0.0..=MAX_DEADLINE_SECS).contains(&self.deadline_secs) {
            return Err(ForecastError::invalid(
                "deadline_secs",
                format!(
                    "must be between 0 and {}, got {}",
                    MAX_DEADLINE_SECS, self.deadline_secs
                ),
            ));
        }
        if self.max_iterations == 0 {
            return Err(ForecastError::invalid("max_iterations", "must be >= 1"));
        }
        Ok(())
    }
}

/// Configuration of the hierarchical forecasting engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub selector: SelectorConfig,
    /// History used when the request has no date range
    pub trailing_window_weeks: usize,
    /// History used to compute child shares
    pub proportion_window_weeks: usize,
    /// Distinct observed weeks for a series to be usable
    pub min_series_weeks: usize,
    /// Weeks needed before model fitting is attempted
    pub min_model_weeks: usize,
    /// Weeks averaged by the moving-average fallback
    pub fallback_window: usize,
    /// Largest parent/child total gap left unreconciled
    pub reconcile_tolerance: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            selector: SelectorConfig::default(),
            trailing_window_weeks: 52,
            proportion_window_weeks: 52,
            min_series_weeks: 2,
            min_model_weeks: 12,
            fallback_window: 4,
            reconcile_tolerance: 0.01,
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the selector configuration
    pub fn with_selector(mut self, selector: SelectorConfig) -> Self {
        self.selector = selector;
        self
    }

    /// Set the default trailing window
    pub fn trailing_window_weeks(mut self, weeks: usize) -> Self {
        self.trailing_window_weeks = weeks;
        self
    }

    /// Set the proportion window
    pub fn proportion_window_weeks(mut self, weeks: usize) -> Self {
        self.proportion_window_weeks = weeks;
        self
    }

    /// Set the model-fitting threshold
    pub fn min_model_weeks(mut self, weeks: usize) -> Self {
        self.min_model_weeks = weeks;
        self
    }

    /// Set the moving-average window
    pub fn fallback_window(mut self, weeks: usize) -> Self {
        self.fallback_window = weeks;
        self
    }

    /// Set the reconciliation tolerance
    pub fn reconcile_tolerance(mut self, tolerance: f64) -> Self {
        self.reconcile_tolerance = tolerance;
        self
    }

    /// Check every field; the first problem is reported as a parameter error.
    pub fn validate(&self) -> Result<()> {
        self.selector.validate()?;

        for (name, weeks) in [
            ("trailing_window_weeks", self.trailing_window_weeks),
            ("proportion_window_weeks", self.proportion_window_weeks),
        ] {
            if !(1..=MAX_WINDOW_WEEKS).contains(&weeks) {
                return Err(ForecastError::invalid(
                    name,
                    format!("must be between 1 and {}, got {}", MAX_WINDOW_WEEKS, weeks),
                ));
            }
        }
        if self.min_series_weeks < 2 {
            return Err(ForecastError::invalid(
                "min_series_weeks",
                format!("must be >= 2, got {}", self.min_series_weeks),
            ));
        }
        if self.min_model_weeks < self.min_series_weeks {
            return Err(ForecastError::invalid(
                "min_model_weeks",
                format!(
                    "must be >= min_series_weeks ({}), got {}",
                    self.min_series_weeks, self.min_model_weeks
                ),
            ));
        }
        if self.fallback_window == 0 {
            return Err(ForecastError::invalid("fallback_window", "must be >= 1"));
        }
        if !self.reconcile_tolerance.is_finite() || self.reconcile_tolerance < 0.0 {
            return Err(ForecastError::invalid(
                "reconcile_tolerance",
                format!("must be a finite value >= 0, got {}", self.reconcile_tolerance),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.trailing_window_weeks, 52);
        assert_eq!(config.proportion_window_weeks, 52);
        assert_eq!(config.min_series_weeks, 2);
        assert_eq!(config.min_model_weeks, 12);
        assert_eq!(config.fallback_window, 4);
        assert_eq!(config.reconcile_tolerance, 0.01);
        assert_eq!(config.selector.candidate_orders(), SarimaOrder::default_candidates(52));
        assert_eq!(config.selector.seasonal_period, 52);
        assert_eq!(config.selector.max_iterations, 50);
        assert_eq!(config.selector.budget(), Some(Duration::from_secs(30)));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_methods() {
        let config = EngineConfig::new()
            .with_selector(SelectorConfig::default().seasonal_period(4).deadline_secs(0.0))
            .fallback_window(2)
            .min_model_weeks(8);

        assert!(config.selector.candidate_orders().iter().all(|c| c.period == 4));
        assert_eq!(config.selector.budget(), None);
        assert!(!config.selector.start_deadline().is_expired());
        assert_eq!(config.fallback_window, 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_too_many_candidates_rejected() {
        let mut candidates = SarimaOrder::default_candidates(52);
        candidates.push(SarimaOrder::new((2, 1, 2), (0, 0, 0, 0)));
        let err = SelectorConfig::default()
            .with_candidates(candidates)
            .validate()
            .unwrap_err();
        assert!(err.is_parameter_error());
        assert!(err.to_string().contains("candidates"));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let bad = [
            EngineConfig::new().fallback_window(0),
            EngineConfig::new().reconcile_tolerance(-1.0),
            EngineConfig::new().reconcile_tolerance(f64::NAN),
            EngineConfig::new().min_model_weeks(1),
            EngineConfig::new().with_selector(SelectorConfig::default().max_iterations(0)),
            EngineConfig::new().with_selector(SelectorConfig::default().deadline_secs(-5.0)),
            EngineConfig::new().with_selector(SelectorConfig::default().with_candidates(Vec::new())),
            EngineConfig::new().with_selector(SelectorConfig::default().deadline_secs(f64::INFINITY)),
            EngineConfig::new().trailing_window_weeks(0),
            EngineConfig::new().proportion_window_weeks(MAX_WINDOW_WEEKS + 1),
        ];
        for config in bad {
            assert!(config.validate().unwrap_err().is_parameter_error());
        }
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"fallback_window": 6, "selector": {"deadline_secs": 5}}"#)
                .unwrap();
        assert_eq!(config.fallback_window, 6);
        assert_eq!(config.min_model_weeks, 12);
        assert_eq!(config.selector.budget(), Some(Duration::from_secs(5)));
        assert_eq!(config.selector.candidate_orders().len(), 4);
    }

    #[test]
    fn test_seasonal_period_from_json_drives_candidates() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"selector": {"seasonal_period": 12}}"#).unwrap();
        let orders = config.selector.candidate_orders();
        assert_eq!(orders, SarimaOrder::default_candidates(12));
        assert!(orders.iter().all(|c| c.period == 12));

        // An explicit list wins over the period
        let explicit = SarimaOrder::new((1, 1, 1), (0, 0, 0, 0));
        let config = SelectorConfig::default()
            .with_candidates(vec![explicit])
            .seasonal_period(4);
        assert_eq!(config.candidate_orders(), vec![explicit]);

        // Derived candidates are not written back out
        let json = serde_json::to_value(SelectorConfig::default()).unwrap();
        assert!(json.get("candidates").is_none());
    }

    #[test]
    fn test_huge_values_rejected_without_panicking() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"selector": {"deadline_secs": 1e30}}"#).unwrap();
        assert_eq!(config.selector.budget(), None);
        assert!(!config.selector.start_deadline().is_expired());
        let err = config.validate().unwrap_err();
        assert!(err.is_parameter_error());
        assert!(err.to_string().contains("deadline_secs"));

        let config: EngineConfig =
            serde_json::from_str(r#"{"trailing_window_weeks": 100000000000000}"#).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("trailing_window_weeks"));

        let at_limit = EngineConfig::new()
            .trailing_window_weeks(MAX_WINDOW_WEEKS)
            .with_selector(SelectorConfig::default().deadline_secs(MAX_DEADLINE_SECS));
        assert!(at_limit.validate().is_ok());
    }
}
