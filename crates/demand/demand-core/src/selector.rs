//! Bounded seasonal ARIMA model selection

use tracing::{debug, warn};

use demand_api::SelectorConfig;
use demand_spi::{
    CandidateModel, FitMetrics, FitOutcome, ForecastError, ModelSelector, Result, SarimaOrder,
    SeasonalModelFitter, TimeSeries,
};

use crate::metrics::{mae, mape, rmse};
use crate::sarima::ConditionalSarimaFitter;

/// Tries each configured order once under its own deadline and keeps the
/// lowest AIC.
///
/// A candidate that fails, times out or reports a non-finite AIC is
/// discarded and never retried.
#[derive(Debug, Clone)]
pub struct SarimaSelector<F = ConditionalSarimaFitter> {
    config: SelectorConfig,
    min_weeks: usize,
    fitter: F,
}

impl SarimaSelector<ConditionalSarimaFitter> {
    /// Create a selector using the bundled fitter
    pub fn new(config: SelectorConfig) -> Self {
        let fitter = ConditionalSarimaFitter::new(config.max_iterations);
        Self {
            config,
            min_weeks: 12,
            fitter,
        }
    }

    /// Create a selector with default configuration
    pub fn with_defaults() -> Self {
        Self::new(SelectorConfig::default())
    }
}

impl<F: SeasonalModelFitter> SarimaSelector<F> {
    /// Create a selector around a custom fitter
    pub fn with_fitter(config: SelectorConfig, fitter: F) -> Self {
        Self {
            config,
            min_weeks: 12,
            fitter,
        }
    }

    /// Set the series length below which no fit is attempted
    pub fn min_weeks(mut self, weeks: usize) -> Self {
        self.min_weeks = weeks;
        self
    }

    pub fn config(&self) -> &SelectorConfig {
        &self.config
    }

    pub fn fitter(&self) -> &F {
        &self.fitter
    }

    fn evaluate(&self, values: &[f64], order: &SarimaOrder, horizon: usize) -> Result<CandidateModel> {
        let deadline = self.config.start_deadline();
        let fitted = self.fitter.fit(values, order, horizon, &deadline)?;
        deadline.check()?;

        if fitted.forecast.len() != horizon {
            return Err(ForecastError::FitError(format!(
                "expected {} forecast values, got {}",
                horizon,
                fitted.forecast.len()
            )));
        }
        if fitted.fitted.is_empty() || fitted.fitted.len() > values.len() {
            return Err(ForecastError::FitError(format!(
                "{} fitted values for {} observations",
                fitted.fitted.len(),
                values.len()
            )));
        }
        if !fitted.aic.is_finite() {
            return Err(ForecastError::NumericalError("non-finite AIC".to_string()));
        }

        let actual = &values[values.len() - fitted.fitted.len()..];
        let metrics = FitMetrics {
            mae: mae(actual, &fitted.fitted),
            rmse: rmse(actual, &fitted.fitted),
            mape: mape(actual, &fitted.fitted),
            aic: fitted.aic,
        };

        Ok(CandidateModel {
            name: fitted.order.to_string(),
            order: fitted.order,
            forecast: fitted.forecast,
            metrics,
        })
    }
}

impl<F: SeasonalModelFitter> ModelSelector for SarimaSelector<F> {
    fn select(&self, series: &TimeSeries, horizon: usize) -> FitOutcome {
        if series.len() < self.min_weeks {
            return FitOutcome::Insufficient {
                required: self.min_weeks,
                actual: series.len(),
            };
        }

        let key = series.key();
        let mut candidates: Vec<CandidateModel> = Vec::new();
        let mut failures: Vec<String> = Vec::new();

        for order in &self.config.candidate_orders() {
            match self.evaluate(series.values(), order, horizon) {
                Ok(candidate) => {
                    debug!(%key, model = %candidate.name, aic = candidate.metrics.aic, "Candidate fitted");
                    candidates.push(candidate);
                }
                Err(err @ ForecastError::DeadlineExceeded { .. }) => {
                    warn!(%key, %order, error = %err, "Candidate discarded after deadline");
                    failures.push(format!("{}: {}", order, err));
                }
                Err(err) => {
                    debug!(%key, %order, error = %err, "Candidate failed");
                    failures.push(format!("{}: {}", order, err));
                }
            }
        }

        candidates.sort_by(|a, b| {
            a.metrics
                .aic
                .partial_cmp(&b.metrics.aic)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        match candidates.into_iter().next() {
            Some(best) => FitOutcome::Fitted(best),
            None => FitOutcome::Failed(failures.join("; ")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use demand_spi::{Deadline, Dimension, FittedModel, GroupKey, Measure};
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn series(values: &[f64]) -> TimeSeries {
        let start = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        let weekly: BTreeMap<NaiveDate, f64> = values
            .iter()
            .enumerate()
            .map(|(i, v)| (start + chrono::Duration::weeks(i as i64), *v))
            .collect();
        TimeSeries::from_weekly(GroupKey::new(Dimension::State, "Alpha"), Measure::Enquiries, weekly)
    }

    fn alpha() -> TimeSeries {
        series(&[10.0, 12.0, 11.0, 13.0, 14.0, 12.0, 15.0, 13.0, 14.0, 16.0, 15.0, 14.0])
    }

    /// Always fails, counting its calls.
    #[derive(Default)]
    struct FailingFitter {
        calls: AtomicUsize,
    }

    impl SeasonalModelFitter for FailingFitter {
        fn fit(&self, _: &[f64], _: &SarimaOrder, _: usize, _: &Deadline) -> Result<FittedModel> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(ForecastError::FitError("did not converge".to_string()))
        }
    }

    /// Perfect in-sample fit with an AIC chosen per order.
    struct ScriptedFitter;

    impl SeasonalModelFitter for ScriptedFitter {
        fn fit(&self, data: &[f64], order: &SarimaOrder, horizon: usize, _: &Deadline) -> Result<FittedModel> {
            if order.p == 1 && order.d == 0 {
                return Err(ForecastError::NumericalError("singular".to_string()));
            }
            Ok(FittedModel {
                order: order.without_seasonal(),
                forecast: vec![order.q as f64 * 100.0; horizon],
                fitted: data[1..].to_vec(),
                aic: 10.0 * (order.p + order.q) as f64,
            })
        }
    }

    /// Sleeps past any small budget.
    struct SlowFitter;

    impl SeasonalModelFitter for SlowFitter {
        fn fit(&self, data: &[f64], order: &SarimaOrder, horizon: usize, _: &Deadline) -> Result<FittedModel> {
            std::thread::sleep(Duration::from_millis(20));
            Ok(FittedModel {
                order: *order,
                forecast: vec![1.0; horizon],
                fitted: data.to_vec(),
                aic: 1.0,
            })
        }
    }

    #[test]
    fn test_short_series_is_insufficient() {
        let fitter = FailingFitter::default();
        let selector = SarimaSelector::with_fitter(SelectorConfig::default(), fitter);
        let outcome = selector.select(&series(&[1.0; 11]), 2);
        assert_eq!(
            outcome,
            FitOutcome::Insufficient {
                required: 12,
                actual: 11
            }
        );
        assert_eq!(selector.fitter().calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_all_candidates_failing() {
        let selector = SarimaSelector::with_fitter(SelectorConfig::default(), FailingFitter::default());
        let outcome = selector.select(&alpha(), 2);
        match outcome {
            FitOutcome::Failed(reason) => assert!(reason.contains("did not converge")),
            other => panic!("expected failure, got {:?}", other),
        }
        // Each candidate tried exactly once
        assert_eq!(selector.fitter().calls.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_lowest_aic_wins() {
        let selector = SarimaSelector::with_fitter(SelectorConfig::default(), ScriptedFitter);
        let model = selector.select(&alpha(), 3).into_model().unwrap();
        // (1,1,1): 20, (0,1,1): 10, (1,1,0): 10, (1,0,1): error
        assert_eq!(model.name, "SARIMA(0,1,1)x(0,0,0,0)");
        assert_eq!(model.forecast, vec![100.0; 3]);
        assert_eq!(model.metrics.aic, 10.0);
        assert_eq!(model.metrics.mae, 0.0);
        assert_eq!(model.confidence(), demand_spi::ConfidenceTier::High);
    }

    #[test]
    fn test_timed_out_candidates_are_discarded() {
        let config = SelectorConfig::default().deadline_secs(0.005);
        let selector = SarimaSelector::with_fitter(config, SlowFitter);
        assert!(matches!(selector.select(&alpha(), 2), FitOutcome::Failed(_)));
    }

    /// Records the seasonal period of every order it is asked to fit.
    #[derive(Default)]
    struct PeriodRecorder {
        periods: std::sync::Mutex<Vec<usize>>,
    }

    impl SeasonalModelFitter for PeriodRecorder {
        fn fit(&self, _: &[f64], order: &SarimaOrder, _: usize, _: &Deadline) -> Result<FittedModel> {
            self.periods.lock().unwrap().push(order.period);
            Err(ForecastError::FitError("not needed".to_string()))
        }
    }

    #[test]
    fn test_seasonal_period_reaches_the_fitter() {
        let config = SelectorConfig {
            seasonal_period: 12,
            ..SelectorConfig::default()
        };
        let selector = SarimaSelector::with_fitter(config, PeriodRecorder::default());
        selector.select(&alpha(), 2);

        let periods = selector.fitter().periods.lock().unwrap().clone();
        assert_eq!(periods.len(), 4);
        assert!(periods.iter().all(|&p| p == 12), "{:?}", periods);
    }

    #[test]
    fn test_bundled_fitter_on_short_history() {
        let selector = SarimaSelector::with_defaults();
        let model = selector.select(&alpha(), 2).into_model().unwrap();
        assert!(model.name.ends_with("x(0,0,0,0)"), "{}", model.name);
        assert_eq!(model.forecast.len(), 2);
        assert!(model.metrics.mape.is_finite());
        assert!(model.forecast.iter().all(|v| v.is_finite()));
    }
}
