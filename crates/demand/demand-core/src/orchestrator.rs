//! Hierarchy orchestration: state → dealer → location, plus the
//! independent capacity-range and sector forecasts.

use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, warn};

use demand_api::{EngineConfig, ForecastPlan, ForecastReport, ForecastRequest};
use demand_spi::{
    ConfidenceTier, Dimension, FitOutcome, ForecastMethod, ForecastRecord, GroupKey, GroupSeries,
    Measure, ModelSelector, ObservationRecord, ObservationSource, ProportionTable, RecordFilter, Result,
    TimeSeries, WeekForecast,
};

use crate::calendar::forecast_weeks;
use crate::fallback::{simple_average, MovingAverageFallback};
use crate::proportion::ProportionAllocator;
use crate::reconcile::Reconciler;
use crate::selector::SarimaSelector;
use crate::series_builder::SeriesBuilder;

/// Forecast of one measure before it is rounded into weeks.
#[derive(Debug, Clone, PartialEq)]
struct MeasureForecast {
    values: Vec<f64>,
    confidence: ConfidenceTier,
    method: ForecastMethod,
}

impl MeasureForecast {
    fn low(values: Vec<f64>, method: ForecastMethod) -> Self {
        Self {
            values,
            confidence: ConfidenceTier::Low,
            method,
        }
    }
}

/// Forecast records of every level, before conversion to a report.
#[derive(Debug, Clone, PartialEq)]
pub struct HierarchyForecast {
    pub plan: ForecastPlan,
    pub states: Vec<ForecastRecord>,
    pub dealers: Vec<ForecastRecord>,
    pub locations: Vec<ForecastRecord>,
    pub ranges: Vec<ForecastRecord>,
    pub sectors: Vec<ForecastRecord>,
}

impl HierarchyForecast {
    /// Records of one level.
    pub fn level(&self, dimension: Dimension) -> &[ForecastRecord] {
        match dimension {
            Dimension::State => &self.states,
            Dimension::Dealer => &self.dealers,
            Dimension::Location => &self.locations,
            Dimension::CapacityRange => &self.ranges,
            Dimension::Sector => &self.sectors,
        }
    }

    /// Record of `value` at `dimension`, first match.
    pub fn find(&self, dimension: Dimension, value: &str) -> Option<&ForecastRecord> {
        self.level(dimension).iter().find(|r| r.key.value() == value)
    }

    pub fn report(&self) -> ForecastReport {
        ForecastReport::assemble(
            self.plan.hierarchy_horizon,
            self.plan.as_of,
            &self.states,
            &self.dealers,
            &self.locations,
            &self.ranges,
            &self.sectors,
        )
    }
}

/// The forecasting engine.
///
/// Each request reads a fresh snapshot from the source. Only parameter errors
/// and a failure of the top-level snapshot query reach the caller; per-parent
/// failures are logged and the affected children omitted.
pub struct HierarchicalForecaster<S, M = SarimaSelector> {
    source: S,
    selector: M,
    config: EngineConfig,
}

impl<S: ObservationSource> HierarchicalForecaster<S, SarimaSelector> {
    /// Create an engine using the bundled seasonal ARIMA selector
    pub fn new(source: S, config: EngineConfig) -> Self {
        let selector =
            SarimaSelector::new(config.selector.clone()).min_weeks(config.min_model_weeks);
        Self {
            source,
            selector,
            config,
        }
    }
}

impl<S: ObservationSource, M: ModelSelector> HierarchicalForecaster<S, M> {
    /// Create an engine around a custom selector
    pub fn with_selector(source: S, selector: M, config: EngineConfig) -> Self {
        Self {
            source,
            selector,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Validate `request` and produce the report.
    pub fn forecast(&self, request: &ForecastRequest) -> Result<ForecastReport> {
        let plan = request.plan(&self.config)?;
        Ok(self.run(&plan)?.report())
    }

    /// Forecast every level for a validated plan.
    pub fn run(&self, plan: &ForecastPlan) -> Result<HierarchyForecast> {
        self.config.validate()?;

        let records = self.source.query(&plan.filter)?;
        info!(
            records = records.len(),
            horizon = plan.hierarchy_horizon,
            metric = %plan.metric,
            "Starting hierarchical forecast"
        );

        let states = self.forecast_flat(&records, Dimension::State, plan);
        let dealers = self.forecast_children(&states, Dimension::Dealer, plan);
        let locations = self.forecast_children(&dealers, Dimension::Location, plan);
        let ranges = self.forecast_flat(&records, Dimension::CapacityRange, plan);
        let sectors = self.forecast_flat(&records, Dimension::Sector, plan);

        info!(
            states = states.len(),
            dealers = dealers.len(),
            locations = locations.len(),
            ranges = ranges.len(),
            sectors = sectors.len(),
            "Hierarchical forecast complete"
        );

        Ok(HierarchyForecast {
            plan: plan.clone(),
            states,
            dealers,
            locations,
            ranges,
            sectors,
        })
    }

    fn series_builder(&self, plan: &ForecastPlan) -> SeriesBuilder {
        SeriesBuilder::new(self.config.min_series_weeks).since(plan.filter.start_date)
    }

    /// Model forecast when the series is long enough and a candidate fits,
    /// `None` otherwise.
    fn fit(&self, series: &TimeSeries, horizon: usize) -> Option<MeasureForecast> {
        if series.len() < self.config.min_model_weeks {
            return None;
        }
        match self.selector.select(series, horizon) {
            FitOutcome::Fitted(model) => Some(MeasureForecast {
                confidence: model.confidence(),
                method: ForecastMethod::Fitted(model.name),
                values: model.forecast,
            }),
            FitOutcome::Insufficient { required, actual } => {
                debug!(key = %series.key(), required, actual, "Not enough weeks to fit");
                None
            }
            FitOutcome::Failed(reason) => {
                info!(
                    key = %series.key(),
                    measure = %series.measure(),
                    %reason,
                    "No candidate fitted"
                );
                None
            }
        }
    }

    /// Forecast a series on its own: fitted model, else moving average.
    fn forecast_series(&self, series: &TimeSeries, horizon: usize) -> MeasureForecast {
        self.fit(series, horizon).unwrap_or_else(|| {
            let fallback = MovingAverageFallback::new(self.config.fallback_window);
            MeasureForecast::low(fallback.forecast(series, horizon), ForecastMethod::MovingAverage)
        })
    }

    /// Forecast a level without a parent.
    fn forecast_flat(
        &self,
        records: &[ObservationRecord],
        dimension: Dimension,
        plan: &ForecastPlan,
    ) -> Vec<ForecastRecord> {
        let horizon = plan.horizon(dimension);
        let series = self.series_builder(plan).build(records, dimension, plan.metric);

        if series.is_empty() {
            if !records.is_empty() {
                warn!(%dimension, "No usable weekly series, using simple averages");
            }
            return self.simple_average_records(records, dimension, plan);
        }

        series
            .iter()
            .map(|group| {
                let per_measure = plan
                    .metric
                    .measures()
                    .iter()
                    .filter_map(|&m| {
                        group
                            .series(m)
                            .map(|ts| (m, self.forecast_series(ts, horizon)))
                    })
                    .collect();
                build_record(group.key.clone(), Vec::new(), per_measure, plan, horizon)
            })
            .collect()
    }

    fn simple_average_records(
        &self,
        records: &[ObservationRecord],
        dimension: Dimension,
        plan: &ForecastPlan,
    ) -> Vec<ForecastRecord> {
        let horizon = plan.horizon(dimension);
        simple_average(records, dimension, plan.metric)
            .into_iter()
            .map(|estimate| {
                let per_measure = plan
                    .metric
                    .measures()
                    .iter()
                    .map(|&m| {
                        let values = vec![estimate.weekly(m); horizon];
                        (m, MeasureForecast::low(values, ForecastMethod::SimpleAverage))
                    })
                    .collect();
                build_record(estimate.key, Vec::new(), per_measure, plan, horizon)
            })
            .collect()
    }

    /// Forecast the children of every parent record and reconcile them.
    fn forecast_children(
        &self,
        parents: &[ForecastRecord],
        child: Dimension,
        plan: &ForecastPlan,
    ) -> Vec<ForecastRecord> {
        let Some(allocator) = ProportionAllocator::for_child(child) else {
            return Vec::new();
        };
        if parents.is_empty() {
            return Vec::new();
        }

        let mut forecasts = Vec::new();
        for parent in parents {
            match self.forecast_parent(parent, child, &allocator, plan) {
                Ok(children) => forecasts.extend(children),
                Err(err) => {
                    warn!(parent = %parent.key, %child, error = %err, "Skipping children");
                }
            }
        }
        forecasts
    }

    fn forecast_parent(
        &self,
        parent: &ForecastRecord,
        child: Dimension,
        allocator: &ProportionAllocator,
        plan: &ForecastPlan,
    ) -> Result<Vec<ForecastRecord>> {
        let records = self.source.query(&path_filter(&plan.filter, parent))?;
        let horizon = parent.horizon();

        // Shares come from the parent's own path only: the same dealer name
        // may exist under several states.
        let table = match self.source.query(&path_filter(&plan.proportion_filter(), parent)) {
            Ok(history) => allocator.table(&history, plan.metric),
            Err(err) => {
                warn!(parent = %parent.key, %child, error = %err, "Proportion query failed, allocation disabled");
                ProportionTable::default()
            }
        };

        let series: BTreeMap<GroupKey, GroupSeries> = self
            .series_builder(plan)
            .build(&records, child, plan.metric)
            .into_iter()
            .map(|group| (group.key.clone(), group))
            .collect();
        let children: BTreeSet<GroupKey> = records
            .iter()
            .map(|r| r.group_key(child))
            .filter(|key| !key.is_unknown())
            .collect();

        let mut lineage = parent.lineage.clone();
        lineage.push(parent.key.clone());

        let mut forecasts = Vec::new();
        for key in children {
            let mut per_measure = BTreeMap::new();
            for &measure in plan.metric.measures() {
                let own = series.get(&key).and_then(|group| group.series(measure));
                let forecast = own.and_then(|ts| self.fit(ts, horizon)).or_else(|| {
                    allocator
                        .allocate(
                            &table,
                            measure,
                            parent.key.value(),
                            key.value(),
                            &parent.values(measure),
                        )
                        .map(|values| {
                            MeasureForecast::low(values, ForecastMethod::ProportionalAllocation)
                        })
                });
                if let Some(forecast) = forecast {
                    per_measure.insert(measure, forecast);
                }
            }

            if per_measure.is_empty() {
                debug!(%key, parent = %parent.key, "Excluding child without historical share");
                continue;
            }
            forecasts.push(build_record(key, lineage.clone(), per_measure, plan, horizon));
        }

        let reconciler = Reconciler::new(self.config.reconcile_tolerance);
        Ok(reconciler.reconcile(parent, &forecasts, plan.metric))
    }
}

/// `base` restricted to the parent's full path (its lineage and itself).
fn path_filter(base: &RecordFilter, parent: &ForecastRecord) -> RecordFilter {
    parent
        .lineage
        .iter()
        .chain(std::iter::once(&parent.key))
        .fold(base.clone(), |filter, key| {
            filter.narrowed(key.dimension(), key.value())
        })
}

/// Enquiry counts are whole, non-negative and rounded half away from zero.
fn round_count(value: f64) -> u64 {
    if value.is_finite() {
        value.max(0.0).round() as u64
    } else {
        0
    }
}

fn clamp_value(value: f64) -> f64 {
    if value.is_finite() {
        value.max(0.0)
    } else {
        0.0
    }
}

/// Assemble a record from per-measure forecasts.
///
/// Confidence is the better of the measure tiers; the method comes from the
/// plan's primary measure.
fn build_record(
    key: GroupKey,
    lineage: Vec<GroupKey>,
    per_measure: BTreeMap<Measure, MeasureForecast>,
    plan: &ForecastPlan,
    horizon: usize,
) -> ForecastRecord {
    let at = |measure: Measure, i: usize| -> Option<f64> {
        per_measure
            .get(&measure)
            .map(|f| f.values.get(i).copied().unwrap_or(0.0))
    };

    let weeks = forecast_weeks(plan.as_of, horizon)
        .into_iter()
        .enumerate()
        .map(|(i, (week, date))| WeekForecast {
            week,
            date,
            enquiries: at(Measure::Enquiries, i).map(round_count),
            order_value: at(Measure::OrderValue, i).map(clamp_value),
        })
        .collect();

    let confidence = per_measure
        .values()
        .map(|f| f.confidence)
        .max()
        .unwrap_or(ConfidenceTier::Low);
    let method = per_measure
        .get(&plan.metric.primary())
        .or_else(|| per_measure.values().next())
        .map(|f| f.method.clone())
        .unwrap_or(ForecastMethod::MovingAverage);

    ForecastRecord {
        key,
        lineage,
        weeks,
        confidence,
        method,
        reconciled: false,
    }
}
