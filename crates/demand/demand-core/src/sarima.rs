//! Seasonal ARIMA fitted by conditional least squares
//!
//! The model `SARIMA(p,d,q)x(P,D,Q,s)` is estimated on the differenced
//! series as a linear regression:
//!
//! - **Differencing**: `D` seasonal differences at lag `s`, then `d` regular ones
//! - **AR terms**: lags `1..=p` and `s, 2s, .., P*s` of the differenced series
//! - **MA terms**: the same lags of the residuals
//!
//! MA terms make the regression depend on its own residuals, so estimation
//! iterates (Hannan-Rissanen): regress, recompute residuals recursively,
//! regress again, until the coefficients settle or the pass limit is hit.
//! The deadline is checked before every pass.

use tracing::debug;

use demand_spi::{Deadline, FittedModel, ForecastError, Result, SarimaOrder, SeasonalModelFitter};

use crate::metrics::gaussian_aic;

/// Coefficient bound keeping the recursions stable.
const COEFF_BOUND: f64 = 0.99;

/// Lags used by the regression.
#[derive(Debug, Clone, PartialEq)]
struct LagStructure {
    ar: Vec<usize>,
    ma: Vec<usize>,
}

impl LagStructure {
    fn from_order(order: &SarimaOrder) -> Self {
        let seasonal = |count: usize| -> Vec<usize> {
            if order.period > 1 {
                (1..=count).map(|k| k * order.period).collect()
            } else {
                Vec::new()
            }
        };
        let merge = |regular: usize, seasonal_lags: Vec<usize>| -> Vec<usize> {
            let mut lags: Vec<usize> = (1..=regular).chain(seasonal_lags).collect();
            lags.sort_unstable();
            lags.dedup();
            lags
        };
        Self {
            ar: merge(order.p, seasonal(order.seasonal_p)),
            ma: merge(order.q, seasonal(order.seasonal_q)),
        }
    }

    fn max_lag(&self) -> usize {
        self.ar
            .last()
            .copied()
            .unwrap_or(0)
            .max(self.ma.last().copied().unwrap_or(0))
    }

    /// Intercept plus one coefficient per lag.
    fn coefficients(&self) -> usize {
        1 + self.ar.len() + self.ma.len()
    }

    /// Regressors for time `t`: intercept, AR lags, MA lags.
    fn regressors(&self, series: &[f64], residuals: &[f64], t: usize) -> Vec<f64> {
        let mut row = Vec::with_capacity(self.coefficients());
        row.push(1.0);
        row.extend(self.ar.iter().map(|lag| series[t - lag]));
        row.extend(self.ma.iter().map(|lag| residuals[t - lag]));
        row
    }
}

/// Estimated coefficients and in-sample residuals.
#[derive(Debug, Clone)]
struct SarimaFit {
    order: SarimaOrder,
    lags: LagStructure,
    /// Intercept, AR coefficients, MA coefficients
    coefficients: Vec<f64>,
    /// Differenced series
    differenced: Vec<f64>,
    /// Residuals on the differenced scale, 0 before `start`
    residuals: Vec<f64>,
    start: usize,
    /// The original series and every intermediate difference
    levels: Vec<Vec<f64>>,
    /// Lag of each differencing step, in application order
    steps: Vec<usize>,
}

impl SarimaFit {
    fn predict_step(&self, series: &[f64], residuals: &[f64], t: usize) -> f64 {
        self.lags
            .regressors(series, residuals, t)
            .iter()
            .zip(&self.coefficients)
            .map(|(x, b)| x * b)
            .sum()
    }

    fn ar_coefficients(&self) -> &[f64] {
        &self.coefficients[1..1 + self.lags.ar.len()]
    }

    fn ma_coefficients(&self) -> &[f64] {
        &self.coefficients[1 + self.lags.ar.len()..]
    }

    fn aic(&self) -> f64 {
        gaussian_aic(&self.residuals[self.start..], self.lags.coefficients())
    }

    /// One-step predictions on the original scale for the aligned tail.
    fn fitted_values(&self) -> Vec<f64> {
        let data = &self.levels[0];
        let offset = data.len() - self.differenced.len();
        (self.start..self.differenced.len())
            .map(|t| data[offset + t] - self.residuals[t])
            .collect()
    }

    fn forecast(&self, horizon: usize) -> Result<Vec<f64>> {
        let mut series = self.differenced.clone();
        let mut residuals = self.residuals.clone();
        let m = series.len();

        for t in m..m + horizon {
            let value = self.predict_step(&series, &residuals, t);
            series.push(value);
            residuals.push(0.0);
        }

        let mut forecast = series.split_off(m);
        for (level, lag) in self.levels.iter().zip(&self.steps).rev() {
            forecast = integrate(level, &forecast, *lag)?;
        }

        if forecast.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::NumericalError(
                "forecast contains non-finite values".to_string(),
            ));
        }
        Ok(forecast)
    }
}

/// Seasonal ARIMA fitter using iterated conditional least squares.
#[derive(Debug, Clone)]
pub struct ConditionalSarimaFitter {
    max_iterations: usize,
    tolerance: f64,
}

impl Default for ConditionalSarimaFitter {
    fn default() -> Self {
        Self {
            max_iterations: 50,
            tolerance: 1e-6,
        }
    }
}

impl ConditionalSarimaFitter {
    pub fn new(max_iterations: usize) -> Self {
        Self {
            max_iterations: max_iterations.max(1),
            ..Default::default()
        }
    }

    /// Set the coefficient change below which estimation stops
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// The order actually fitted: seasonal terms need two full cycles.
    fn effective_order(order: &SarimaOrder, observations: usize) -> SarimaOrder {
        if order.has_seasonal_terms() && observations < 2 * order.period {
            order.without_seasonal()
        } else {
            *order
        }
    }

    fn estimate(&self, data: &[f64], order: &SarimaOrder, deadline: &Deadline) -> Result<SarimaFit> {
        if data.iter().any(|x| !x.is_finite()) {
            return Err(ForecastError::NumericalError(
                "series contains NaN or infinite values".to_string(),
            ));
        }

        let order = Self::effective_order(order, data.len());
        let required = order.min_observations();
        if data.len() < required {
            return Err(ForecastError::InsufficientData {
                required,
                actual: data.len(),
            });
        }

        let mut steps = Vec::new();
        if order.has_seasonal_terms() {
            steps.extend(std::iter::repeat(order.period).take(order.seasonal_d));
        }
        steps.extend(std::iter::repeat(1).take(order.d));

        let mut levels = vec![data.to_vec()];
        for lag in &steps {
            let next = difference(&levels[levels.len() - 1], *lag);
            levels.push(next);
        }
        let differenced = levels.pop().unwrap_or_default();

        let lags = LagStructure::from_order(&order);
        let start = lags.max_lag();
        let k = lags.coefficients();
        let m = differenced.len();
        if m <= start + k {
            return Err(ForecastError::InsufficientData {
                required: data.len() - m + start + k + 1,
                actual: data.len(),
            });
        }

        let mut coefficients = vec![0.0; k];
        let mut residuals = vec![0.0; m];

        for iteration in 0..self.max_iterations {
            deadline.check()?;

            let (rows, target): (Vec<Vec<f64>>, Vec<f64>) = (start..m)
                .map(|t| (lags.regressors(&differenced, &residuals, t), differenced[t]))
                .unzip();
            let mut next = least_squares(&rows, &target)?;
            for b in next.iter_mut().skip(1) {
                *b = b.clamp(-COEFF_BOUND, COEFF_BOUND);
            }

            let change = next
                .iter()
                .zip(&coefficients)
                .map(|(a, b)| (a - b).abs())
                .fold(0.0, f64::max);
            coefficients = next;
            residuals = conditional_residuals(&lags, &coefficients, &differenced, start);

            // MA terms need one pass with real residuals before they move
            if lags.ma.is_empty() || (iteration > 0 && change < self.tolerance) {
                debug!(%order, iterations = iteration + 1, "Estimation converged");
                break;
            }
        }

        if coefficients.iter().chain(&residuals).any(|v| !v.is_finite()) {
            return Err(ForecastError::NumericalError(
                "estimation produced non-finite values".to_string(),
            ));
        }

        Ok(SarimaFit {
            order,
            lags,
            coefficients,
            differenced,
            residuals,
            start,
            levels,
            steps,
        })
    }
}

impl SeasonalModelFitter for ConditionalSarimaFitter {
    fn fit(
        &self,
        data: &[f64],
        order: &SarimaOrder,
        horizon: usize,
        deadline: &Deadline,
    ) -> Result<FittedModel> {
        let fit = self.estimate(data, order, deadline)?;

        let aic = fit.aic();
        debug!(
            order = %fit.order,
            ar = ?fit.ar_coefficients(),
            ma = ?fit.ma_coefficients(),
            aic,
            "Fitted seasonal ARIMA"
        );
        if !aic.is_finite() {
            return Err(ForecastError::NumericalError("non-finite AIC".to_string()));
        }

        Ok(FittedModel {
            order: fit.order,
            forecast: fit.forecast(horizon)?,
            fitted: fit.fitted_values(),
            aic,
        })
    }
}

/// Lag-`lag` difference of a series.
fn difference(data: &[f64], lag: usize) -> Vec<f64> {
    data.iter()
        .skip(lag)
        .zip(data.iter())
        .map(|(x, prev)| x - prev)
        .collect()
}

/// Undo one lag-`lag` difference for values following `history`.
fn integrate(history: &[f64], diffs: &[f64], lag: usize) -> Result<Vec<f64>> {
    if history.len() < lag {
        return Err(ForecastError::NumericalError(format!(
            "cannot integrate lag {} over {} values",
            lag,
            history.len()
        )));
    }
    let mut extended = history.to_vec();
    for d in diffs {
        let value = extended[extended.len() - lag] + d;
        extended.push(value);
    }
    Ok(extended.split_off(history.len()))
}

/// Residuals computed recursively; zero before `start`.
fn conditional_residuals(
    lags: &LagStructure,
    coefficients: &[f64],
    series: &[f64],
    start: usize,
) -> Vec<f64> {
    let mut residuals = vec![0.0; series.len()];
    for t in start..series.len() {
        let predicted: f64 = lags
            .regressors(series, &residuals, t)
            .iter()
            .zip(coefficients)
            .map(|(x, b)| x * b)
            .sum();
        residuals[t] = series[t] - predicted;
    }
    residuals
}

/// Ordinary least squares via ridge-stabilized normal equations.
fn least_squares(rows: &[Vec<f64>], target: &[f64]) -> Result<Vec<f64>> {
    let k = rows.first().map(Vec::len).unwrap_or(0);
    if k == 0 {
        return Err(ForecastError::FitError("empty design matrix".to_string()));
    }

    let mut a = vec![vec![0.0; k]; k];
    let mut b = vec![0.0; k];
    for (row, y) in rows.iter().zip(target) {
        for i in 0..k {
            b[i] += row[i] * y;
            for j in 0..k {
                a[i][j] += row[i] * row[j];
            }
        }
    }

    let trace: f64 = (0..k).map(|i| a[i][i]).sum();
    let ridge = 1e-8 * (trace / k as f64).max(1.0);
    for (i, row) in a.iter_mut().enumerate() {
        row[i] += ridge;
    }

    solve(a, b)
}

/// Gaussian elimination with partial pivoting.
fn solve(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Result<Vec<f64>> {
    let n = b.len();

    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&i, &j| {
                a[i][col]
                    .abs()
                    .partial_cmp(&a[j][col].abs())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .unwrap_or(col);
        if !a[pivot][col].is_finite() || a[pivot][col].abs() < 1e-12 {
            return Err(ForecastError::NumericalError(
                "singular normal equations".to_string(),
            ));
        }
        a.swap(col, pivot);
        b.swap(col, pivot);

        for row in col + 1..n {
            let factor = a[row][col] / a[col][col];
            if factor == 0.0 {
                continue;
            }
            for j in col..n {
                a[row][j] -= factor * a[col][j];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|j| a[row][j] * x[j]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }
    Ok(x)
}
