//! In-sample accuracy metrics.

use std::f64::consts::PI;

/// Mean Absolute Error
pub fn mae(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.len() != predicted.len() || actual.is_empty() {
        return f64::NAN;
    }
    let sum: f64 = actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).abs())
        .sum();
    sum / actual.len() as f64
}

/// Mean Squared Error
pub fn mse(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.len() != predicted.len() || actual.is_empty() {
        return f64::NAN;
    }
    let sum: f64 = actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).powi(2))
        .sum();
    sum / actual.len() as f64
}

/// Root Mean Squared Error
pub fn rmse(actual: &[f64], predicted: &[f64]) -> f64 {
    mse(actual, predicted).sqrt()
}

/// Mean Absolute Percentage Error in percent.
///
/// Weeks with a zero actual are excluded; NaN when none remain.
pub fn mape(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.len() != predicted.len() || actual.is_empty() {
        return f64::NAN;
    }
    let valid: Vec<_> = actual
        .iter()
        .zip(predicted.iter())
        .filter(|(&a, _)| a.abs() > 1e-10)
        .collect();
    if valid.is_empty() {
        return f64::NAN;
    }
    let sum: f64 = valid.iter().map(|(&a, &p)| ((a - p) / a).abs()).sum();
    sum / valid.len() as f64 * 100.0
}

/// Gaussian AIC from residuals and the number of estimated coefficients.
///
/// The residual variance is one more parameter.
pub fn gaussian_aic(residuals: &[f64], coefficients: usize) -> f64 {
    if residuals.is_empty() {
        return f64::NAN;
    }
    let n = residuals.len() as f64;
    let sigma2 = (residuals.iter().map(|e| e * e).sum::<f64>() / n).max(1e-12);
    n * ((2.0 * PI * sigma2).ln() + 1.0) + 2.0 * (coefficients as f64 + 1.0)
}
