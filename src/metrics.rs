//! ## Regression metrics
//!
//! Scores used to report how well a fitted pipeline predicts its target.

use crate::exceptions::{PipelineError, PipelineResult};

fn check_lengths(y_true: &[f64], y_pred: &[f64]) -> PipelineResult<()> {
    if y_true.len() != y_pred.len() {
        return Err(PipelineError::InvalidParameter(format!(
            "Found {} true values but {} predictions",
            y_true.len(),
            y_pred.len()
        )));
    }
    if y_true.is_empty() {
        return Err(PipelineError::InvalidParameter(
            "Cannot score an empty target".to_string(),
        ));
    }
    Ok(())
}

/// Mean squared error: `mean((y_true - y_pred)^2)`.
pub fn mean_squared_error(y_true: &[f64], y_pred: &[f64]) -> PipelineResult<f64> {
    check_lengths(y_true, y_pred)?;
    let sum_sq: f64 = y_true
        .iter()
        .zip(y_pred)
        .map(|(t, p)| (t - p).powi(2))
        .sum();
    Ok(sum_sq / y_true.len() as f64)
}

/// Root mean squared error, in the units of the target.
pub fn root_mean_squared_error(y_true: &[f64], y_pred: &[f64]) -> PipelineResult<f64> {
    mean_squared_error(y_true, y_pred).map(f64::sqrt)
}

/// Coefficient of determination. A constant target scores 1.0 when predicted exactly
/// and 0.0 otherwise.
pub fn r2_score(y_true: &[f64], y_pred: &[f64]) -> PipelineResult<f64> {
    check_lengths(y_true, y_pred)?;
    let mean = y_true.iter().sum::<f64>() / y_true.len() as f64;
    let total: f64 = y_true.iter().map(|t| (t - mean).powi(2)).sum();
    let residual: f64 = y_true
        .iter()
        .zip(y_pred)
        .map(|(t, p)| (t - p).powi(2))
        .sum();
    if total == 0.0 {
        return Ok(if residual == 0.0 { 1.0 } else { 0.0 });
    }
    Ok(1.0 - residual / total)
}
