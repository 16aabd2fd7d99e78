mod common;

use approx::assert_abs_diff_eq;
use arrow::array::{Array, Float64Array};
use regression_pipeline::estimators::bagging::BaggingRegressor;
use regression_pipeline::estimators::linear::LinearRegressor;
use regression_pipeline::exceptions::{PipelineError, PipelineResult};
use regression_pipeline::pipeline::{Regressor, Transformer};
use regression_pipeline::transformers::scaling::StandardScaler;

use common::{batch, f64_column, floats, strings};

/// 36 noise-free rows of `y = 1.5 + 0.5 * a - 2 * b`.
fn linear_rows() -> (arrow::record_batch::RecordBatch, Float64Array) {
    let a: Vec<f64> = (0..36).map(|i| (i % 9) as f64).collect();
    let b: Vec<f64> = (0..36).map(|i| ((i * 7) % 5) as f64 * 0.5).collect();
    let y: Vec<f64> = a.iter().zip(&b).map(|(a, b)| 1.5 + 0.5 * a - 2.0 * b).collect();
    (
        batch(vec![("a", floats(&a)), ("b", floats(&b))]),
        Float64Array::from(y),
    )
}

#[test]
fn test_linear_regressor_learns_coefficients() -> PipelineResult<()> {
    let (x, y) = linear_rows();
    let mut regressor = LinearRegressor::default();
    regressor.fit(&x, &y)?;

    let model = regressor.model()?;
    assert_abs_diff_eq!(model.intercept, 1.5, epsilon = 1e-9);
    assert_abs_diff_eq!(model.coefficients[0], 0.5, epsilon = 1e-9);
    assert_abs_diff_eq!(model.coefficients[1], -2.0, epsilon = 1e-9);
    assert_eq!(regressor.feature_names()?, ["a".to_string(), "b".to_string()]);
    Ok(())
}

#[test]
fn test_linear_regressor_selects_columns_by_name() -> PipelineResult<()> {
    let (x, y) = linear_rows();
    let mut regressor = LinearRegressor::default();
    regressor.fit(&x, &y)?;

    // Same features, different column order.
    let swapped = batch(vec![("b", floats(&[1.0])), ("a", floats(&[4.0]))]);
    assert_abs_diff_eq!(regressor.predict(&swapped)?.value(0), 1.5, epsilon = 1e-9);

    let missing = batch(vec![("a", floats(&[4.0]))]);
    assert!(matches!(
        regressor.predict(&missing),
        Err(PipelineError::MissingColumn(_))
    ));
    Ok(())
}

#[test]
fn test_collinear_columns_still_fit() -> PipelineResult<()> {
    let a = [1.0, 2.0, 3.0, 4.0];
    let doubled: Vec<f64> = a.iter().map(|v| v * 2.0).collect();
    let x = batch(vec![
        ("a", floats(&a)),
        ("a2", floats(&doubled)),
        ("constant", floats(&[7.0; 4])),
    ]);
    let y = Float64Array::from(vec![3.0, 5.0, 7.0, 9.0]);
    let mut regressor = LinearRegressor::default();
    regressor.fit(&x, &y)?;
    let predictions = regressor.predict(&x)?;
    for (p, expected) in predictions.values().iter().zip(y.values()) {
        assert_abs_diff_eq!(*p, *expected, epsilon = 1e-9);
    }
    Ok(())
}

#[test]
fn test_small_scale_feature_keeps_its_coefficient() -> PipelineResult<()> {
    // A dose on the 1e-8 scale: y = 3e7 * dose + 1.
    let dose: Vec<f64> = (0..100).map(|i| i as f64 * 1e-8).collect();
    let y = Float64Array::from(dose.iter().map(|d| 3e7 * d + 1.0).collect::<Vec<f64>>());
    let x = batch(vec![("dose", floats(&dose))]);

    let mut regressor = LinearRegressor::new(true);
    regressor.fit(&x, &y)?;
    let model = regressor.model()?;
    assert_abs_diff_eq!(model.coefficients[0], 3e7, epsilon = 1e-2);
    assert_abs_diff_eq!(model.intercept, 1.0, epsilon = 1e-9);

    let mut bagging = BaggingRegressor::new(5, 1.0, 3);
    bagging.fit(&x, &y)?;
    let predictions = bagging.predict(&x)?;
    assert_abs_diff_eq!(predictions.value(99), y.value(99), epsilon = 1e-6);
    Ok(())
}

#[test]
fn test_linear_regressor_without_intercept() -> PipelineResult<()> {
    let x = batch(vec![("a", floats(&[1.0, 2.0, 4.0]))]);
    let y = Float64Array::from(vec![3.0, 6.0, 12.0]);
    let mut regressor = LinearRegressor::new(false);
    regressor.fit(&x, &y)?;
    assert_eq!(regressor.model()?.intercept, 0.0);
    assert_abs_diff_eq!(regressor.model()?.coefficients[0], 3.0, epsilon = 1e-12);
    Ok(())
}

#[test]
fn test_string_features_are_rejected() {
    let x = batch(vec![("region", strings(&["a", "b"]))]);
    let mut regressor = LinearRegressor::default();
    assert!(matches!(
        regressor.fit(&x, &Float64Array::from(vec![1.0, 2.0])),
        Err(PipelineError::InvalidParameter(_))
    ));
    assert!(!regressor.is_fitted());
}

#[test]
fn test_bagging_is_deterministic_for_a_seed() -> PipelineResult<()> {
    let (x, y) = linear_rows();
    let mut first = BaggingRegressor::new(8, 0.8, 42);
    let mut second = BaggingRegressor::new(8, 0.8, 42);
    first.fit(&x, &y)?;
    second.fit(&x, &y)?;
    assert_eq!(first.models()?, second.models()?);
    assert_eq!(first.predict(&x)?, second.predict(&x)?);
    Ok(())
}

#[test]
fn test_bagging_recovers_noise_free_relation() -> PipelineResult<()> {
    let (x, y) = linear_rows();
    let mut bagging = BaggingRegressor::default();
    bagging.fit(&x, &y)?;
    assert_eq!(bagging.models()?.len(), 10);

    let predictions = bagging.predict(&x)?;
    assert_eq!(predictions.len(), y.len());
    for (p, expected) in predictions.values().iter().zip(y.values()) {
        assert_abs_diff_eq!(*p, *expected, epsilon = 1e-6);
    }
    Ok(())
}

#[test]
fn test_bagging_parameter_validation() {
    let (x, y) = linear_rows();
    for mut bagging in [
        BaggingRegressor::new(0, 1.0, 0),
        BaggingRegressor::new(3, 0.0, 0),
        BaggingRegressor::new(3, 1.5, 0),
        BaggingRegressor::new(3, 0.01, 0),
    ] {
        assert!(matches!(
            bagging.fit(&x, &y),
            Err(PipelineError::InvalidParameter(_))
        ));
    }
}

#[test]
fn test_regressors_require_fit() {
    let (x, _) = linear_rows();
    assert!(matches!(
        LinearRegressor::default().predict(&x),
        Err(PipelineError::NotFitted(name)) if name == "linear-regressor"
    ));
    assert!(matches!(
        BaggingRegressor::default().predict(&x),
        Err(PipelineError::NotFitted(name)) if name == "bagging"
    ));
}

#[test]
fn test_standard_scaler_centers_and_scales() -> PipelineResult<()> {
    let x = batch(vec![
        ("a", floats(&[1.0, 2.0, 3.0, 4.0])),
        ("flat", floats(&[5.0, 5.0, 5.0, 5.0])),
    ]);
    let mut scaler = StandardScaler::new(true, true);
    let output = scaler.fit_transform(&x, None)?;

    let scaled = f64_column(&output, "a");
    let mean = scaled.iter().sum::<f64>() / 4.0;
    let variance = scaled.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / 4.0;
    assert_abs_diff_eq!(mean, 0.0, epsilon = 1e-12);
    assert_abs_diff_eq!(variance, 1.0, epsilon = 1e-12);
    assert_eq!(f64_column(&output, "flat"), vec![0.0; 4]);
    assert_eq!(scaler.scales()?[1].scale, 1.0);
    Ok(())
}

#[test]
fn test_standard_scaler_options() -> PipelineResult<()> {
    let x = batch(vec![("a", floats(&[2.0, 4.0, 6.0]))]);

    let mut no_mean = StandardScaler::new(false, true);
    no_mean.fit(&x, None)?;
    let std = (8.0f64 / 3.0).sqrt();
    assert_abs_diff_eq!(f64_column(&no_mean.transform(&x)?, "a")[0], 2.0 / std, epsilon = 1e-12);

    let mut no_std = StandardScaler::new(true, false);
    assert_eq!(f64_column(&no_std.fit_transform(&x, None)?, "a"), vec![-2.0, 0.0, 2.0]);

    assert!(matches!(
        StandardScaler::new(true, true).transform(&x),
        Err(PipelineError::NotFitted(_))
    ));
    Ok(())
}
