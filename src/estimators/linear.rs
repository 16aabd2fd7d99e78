//! ## Ordinary least squares
//!
//! [`LinearModel`] is a least-squares fit on a dense `f64` matrix; [`LinearRegressor`] is the
//! pipeline step around it, which reads every input column as a feature.
//!
//! The normal equations are solved with Gauss-Jordan elimination and partial pivoting.
//! Directions the data does not determine (constant or collinear columns) get a zero
//! coefficient instead of making the fit fail.

use crate::exceptions::{PipelineError, PipelineResult};
use crate::fitted::FitState;
use crate::pipeline::Regressor;
use crate::table::{check_target_len, column_names, feature_matrix};
use arrow::array::Float64Array;
use arrow::record_batch::RecordBatch;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use serde::Deserialize;

const PIVOT_TOLERANCE: f64 = 1e-10;

/// Solves the symmetric system `a * x = b`, setting undetermined unknowns to zero.
///
/// The system is rescaled to a unit diagonal before elimination, so the pivot tolerance is
/// independent of the units of each feature.
fn solve_normal_equations(mut a: Array2<f64>, mut b: Array1<f64>) -> Array1<f64> {
    let n = b.len();
    // A zero diagonal entry (constant column) keeps a zero coefficient.
    let d: Array1<f64> = a
        .diag()
        .mapv(|v| if v > 0.0 { 1.0 / v.sqrt() } else { 0.0 });
    for i in 0..n {
        for j in 0..n {
            a[[i, j]] *= d[i] * d[j];
        }
        b[i] *= d[i];
    }
    let tolerance = PIVOT_TOLERANCE;
    let mut pivot_columns = Vec::with_capacity(n);
    let mut row = 0;
    for col in 0..n {
        if row == n {
            break;
        }
        let (best, best_abs) = (row..n)
            .map(|r| (r, a[[r, col]].abs()))
            .max_by(|p, q| p.1.total_cmp(&q.1))
            .unwrap_or((row, 0.0));
        if best_abs <= tolerance {
            continue;
        }
        if best != row {
            for c in 0..n {
                a.swap([best, c], [row, c]);
            }
            b.swap(best, row);
        }
        let pivot = a[[row, col]];
        for c in col..n {
            a[[row, c]] /= pivot;
        }
        b[row] /= pivot;
        for r in 0..n {
            let factor = a[[r, col]];
            if r == row || factor == 0.0 {
                continue;
            }
            for c in col..n {
                let value = a[[row, c]];
                a[[r, c]] -= factor * value;
            }
            let value = b[row];
            b[r] -= factor * value;
        }
        pivot_columns.push(col);
        row += 1;
    }
    let mut solution = Array1::zeros(n);
    for (r, &c) in pivot_columns.iter().enumerate() {
        solution[c] = b[r] * d[c];
    }
    solution
}

/// Coefficients and intercept of a fitted least-squares model.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearModel {
    pub coefficients: Array1<f64>,
    pub intercept: f64,
}

impl LinearModel {
    /// Fits `y ~ x` by least squares.
    pub fn fit(x: ArrayView2<f64>, y: ArrayView1<f64>, fit_intercept: bool) -> PipelineResult<Self> {
        if x.nrows() != y.len() {
            return Err(PipelineError::InvalidParameter(format!(
                "Found {} rows in X but {} target values",
                x.nrows(),
                y.len()
            )));
        }
        let (Some(x_mean), Some(y_mean)) = (x.mean_axis(Axis(0)), y.mean()) else {
            return Err(PipelineError::InvalidParameter(
                "Cannot fit a linear model on zero rows".to_string(),
            ));
        };
        if fit_intercept {
            let xc = &x - &x_mean;
            let yc = &y - y_mean;
            let coefficients = solve_normal_equations(xc.t().dot(&xc), xc.t().dot(&yc));
            let intercept = y_mean - x_mean.dot(&coefficients);
            Ok(Self {
                coefficients,
                intercept,
            })
        } else {
            let coefficients = solve_normal_equations(x.t().dot(&x), x.t().dot(&y));
            Ok(Self {
                coefficients,
                intercept: 0.0,
            })
        }
    }

    pub fn predict(&self, x: ArrayView2<f64>) -> Array1<f64> {
        x.dot(&self.coefficients) + self.intercept
    }
}

fn default_true() -> bool {
    true
}

/// Constructor parameters of [`LinearRegressor`].
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LinearRegressorParams {
    #[serde(default = "default_true")]
    pub fit_intercept: bool,
}

#[derive(Debug, Clone)]
struct FittedLinear {
    features: Vec<String>,
    model: LinearModel,
}

/// Least-squares regression on all input columns.
pub struct LinearRegressor {
    pub fit_intercept: bool,
    state: FitState<FittedLinear>,
}

impl LinearRegressor {
    pub const NAME: &'static str = "linear-regressor";

    pub fn new(fit_intercept: bool) -> Self {
        Self {
            fit_intercept,
            state: FitState::Unfitted,
        }
    }

    pub fn from_params(params: LinearRegressorParams) -> Self {
        Self::new(params.fit_intercept)
    }

    pub fn model(&self) -> PipelineResult<&LinearModel> {
        Ok(&self.state.get(Self::NAME)?.model)
    }

    /// Feature names in coefficient order.
    pub fn feature_names(&self) -> PipelineResult<&[String]> {
        self.state
            .get(Self::NAME)
            .map(|fitted| fitted.features.as_slice())
    }
}

impl Default for LinearRegressor {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Regressor for LinearRegressor {
    fn fit(&mut self, x: &RecordBatch, y: &Float64Array) -> PipelineResult<()> {
        check_target_len(x, y)?;
        let features = column_names(x);
        let matrix = feature_matrix(x, &features)?;
        let target: &[f64] = y.values();
        let model = LinearModel::fit(matrix.view(), ArrayView1::from(target), self.fit_intercept)?;
        self.state.set(FittedLinear { features, model });
        Ok(())
    }

    fn predict(&self, x: &RecordBatch) -> PipelineResult<Float64Array> {
        let fitted = self.state.get(Self::NAME)?;
        let matrix = feature_matrix(x, &fitted.features)?;
        Ok(Float64Array::from(fitted.model.predict(matrix.view()).to_vec()))
    }

    fn is_fitted(&self) -> bool {
        self.state.is_fitted()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_solver_exact_system() {
        let a = array![[2.0, 1.0], [1.0, 3.0]];
        let b = array![3.0, 5.0];
        let x = solve_normal_equations(a, b);
        assert!((x[0] - 0.8).abs() < 1e-12);
        assert!((x[1] - 1.4).abs() < 1e-12);
    }

    #[test]
    fn test_solver_zeroes_undetermined_unknowns() {
        let a = array![[1.0, 0.0], [0.0, 0.0]];
        let b = array![2.0, 0.0];
        assert_eq!(solve_normal_equations(a, b), array![2.0, 0.0]);
    }

    #[test]
    fn test_solver_is_scale_invariant() {
        let a = array![[2e-16, 1e-8], [1e-8, 3.0]];
        let b = array![3e-8, 5.0];
        let x = solve_normal_equations(a, b);
        assert!((x[0] - 0.8e8).abs() < 1e-2);
        assert!((x[1] - 1.4).abs() < 1e-9);
    }

    #[test]
    fn test_fit_without_intercept() {
        let x = array![[1.0], [2.0], [3.0]];
        let y = array![2.0, 4.0, 6.0];
        let model = LinearModel::fit(x.view(), y.view(), false).unwrap();
        assert!((model.coefficients[0] - 2.0).abs() < 1e-12);
        assert_eq!(model.intercept, 0.0);
    }
}
