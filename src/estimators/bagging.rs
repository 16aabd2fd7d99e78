//! ## Bagging regressor
//!
//! [`BaggingRegressor`] fits an ensemble of [`LinearModel`]s, each on a bootstrap sample of
//! the training rows (drawn with replacement), and predicts the mean of their predictions.
//! Samples are drawn from a generator seeded with `random_state`, so two fits on the same
//! data produce the same ensemble.

use crate::estimators::linear::LinearModel;
use crate::exceptions::{PipelineError, PipelineResult};
use crate::fitted::FitState;
use crate::pipeline::Regressor;
use crate::table::{check_target_len, column_names, feature_matrix};
use arrow::array::Float64Array;
use arrow::record_batch::RecordBatch;
use ndarray::{Array1, ArrayView1, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use tracing::debug;

fn default_n_estimators() -> usize {
    10
}

fn default_max_samples() -> f64 {
    1.0
}

/// Constructor parameters of [`BaggingRegressor`].
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BaggingRegressorParams {
    #[serde(default = "default_n_estimators")]
    pub n_estimators: usize,
    /// Fraction of the training rows drawn for each base model.
    #[serde(default = "default_max_samples")]
    pub max_samples: f64,
    #[serde(default)]
    pub random_state: u64,
}

impl Default for BaggingRegressorParams {
    fn default() -> Self {
        Self {
            n_estimators: default_n_estimators(),
            max_samples: default_max_samples(),
            random_state: 0,
        }
    }
}

#[derive(Debug, Clone)]
struct Ensemble {
    features: Vec<String>,
    models: Vec<LinearModel>,
}

/// Bootstrap-aggregated linear regression.
pub struct BaggingRegressor {
    pub n_estimators: usize,
    pub max_samples: f64,
    pub random_state: u64,
    state: FitState<Ensemble>,
}

impl BaggingRegressor {
    pub const NAME: &'static str = "bagging";

    pub fn new(n_estimators: usize, max_samples: f64, random_state: u64) -> Self {
        Self {
            n_estimators,
            max_samples,
            random_state,
            state: FitState::Unfitted,
        }
    }

    pub fn from_params(params: BaggingRegressorParams) -> Self {
        Self::new(params.n_estimators, params.max_samples, params.random_state)
    }

    /// The fitted base models.
    pub fn models(&self) -> PipelineResult<&[LinearModel]> {
        self.state
            .get(Self::NAME)
            .map(|ensemble| ensemble.models.as_slice())
    }

    fn sample_size(&self, n_rows: usize) -> PipelineResult<usize> {
        if self.n_estimators == 0 {
            return Err(PipelineError::InvalidParameter(
                "n_estimators must be at least 1".to_string(),
            ));
        }
        if !(self.max_samples > 0.0 && self.max_samples <= 1.0) {
            return Err(PipelineError::InvalidParameter(format!(
                "max_samples must be in (0, 1], got {}",
                self.max_samples
            )));
        }
        let size = (self.max_samples * n_rows as f64) as usize;
        if size == 0 {
            return Err(PipelineError::InvalidParameter(format!(
                "max_samples={} draws no rows out of {}",
                self.max_samples, n_rows
            )));
        }
        Ok(size)
    }
}

impl Default for BaggingRegressor {
    fn default() -> Self {
        Self::from_params(BaggingRegressorParams::default())
    }
}

impl Regressor for BaggingRegressor {
    fn fit(&mut self, x: &RecordBatch, y: &Float64Array) -> PipelineResult<()> {
        check_target_len(x, y)?;
        let sample_size = self.sample_size(x.num_rows())?;
        let features = column_names(x);
        let matrix = feature_matrix(x, &features)?;
        let target: &[f64] = y.values();
        let target = ArrayView1::from(target);

        let mut rng = StdRng::seed_from_u64(self.random_state);
        let mut models = Vec::with_capacity(self.n_estimators);
        for _ in 0..self.n_estimators {
            let rows: Vec<usize> = (0..sample_size)
                .map(|_| rng.random_range(0..x.num_rows()))
                .collect();
            let x_sample = matrix.select(Axis(0), &rows);
            let y_sample = target.select(Axis(0), &rows);
            models.push(LinearModel::fit(x_sample.view(), y_sample.view(), true)?);
        }
        debug!(
            "Fitted {} base models on {} bootstrap rows each",
            models.len(),
            sample_size
        );
        self.state.set(Ensemble { features, models });
        Ok(())
    }

    fn predict(&self, x: &RecordBatch) -> PipelineResult<Float64Array> {
        let ensemble = self.state.get(Self::NAME)?;
        let matrix = feature_matrix(x, &ensemble.features)?;
        let mut total = Array1::<f64>::zeros(x.num_rows());
        for model in &ensemble.models {
            total += &model.predict(matrix.view());
        }
        total /= ensemble.models.len() as f64;
        Ok(Float64Array::from(total.to_vec()))
    }

    fn is_fitted(&self) -> bool {
        self.state.is_fitted()
    }
}
