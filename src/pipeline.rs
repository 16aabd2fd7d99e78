//! ## Regression Pipeline
//!
//! This module provides the core abstractions for chaining feature-engineering steps and
//! a final regressor into a single estimator.
//!
//! ### Overview
//!
//! - The [`Transformer`] trait is the contract of a feature-engineering step: it learns
//!   parameters in `fit` and maps one record batch to another in `transform`.
//! - The [`Regressor`] trait is the contract of a terminal predictor: `fit` against a target
//!   vector, then `predict` one value per row.
//! - A [`Step`] is one of the two, and a [`Pipeline`] is an ordered list of named steps in
//!   which only the last step may be a regressor.
//! - The [`crate::make_pipeline`] macro builds a pipeline from `(name, step)` pairs.
//!
//! Fitting runs top to bottom: each transformer is fitted on the output of the previous
//! one and its `fit_transform` output feeds the next step. Prediction replays the fitted
//! transformers and hands the result to the final regressor.

use crate::exceptions::{PipelineError, PipelineResult};
use crate::table::check_target_len;
use arrow::array::Float64Array;
use arrow::record_batch::RecordBatch;
use std::time::Instant;
use tracing::{debug, info};

/// A fit/transform step of the pipeline.
pub trait Transformer {
    /// Learn the step's parameters from `x` (and the target, for supervised steps).
    ///
    /// # Arguments
    ///
    /// * `x` - The input features.
    /// * `y` - The target vector, when available.
    fn fit(&mut self, x: &RecordBatch, y: Option<&Float64Array>) -> PipelineResult<()>;

    /// Apply the fitted step to `x`, returning a new record batch.
    fn transform(&self, x: &RecordBatch) -> PipelineResult<RecordBatch>;

    /// Fit on `x`, then transform it.
    fn fit_transform(
        &mut self,
        x: &RecordBatch,
        y: Option<&Float64Array>,
    ) -> PipelineResult<RecordBatch> {
        self.fit(x, y)?;
        self.transform(x)
    }

    /// Returns true once `fit` has succeeded at least once.
    fn is_fitted(&self) -> bool;
}

/// A fit/predict step; only allowed as the last step of a pipeline.
pub trait Regressor {
    /// Learn the model from features `x` and target `y` (one value per row).
    fn fit(&mut self, x: &RecordBatch, y: &Float64Array) -> PipelineResult<()>;

    /// Predict one value per row of `x`.
    fn predict(&self, x: &RecordBatch) -> PipelineResult<Float64Array>;

    /// Returns true once `fit` has succeeded at least once.
    fn is_fitted(&self) -> bool;
}

/// One pipeline stage.
pub enum Step {
    Transform(Box<dyn Transformer + Send + Sync>),
    Predict(Box<dyn Regressor + Send + Sync>),
}

impl Step {
    /// Boxes a transformer into a step.
    pub fn transform(transformer: impl Transformer + Send + Sync + 'static) -> Self {
        Step::Transform(Box::new(transformer))
    }

    /// Boxes a regressor into a step.
    pub fn predict(regressor: impl Regressor + Send + Sync + 'static) -> Self {
        Step::Predict(Box::new(regressor))
    }

    pub fn is_predictor(&self) -> bool {
        matches!(self, Step::Predict(_))
    }

    pub fn is_fitted(&self) -> bool {
        match self {
            Step::Transform(transformer) => transformer.is_fitted(),
            Step::Predict(regressor) => regressor.is_fitted(),
        }
    }
}

/// An ordered chain of named steps.
pub struct Pipeline {
    steps: Vec<(String, Step)>,
    verbose: bool,
}

impl Pipeline {
    /// Creates a new pipeline.
    ///
    /// # Arguments
    ///
    /// * `steps` - A vector of (name, step) pairs, in execution order.
    /// * `verbose` - If true, step progress and timings are logged at `INFO` instead of `DEBUG`.
    ///
    /// Fails if `steps` is empty or if a regressor appears before the last position.
    pub fn new(steps: Vec<(String, Step)>, verbose: bool) -> PipelineResult<Self> {
        if steps.is_empty() {
            return Err(PipelineError::InvalidParameter(
                "Pipeline must have at least one step.".to_string(),
            ));
        }
        let last = steps.len() - 1;
        if let Some((name, _)) = steps
            .iter()
            .take(last)
            .find(|(_, step)| step.is_predictor())
        {
            return Err(PipelineError::InvalidParameter(format!(
                "Step '{}' is a regressor; only the last step may be a regressor",
                name
            )));
        }
        Ok(Self { steps, verbose })
    }

    /// Step names in execution order.
    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Looks up a step by name.
    pub fn step(&self, name: &str) -> Option<&Step> {
        self.steps
            .iter()
            .find(|(step_name, _)| step_name == name)
            .map(|(_, step)| step)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Returns true if the last step is a regressor.
    pub fn has_predictor(&self) -> bool {
        self.steps
            .last()
            .is_some_and(|(_, step)| step.is_predictor())
    }

    /// Returns true once every step has been fitted.
    pub fn is_fitted(&self) -> bool {
        self.steps.iter().all(|(_, step)| step.is_fitted())
    }

    fn log_step(&self, message: std::fmt::Arguments<'_>) {
        if self.verbose {
            info!("{}", message);
        } else {
            debug!("{}", message);
        }
    }

    /// Fits every step in order on `x` and the target `y`.
    pub fn fit(&mut self, x: &RecordBatch, y: &Float64Array) -> PipelineResult<()> {
        check_target_len(x, y)?;
        let last = self.steps.len() - 1;
        let mut current = x.clone();
        for index in 0..self.steps.len() {
            let start = Instant::now();
            let (name, step) = &mut self.steps[index];
            let name = name.clone();
            match step {
                Step::Transform(transformer) if index < last => {
                    current = transformer
                        .fit_transform(&current, Some(y))
                        .map_err(|e| e.in_step(&name))?;
                }
                Step::Transform(transformer) => {
                    transformer
                        .fit(&current, Some(y))
                        .map_err(|e| e.in_step(&name))?;
                }
                Step::Predict(regressor) => {
                    regressor.fit(&current, y).map_err(|e| e.in_step(&name))?;
                }
            }
            self.log_step(format_args!(
                "Fitted step '{}' on {} rows x {} columns in {:?}",
                name,
                current.num_rows(),
                current.num_columns(),
                start.elapsed()
            ));
        }
        Ok(())
    }

    /// Fits a transformer-only pipeline and returns the output of its last step.
    pub fn fit_transform(
        &mut self,
        x: &RecordBatch,
        y: Option<&Float64Array>,
    ) -> PipelineResult<RecordBatch> {
        self.ensure_transformer_tail()?;
        if let Some(y) = y {
            check_target_len(x, y)?;
        }
        let mut current = x.clone();
        for index in 0..self.steps.len() {
            let start = Instant::now();
            let (name, step) = &mut self.steps[index];
            let name = name.clone();
            if let Step::Transform(transformer) = step {
                current = transformer
                    .fit_transform(&current, y)
                    .map_err(|e| e.in_step(&name))?;
            }
            self.log_step(format_args!(
                "Fitted step '{}' in {:?}",
                name,
                start.elapsed()
            ));
        }
        Ok(current)
    }

    /// Applies every fitted step to `x`. The pipeline must end with a transformer.
    pub fn transform(&self, x: &RecordBatch) -> PipelineResult<RecordBatch> {
        self.ensure_transformer_tail()?;
        self.apply_transformers(x, self.steps.len())
    }

    /// Runs `x` through the fitted transformers and predicts with the final regressor.
    pub fn predict(&self, x: &RecordBatch) -> PipelineResult<Float64Array> {
        let last = self.steps.len() - 1;
        match &self.steps[last] {
            (name, Step::Predict(regressor)) => {
                let features = self.apply_transformers(x, last)?;
                let start = Instant::now();
                let predictions = regressor.predict(&features).map_err(|e| e.in_step(name))?;
                self.log_step(format_args!(
                    "Predicted {} rows with '{}' in {:?}",
                    predictions.len(),
                    name,
                    start.elapsed()
                ));
                Ok(predictions)
            }
            (name, Step::Transform(_)) => Err(PipelineError::InvalidParameter(format!(
                "Pipeline ends with transformer '{}'; use transform instead of predict",
                name
            ))),
        }
    }

    /// Applies the first `count` steps, all of which must be transformers.
    fn apply_transformers(&self, x: &RecordBatch, count: usize) -> PipelineResult<RecordBatch> {
        let mut current = x.clone();
        for (name, step) in self.steps.iter().take(count) {
            if let Step::Transform(transformer) = step {
                current = transformer
                    .transform(&current)
                    .map_err(|e| e.in_step(name))?;
                self.log_step(format_args!("Applied step '{}'", name));
            }
        }
        Ok(current)
    }

    fn ensure_transformer_tail(&self) -> PipelineResult<()> {
        match self.steps.last() {
            Some((name, Step::Predict(_))) => Err(PipelineError::InvalidParameter(format!(
                "Pipeline ends with regressor '{}'; use fit and predict instead",
                name
            ))),
            _ => Ok(()),
        }
    }
}

/// Macro to simplify pipeline creation from `(name, step)` pairs.
///
/// Expands to a call to [`Pipeline::new`], so it evaluates to a `PipelineResult<Pipeline>`.
///
/// # Example
///
/// ```rust,no_run
/// use regression_pipeline::make_pipeline;
/// use regression_pipeline::pipeline::Step;
/// use regression_pipeline::estimators::linear::LinearRegressor;
/// use regression_pipeline::transformers::scaling::StandardScaler;
///
/// let pipeline = make_pipeline!(false,
///     ("scaler", Step::transform(StandardScaler::new(true, true))),
///     ("model", Step::predict(LinearRegressor::new(true))),
/// ).unwrap();
/// assert_eq!(pipeline.step_names(), vec!["scaler", "model"]);
/// ```
#[macro_export]
macro_rules! make_pipeline {
    ($verbose:expr, $(($name:expr, $step:expr)),+ $(,)?) => {
        {
            let steps: Vec<(String, $crate::pipeline::Step)> = vec![
                $(
                    ($name.to_string(), $step),
                )+
            ];
            $crate::pipeline::Pipeline::new(steps, $verbose)
        }
    };
}
