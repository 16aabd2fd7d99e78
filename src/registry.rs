//! ## Estimator Registry
//!
//! Maps configuration step names to the steps this library implements and builds a
//! [`Pipeline`] from an [`EstimatorConfig`].
//!
//! | name                        | step                                           |
//! |-----------------------------|------------------------------------------------|
//! | `average-charges-extractor` | [`GroupAverageExtractor`] (transformer)        |
//! | `average-charges-regressor` | [`GroupAverageRegressor`] (regressor)          |
//! | `linear-regressor`          | [`LinearRegressor`] (regressor)                |
//! | `categorical-encoder`       | [`CategoricalEncoder`] (transformer)           |
//! | `one-hot-encoder`           | [`OneHotEncoder`] (transformer)                |
//! | `standard-scaler`           | [`StandardScaler`] (transformer)               |
//! | `bagging`                   | [`BaggingRegressor`] (regressor)               |
//! | `discretizer`               | [`Discretizer`] (transformer)                  |
//!
//! Step parameters are deserialised into each step's `*Params` struct; unknown keys,
//! missing required keys and mistyped values are reported as
//! [`PipelineError::InvalidParams`].

use crate::columns::ColumnRegistry;
use crate::config::StepConfig;
use crate::estimators::bagging::BaggingRegressor;
use crate::estimators::group_average::GroupAverageRegressor;
use crate::estimators::linear::LinearRegressor;
use crate::exceptions::{PipelineError, PipelineResult};
use crate::pipeline::{Pipeline, Step};
use crate::transformers::categorical_encoding::{CategoricalEncoder, OneHotEncoder};
use crate::transformers::group_average::GroupAverageExtractor;
use crate::transformers::scaling::StandardScaler;
use crate::transformers::variable_discretization::Discretizer;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Every step kind that can appear in a configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EstimatorKind {
    AverageChargesExtractor,
    AverageChargesRegressor,
    LinearRegressor,
    CategoricalEncoder,
    OneHotEncoder,
    StandardScaler,
    Bagging,
    Discretizer,
}

impl EstimatorKind {
    pub const ALL: [EstimatorKind; 8] = [
        EstimatorKind::AverageChargesExtractor,
        EstimatorKind::AverageChargesRegressor,
        EstimatorKind::LinearRegressor,
        EstimatorKind::CategoricalEncoder,
        EstimatorKind::OneHotEncoder,
        EstimatorKind::StandardScaler,
        EstimatorKind::Bagging,
        EstimatorKind::Discretizer,
    ];

    /// The configuration name of this kind.
    pub fn name(&self) -> &'static str {
        match self {
            EstimatorKind::AverageChargesExtractor => GroupAverageExtractor::NAME,
            EstimatorKind::AverageChargesRegressor => GroupAverageRegressor::NAME,
            EstimatorKind::LinearRegressor => LinearRegressor::NAME,
            EstimatorKind::CategoricalEncoder => CategoricalEncoder::NAME,
            EstimatorKind::OneHotEncoder => OneHotEncoder::NAME,
            EstimatorKind::StandardScaler => StandardScaler::NAME,
            EstimatorKind::Bagging => BaggingRegressor::NAME,
            EstimatorKind::Discretizer => Discretizer::NAME,
        }
    }

    /// Returns true for kinds that end a pipeline (fit/predict).
    pub fn is_predictor(&self) -> bool {
        matches!(
            self,
            EstimatorKind::AverageChargesRegressor
                | EstimatorKind::LinearRegressor
                | EstimatorKind::Bagging
        )
    }

    /// Constructs an unfitted step of this kind from its configuration parameters.
    pub fn build(
        &self,
        params: &Map<String, Value>,
        columns: &dyn ColumnRegistry,
    ) -> PipelineResult<Step> {
        let step = match self {
            EstimatorKind::AverageChargesExtractor => {
                Step::transform(GroupAverageExtractor::from_params(self.params(params)?))
            }
            EstimatorKind::AverageChargesRegressor => {
                Step::predict(GroupAverageRegressor::from_params(self.params(params)?))
            }
            EstimatorKind::LinearRegressor => {
                Step::predict(LinearRegressor::from_params(self.params(params)?))
            }
            EstimatorKind::CategoricalEncoder => Step::transform(
                CategoricalEncoder::from_params(self.params(params)?, columns)?,
            ),
            EstimatorKind::OneHotEncoder => {
                Step::transform(OneHotEncoder::from_params(self.params(params)?))
            }
            EstimatorKind::StandardScaler => {
                Step::transform(StandardScaler::from_params(self.params(params)?))
            }
            EstimatorKind::Bagging => {
                Step::predict(BaggingRegressor::from_params(self.params(params)?))
            }
            EstimatorKind::Discretizer => {
                Step::transform(Discretizer::from_params(self.params(params)?))
            }
        };
        Ok(step)
    }

    /// Deserialises `params` into the parameter struct of this kind.
    fn params<P: DeserializeOwned>(&self, params: &Map<String, Value>) -> PipelineResult<P> {
        serde_json::from_value(Value::Object(params.clone())).map_err(|e| {
            PipelineError::InvalidParams {
                step: self.name().to_string(),
                reason: e.to_string(),
            }
        })
    }
}

impl FromStr for EstimatorKind {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EstimatorKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| PipelineError::UnknownStep(s.to_string()))
    }
}

impl fmt::Display for EstimatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Builds an unfitted pipeline whose steps follow `config` in order.
///
/// # Arguments
///
/// * `config` - The ordered step configuration.
/// * `columns` - The column registry consulted by the categorical encoder.
pub fn build_estimator(
    config: &[StepConfig],
    columns: &dyn ColumnRegistry,
) -> PipelineResult<Pipeline> {
    build_estimator_with(config, columns, false)
}

/// Like [`build_estimator`], with step progress logged at `INFO` when `verbose` is set.
pub fn build_estimator_with(
    config: &[StepConfig],
    columns: &dyn ColumnRegistry,
    verbose: bool,
) -> PipelineResult<Pipeline> {
    let mut steps = Vec::with_capacity(config.len());
    for entry in config {
        let kind: EstimatorKind = entry.name.parse()?;
        debug!("Building step '{}' with params {:?}", kind, entry.params);
        steps.push((entry.name.clone(), kind.build(&entry.params, columns)?));
    }
    Pipeline::new(steps, verbose)
}
