//! ## Pipeline Configuration
//!
//! A pipeline is described by an ordered list of [`StepConfig`] entries, each naming a
//! registered step and the parameters to construct it with:
//!
//! ```json
//! [
//!   {"name": "discretizer", "params": {"bins_per_column": {"age": 3}, "strategy": "uniform"}},
//!   {"name": "categorical-encoder", "params": {"one_hot": true}},
//!   {"name": "bagging", "params": {}}
//! ]
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

use crate::exceptions::{PipelineError, PipelineResult};

/// One configured pipeline step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepConfig {
    /// Registry name of the step (e.g. `"categorical-encoder"`).
    pub name: String,
    /// Constructor parameters; key order is preserved.
    #[serde(default)]
    pub params: Map<String, Value>,
}

impl StepConfig {
    /// Creates an entry from a JSON value; `params` must be an object.
    pub fn new(name: impl Into<String>, params: Value) -> PipelineResult<Self> {
        let name = name.into();
        match params {
            Value::Object(params) => Ok(Self { name, params }),
            other => Err(PipelineError::InvalidParams {
                step: name,
                reason: format!("params must be a JSON object, got {}", other),
            }),
        }
    }
}

/// The full, ordered pipeline description.
pub type EstimatorConfig = Vec<StepConfig>;

/// Parses an [`EstimatorConfig`] from a JSON string.
pub fn parse_config(text: &str) -> PipelineResult<EstimatorConfig> {
    Ok(serde_json::from_str(text)?)
}

/// Reads an [`EstimatorConfig`] from a JSON file.
pub fn load_config(path: impl AsRef<Path>) -> PipelineResult<EstimatorConfig> {
    let text = std::fs::read_to_string(path)?;
    parse_config(&text)
}
