//! ## Group-average regressor
//!
//! Predicts, for every row, the mean training target of the row's group (e.g. its region),
//! or the global training mean for groups not seen during fitting. All other features are
//! ignored, which makes it a useful baseline at the end of a pipeline.

use crate::exceptions::PipelineResult;
use crate::fitted::FitState;
use crate::pipeline::Regressor;
use crate::transformers::group_average::{GroupMeans, DEFAULT_GROUP_COLUMN};
use arrow::array::Float64Array;
use arrow::record_batch::RecordBatch;
use serde::Deserialize;

fn default_group_column() -> String {
    DEFAULT_GROUP_COLUMN.to_string()
}

/// Constructor parameters of [`GroupAverageRegressor`].
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GroupAverageRegressorParams {
    #[serde(default = "default_group_column")]
    pub group_column: String,
}

pub struct GroupAverageRegressor {
    pub group_column: String,
    state: FitState<GroupMeans>,
}

impl GroupAverageRegressor {
    pub const NAME: &'static str = "average-charges-regressor";

    pub fn new(group_column: impl Into<String>) -> Self {
        Self {
            group_column: group_column.into(),
            state: FitState::Unfitted,
        }
    }

    pub fn from_params(params: GroupAverageRegressorParams) -> Self {
        Self::new(params.group_column)
    }

    /// The fitted table.
    pub fn means(&self) -> PipelineResult<&GroupMeans> {
        self.state.get(Self::NAME)
    }
}

impl Default for GroupAverageRegressor {
    fn default() -> Self {
        Self::new(DEFAULT_GROUP_COLUMN)
    }
}

impl Regressor for GroupAverageRegressor {
    fn fit(&mut self, x: &RecordBatch, y: &Float64Array) -> PipelineResult<()> {
        self.state
            .set(GroupMeans::from_batch(x, &self.group_column, y)?);
        Ok(())
    }

    fn predict(&self, x: &RecordBatch) -> PipelineResult<Float64Array> {
        self.state
            .get(Self::NAME)?
            .lookup(x, &self.group_column)
    }

    fn is_fitted(&self) -> bool {
        self.state.is_fitted()
    }
}
