//! ## Standard scaling
//!
//! [`StandardScaler`] standardises every input column to zero mean and unit (population)
//! variance. All columns must be numeric or boolean; the output columns are `Float64` with
//! the same names and order.

use crate::exceptions::{PipelineError, PipelineResult};
use crate::fitted::FitState;
use crate::pipeline::Transformer;
use crate::table::{column_names, from_columns, numeric_values};
use arrow::array::{ArrayRef, Float64Array};
use arrow::datatypes::{DataType, Field};
use arrow::record_batch::RecordBatch;
use serde::Deserialize;
use std::sync::Arc;

fn default_true() -> bool {
    true
}

/// Constructor parameters of [`StandardScaler`].
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StandardScalerParams {
    #[serde(default = "default_true")]
    pub with_mean: bool,
    #[serde(default = "default_true")]
    pub with_std: bool,
}

/// Per-column offset and scale.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnScale {
    pub column: String,
    pub mean: f64,
    pub scale: f64,
}

pub struct StandardScaler {
    pub with_mean: bool,
    pub with_std: bool,
    state: FitState<Vec<ColumnScale>>,
}

impl StandardScaler {
    pub const NAME: &'static str = "standard-scaler";

    pub fn new(with_mean: bool, with_std: bool) -> Self {
        Self {
            with_mean,
            with_std,
            state: FitState::Unfitted,
        }
    }

    pub fn from_params(params: StandardScalerParams) -> Self {
        Self::new(params.with_mean, params.with_std)
    }

    pub fn scales(&self) -> PipelineResult<&[ColumnScale]> {
        self.state.get(Self::NAME).map(Vec::as_slice)
    }
}

impl Transformer for StandardScaler {
    fn fit(&mut self, x: &RecordBatch, _y: Option<&Float64Array>) -> PipelineResult<()> {
        if x.num_rows() == 0 {
            return Err(PipelineError::InvalidParameter(
                "Cannot fit standard scaler on zero rows".to_string(),
            ));
        }
        let n = x.num_rows() as f64;
        let mut scales = Vec::with_capacity(x.num_columns());
        for name in column_names(x) {
            let values = numeric_values(x, &name)?;
            let mean = values.iter().sum::<f64>() / n;
            let std = (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt();
            scales.push(ColumnScale {
                column: name,
                mean: if self.with_mean { mean } else { 0.0 },
                // Zero-variance columns are only centred.
                scale: if self.with_std && std > 0.0 { std } else { 1.0 },
            });
        }
        self.state.set(scales);
        Ok(())
    }

    fn transform(&self, x: &RecordBatch) -> PipelineResult<RecordBatch> {
        let scales = self.state.get(Self::NAME)?;
        let mut output = Vec::with_capacity(scales.len());
        for scale in scales {
            let scaled: Float64Array = numeric_values(x, &scale.column)?
                .into_iter()
                .map(|v| Some((v - scale.mean) / scale.scale))
                .collect();
            output.push((
                Field::new(&scale.column, DataType::Float64, false),
                Arc::new(scaled) as ArrayRef,
            ));
        }
        from_columns(output, x.num_rows())
    }

    fn is_fitted(&self) -> bool {
        self.state.is_fitted()
    }
}
