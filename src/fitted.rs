//! ## Fitted State
//!
//! Every step keeps the parameters it learns during `fit` in a [`FitState`]. The learned
//! payload types (`GroupMeans`, `ColumnEncoder`, `BinEdges`, `LinearModel`, ...) only exist
//! once fitting succeeded, so code holding one of them can never observe an unfitted step.
//! The "not fitted" failure is confined to [`FitState::get`], at the step boundary.

use crate::exceptions::{PipelineError, PipelineResult};

/// Either nothing learned yet, or the parameters learned by the last `fit`.
#[derive(Debug, Clone, Default)]
pub enum FitState<T> {
    #[default]
    Unfitted,
    Fitted(T),
}

impl<T> FitState<T> {
    /// Returns the fitted parameters, or [`PipelineError::NotFitted`] naming `step`.
    pub fn get(&self, step: &str) -> PipelineResult<&T> {
        match self {
            FitState::Fitted(params) => Ok(params),
            FitState::Unfitted => Err(PipelineError::NotFitted(step.to_string())),
        }
    }

    /// Stores freshly learned parameters, replacing any earlier fit.
    pub fn set(&mut self, params: T) {
        *self = FitState::Fitted(params);
    }

    pub fn is_fitted(&self) -> bool {
        matches!(self, FitState::Fitted(_))
    }
}
