//! ## Per-group target averages
//!
//! [`GroupMeans`] is the table of mean target values per group key (e.g. per region), plus
//! the global mean of the target. Lookups for a key that was not seen during fitting return
//! the global mean, so every row always gets a value. Rows with a null key do not form a
//! group of their own; they count towards the global mean only.
//!
//! [`GroupAverageExtractor`] appends the looked-up mean as a new feature column. The
//! terminal-predictor flavour lives in [`crate::estimators::group_average`].

use crate::exceptions::{PipelineError, PipelineResult};
use crate::fitted::FitState;
use crate::pipeline::Transformer;
use crate::table::{check_target_len, string_values, with_column};
use arrow::array::{ArrayRef, Float64Array};
use arrow::record_batch::RecordBatch;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;

pub(crate) const DEFAULT_GROUP_COLUMN: &str = "region";
const DEFAULT_OUTPUT_COLUMN: &str = "AverageChargeInRegion";

/// Mean target per group key, with the global mean as fallback.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupMeans {
    means: HashMap<String, f64>,
    global_mean: f64,
}

impl GroupMeans {
    /// Computes the table from row-aligned keys and target values.
    pub fn fit(keys: &[Option<String>], y: &[f64]) -> PipelineResult<Self> {
        if keys.len() != y.len() {
            return Err(PipelineError::InvalidParameter(format!(
                "Found {} group keys but {} target values",
                keys.len(),
                y.len()
            )));
        }
        if y.is_empty() {
            return Err(PipelineError::InvalidParameter(
                "Cannot compute group averages from zero rows".to_string(),
            ));
        }
        let mut sums: HashMap<&str, (f64, usize)> = HashMap::new();
        for (key, &value) in keys.iter().zip(y) {
            if let Some(key) = key {
                let entry = sums.entry(key.as_str()).or_insert((0.0, 0));
                entry.0 += value;
                entry.1 += 1;
            }
        }
        let means = sums
            .into_iter()
            .map(|(key, (sum, count))| (key.to_string(), sum / count as f64))
            .collect();
        let global_mean = y.iter().sum::<f64>() / y.len() as f64;
        Ok(Self { means, global_mean })
    }

    /// Computes the table from `x[key_column]` and `y`.
    pub fn from_batch(x: &RecordBatch, key_column: &str, y: &Float64Array) -> PipelineResult<Self> {
        check_target_len(x, y)?;
        let keys = string_values(x, key_column)?;
        Self::fit(&keys, y.values())
    }

    /// The fitted mean of `key`, or the global mean if `key` is unseen or null.
    pub fn mean_for(&self, key: Option<&str>) -> f64 {
        key.and_then(|k| self.means.get(k))
            .copied()
            .unwrap_or(self.global_mean)
    }

    /// The fitted mean of `key`, if that group was seen.
    pub fn group_mean(&self, key: &str) -> Option<f64> {
        self.means.get(key).copied()
    }

    pub fn global_mean(&self) -> f64 {
        self.global_mean
    }

    pub fn n_groups(&self) -> usize {
        self.means.len()
    }

    /// One mean per row of `x`, keyed by `x[key_column]`.
    pub fn lookup(&self, x: &RecordBatch, key_column: &str) -> PipelineResult<Float64Array> {
        Ok(string_values(x, key_column)?
            .iter()
            .map(|key| self.mean_for(key.as_deref()))
            .collect::<Vec<f64>>()
            .into())
    }
}

fn default_group_column() -> String {
    DEFAULT_GROUP_COLUMN.to_string()
}

fn default_output_column() -> String {
    DEFAULT_OUTPUT_COLUMN.to_string()
}

/// Constructor parameters of [`GroupAverageExtractor`].
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GroupAverageExtractorParams {
    #[serde(default = "default_group_column")]
    pub group_column: String,
    #[serde(default = "default_output_column")]
    pub output_column: String,
}

impl Default for GroupAverageExtractorParams {
    fn default() -> Self {
        Self {
            group_column: default_group_column(),
            output_column: default_output_column(),
        }
    }
}

/// Appends the per-group mean of the target as a new `Float64` column.
pub struct GroupAverageExtractor {
    pub group_column: String,
    pub output_column: String,
    state: FitState<GroupMeans>,
}

impl GroupAverageExtractor {
    pub const NAME: &'static str = "average-charges-extractor";

    pub fn new(group_column: impl Into<String>, output_column: impl Into<String>) -> Self {
        Self {
            group_column: group_column.into(),
            output_column: output_column.into(),
            state: FitState::Unfitted,
        }
    }

    pub fn from_params(params: GroupAverageExtractorParams) -> Self {
        Self::new(params.group_column, params.output_column)
    }

    /// The fitted table.
    pub fn means(&self) -> PipelineResult<&GroupMeans> {
        self.state.get(Self::NAME)
    }
}

impl Default for GroupAverageExtractor {
    fn default() -> Self {
        Self::from_params(GroupAverageExtractorParams::default())
    }
}

impl Transformer for GroupAverageExtractor {
    fn fit(&mut self, x: &RecordBatch, y: Option<&Float64Array>) -> PipelineResult<()> {
        let y = y.ok_or_else(|| {
            PipelineError::InvalidParameter(format!("{} requires a target vector", Self::NAME))
        })?;
        self.state
            .set(GroupMeans::from_batch(x, &self.group_column, y)?);
        Ok(())
    }

    fn transform(&self, x: &RecordBatch) -> PipelineResult<RecordBatch> {
        let means = self.state.get(Self::NAME)?;
        let averages: ArrayRef = Arc::new(means.lookup(x, &self.group_column)?);
        with_column(x, &self.output_column, averages)
    }

    fn is_fitted(&self) -> bool {
        self.state.is_fitted()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(values: &[Option<&str>]) -> Vec<Option<String>> {
        values.iter().map(|v| v.map(str::to_string)).collect()
    }

    #[test]
    fn test_null_keys_only_feed_global_mean() {
        let means = GroupMeans::fit(&keys(&[Some("a"), None, Some("a")]), &[1.0, 7.0, 3.0]).unwrap();
        assert_eq!(means.n_groups(), 1);
        assert_eq!(means.group_mean("a"), Some(2.0));
        assert_eq!(means.global_mean(), 11.0 / 3.0);
        assert_eq!(means.mean_for(None), 11.0 / 3.0);
    }

    #[test]
    fn test_zero_rows_rejected() {
        assert!(GroupMeans::fit(&[], &[]).is_err());
    }
}
