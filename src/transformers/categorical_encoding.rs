//! # Categorical Encoding Transformers
//!
//! This module provides transformers that turn categorical columns into numeric codes.
//!
//! The encoders include:
//! - **CategoricalEncoder:** Encodes the binary and categorical columns named by a
//!   [`ColumnRegistry`], against the category values the registry declares. Output is either
//!   one ordinal column per feature or one-hot indicators with the first category dropped.
//!   Every other column is dropped.
//! - **OneHotEncoder:** Learns the sorted distinct values of every input column and expands
//!   each column into indicator columns.
//!
//! Both share [`ColumnEncoder`], the fitted encoding table. Values outside a column's
//! category list are rejected with [`PipelineError::UnknownCategory`].

use crate::columns::ColumnRegistry;
use crate::exceptions::{PipelineError, PipelineResult};
use crate::fitted::FitState;
use crate::pipeline::Transformer;
use crate::table::{column_names, from_columns, string_values};
use arrow::array::{ArrayRef, Float64Array, Int32Array, Int64Array};
use arrow::datatypes::{DataType, Field};
use arrow::record_batch::RecordBatch;
use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// Output layout of a [`ColumnEncoder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodingMode {
    /// One `Int64` column per feature holding the category's position in its list.
    Ordinal,
    /// One `Int32` indicator column per category, named `{column}_{category}`.
    OneHot { drop_first: bool },
}

#[derive(Debug, Clone)]
struct EncodedColumn {
    name: String,
    categories: Vec<String>,
    positions: HashMap<String, usize>,
}

impl EncodedColumn {
    fn new(name: String, categories: Vec<String>) -> Self {
        let mut positions = HashMap::with_capacity(categories.len());
        for (i, category) in categories.iter().enumerate() {
            positions.entry(category.clone()).or_insert(i);
        }
        Self {
            name,
            categories,
            positions,
        }
    }

    /// Category positions for every row of `x`.
    fn codes(&self, x: &RecordBatch) -> PipelineResult<Vec<usize>> {
        string_values(x, &self.name)?
            .into_iter()
            .map(|value| match value {
                Some(v) => self.positions.get(&v).copied().ok_or_else(|| {
                    PipelineError::UnknownCategory {
                        column: self.name.clone(),
                        value: v,
                    }
                }),
                None => Err(PipelineError::UnknownCategory {
                    column: self.name.clone(),
                    value: "<null>".to_string(),
                }),
            })
            .collect()
    }
}

/// A fitted encoding table: for each encoded column, its ordered category list.
#[derive(Debug, Clone)]
pub struct ColumnEncoder {
    mode: EncodingMode,
    columns: Vec<EncodedColumn>,
}

impl ColumnEncoder {
    /// Creates an encoder over `(column, categories)` pairs, in output order.
    pub fn new(mode: EncodingMode, domains: Vec<(String, Vec<String>)>) -> Self {
        Self {
            mode,
            columns: domains
                .into_iter()
                .map(|(name, categories)| EncodedColumn::new(name, categories))
                .collect(),
        }
    }

    pub fn mode(&self) -> EncodingMode {
        self.mode
    }

    /// The category list of `column`, if it is encoded.
    pub fn categories(&self, column: &str) -> Option<&[String]> {
        self.columns
            .iter()
            .find(|c| c.name == column)
            .map(|c| c.categories.as_slice())
    }

    /// Names of the columns [`ColumnEncoder::encode`] produces, in order.
    pub fn output_names(&self) -> Vec<String> {
        match self.mode {
            EncodingMode::Ordinal => self.columns.iter().map(|c| c.name.clone()).collect(),
            EncodingMode::OneHot { drop_first } => self
                .columns
                .iter()
                .flat_map(|c| {
                    c.categories
                        .iter()
                        .skip(usize::from(drop_first))
                        .map(move |category| format!("{}_{}", c.name, category))
                })
                .collect(),
        }
    }

    /// Fails on the first value of `x` outside its column's category list.
    pub fn validate(&self, x: &RecordBatch) -> PipelineResult<()> {
        for column in &self.columns {
            column.codes(x)?;
        }
        Ok(())
    }

    /// Encodes the configured columns of `x`; all other columns are dropped.
    pub fn encode(&self, x: &RecordBatch) -> PipelineResult<RecordBatch> {
        let mut output: Vec<(Field, ArrayRef)> = Vec::new();
        for column in &self.columns {
            let codes = column.codes(x)?;
            match self.mode {
                EncodingMode::Ordinal => {
                    let array: ArrayRef = Arc::new(Int64Array::from_iter_values(
                        codes.iter().map(|&code| code as i64),
                    ));
                    output.push((Field::new(&column.name, DataType::Int64, false), array));
                }
                EncodingMode::OneHot { drop_first } => {
                    let first = usize::from(drop_first);
                    for (position, category) in column.categories.iter().enumerate().skip(first) {
                        let array: ArrayRef = Arc::new(Int32Array::from_iter_values(
                            codes.iter().map(|&code| i32::from(code == position)),
                        ));
                        let name = format!("{}_{}", column.name, category);
                        output.push((Field::new(name, DataType::Int32, false), array));
                    }
                }
            }
        }
        from_columns(output, x.num_rows())
    }
}

/// ------------------------- CategoricalEncoder -------------------------
///
/// Constructor parameters of [`CategoricalEncoder`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CategoricalEncoderParams {
    /// One-hot (first category dropped) instead of ordinal codes.
    #[serde(default)]
    pub one_hot: bool,
    /// Accepted for configuration compatibility; Arrow output is always dense.
    #[serde(default)]
    pub force_dense_array: bool,
}

#[derive(Debug, Clone)]
struct FittedCategorical {
    encoder: ColumnEncoder,
    n_features_in: usize,
}

/// Encodes the registry's binary and categorical columns and drops everything else.
pub struct CategoricalEncoder {
    pub one_hot: bool,
    pub force_dense_array: bool,
    categorical_column_names: Vec<String>,
    categories: Vec<Vec<String>>,
    state: FitState<FittedCategorical>,
}

impl CategoricalEncoder {
    pub const NAME: &'static str = "categorical-encoder";

    /// Creates an encoder over the binary columns followed by the categorical columns of
    /// `registry`. Fails if the registry declares no values for one of them.
    pub fn new(
        one_hot: bool,
        force_dense_array: bool,
        registry: &dyn ColumnRegistry,
    ) -> PipelineResult<Self> {
        let mut categorical_column_names = registry.binary_column_names();
        categorical_column_names.extend(registry.categorical_column_names());
        let mapping = registry.categorical_values_mapping();
        let categories = categorical_column_names
            .iter()
            .map(|name| {
                mapping.get(name).cloned().ok_or_else(|| {
                    PipelineError::InvalidParameter(format!(
                        "Column registry declares no category values for '{}'",
                        name
                    ))
                })
            })
            .collect::<PipelineResult<Vec<_>>>()?;
        Ok(Self {
            one_hot,
            force_dense_array,
            categorical_column_names,
            categories,
            state: FitState::Unfitted,
        })
    }

    pub fn from_params(
        params: CategoricalEncoderParams,
        registry: &dyn ColumnRegistry,
    ) -> PipelineResult<Self> {
        Self::new(params.one_hot, params.force_dense_array, registry)
    }

    /// The encoded columns, binary first.
    pub fn categorical_column_names(&self) -> &[String] {
        &self.categorical_column_names
    }

    /// Number of columns seen by the last `fit`.
    pub fn n_features_in(&self) -> Option<usize> {
        match &self.state {
            FitState::Fitted(fitted) => Some(fitted.n_features_in),
            FitState::Unfitted => None,
        }
    }

    /// Output column names of the fitted encoder.
    pub fn output_names(&self) -> PipelineResult<Vec<String>> {
        Ok(self.state.get(Self::NAME)?.encoder.output_names())
    }

    fn mode(&self) -> EncodingMode {
        if self.one_hot {
            EncodingMode::OneHot { drop_first: true }
        } else {
            EncodingMode::Ordinal
        }
    }
}

impl Transformer for CategoricalEncoder {
    fn fit(&mut self, x: &RecordBatch, _y: Option<&Float64Array>) -> PipelineResult<()> {
        let domains = self
            .categorical_column_names
            .iter()
            .cloned()
            .zip(self.categories.iter().cloned())
            .collect();
        let encoder = ColumnEncoder::new(self.mode(), domains);
        encoder.validate(x)?;
        self.state.set(FittedCategorical {
            encoder,
            n_features_in: x.num_columns(),
        });
        Ok(())
    }

    fn transform(&self, x: &RecordBatch) -> PipelineResult<RecordBatch> {
        self.state.get(Self::NAME)?.encoder.encode(x)
    }

    fn is_fitted(&self) -> bool {
        self.state.is_fitted()
    }
}

/// ------------------------- OneHotEncoder -------------------------
///
/// Constructor parameters of [`OneHotEncoder`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OneHotEncoderParams {
    #[serde(default)]
    pub drop_first: bool,
}

/// Expands every input column into indicator columns, one per category seen during fit.
/// Categories are sorted, and nulls are not learned as a category.
pub struct OneHotEncoder {
    pub drop_first: bool,
    state: FitState<ColumnEncoder>,
}

impl OneHotEncoder {
    pub const NAME: &'static str = "one-hot-encoder";

    pub fn new(drop_first: bool) -> Self {
        Self {
            drop_first,
            state: FitState::Unfitted,
        }
    }

    pub fn from_params(params: OneHotEncoderParams) -> Self {
        Self::new(params.drop_first)
    }

    /// Learned categories of `column`.
    pub fn categories(&self, column: &str) -> Option<&[String]> {
        match &self.state {
            FitState::Fitted(encoder) => encoder.categories(column),
            FitState::Unfitted => None,
        }
    }
}

impl Transformer for OneHotEncoder {
    fn fit(&mut self, x: &RecordBatch, _y: Option<&Float64Array>) -> PipelineResult<()> {
        let mut domains = Vec::with_capacity(x.num_columns());
        for name in column_names(x) {
            let distinct: BTreeSet<String> = string_values(x, &name)?.into_iter().flatten().collect();
            domains.push((name, distinct.into_iter().collect()));
        }
        self.state.set(ColumnEncoder::new(
            EncodingMode::OneHot {
                drop_first: self.drop_first,
            },
            domains,
        ));
        Ok(())
    }

    fn transform(&self, x: &RecordBatch) -> PipelineResult<RecordBatch> {
        self.state.get(Self::NAME)?.encode(x)
    }

    fn is_fitted(&self) -> bool {
        self.state.is_fitted()
    }
}
