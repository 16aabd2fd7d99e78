//! ## Transformer for discretizing continuous variables
//!
//! [`Discretizer`] bins selected numeric columns into ordinal buckets (`0..bins`) and passes
//! every other column through unchanged.
//!
//! Bin edges are learned per column with one of three strategies:
//!
//! - **uniform:** `bins` intervals of equal width between the column's min and max.
//! - **quantile:** edges at evenly spaced percentiles, so bins hold roughly equal counts.
//! - **kmeans:** edges halfway between the sorted centers of a 1-D k-means clustering.
//!
//! The output puts the binned columns first (in configured order), followed by the remaining
//! columns in their original relative order. Callers must not rely on the input's column
//! positions surviving this step.

use crate::exceptions::{PipelineError, PipelineResult};
use crate::fitted::FitState;
use crate::pipeline::Transformer;
use crate::table::{column, column_names, from_columns, numeric_values};
use arrow::array::{ArrayRef, Float64Array, Int64Array};
use arrow::datatypes::{DataType, Field};
use arrow::record_batch::RecordBatch;
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::warn;

const KMEANS_MAX_ITER: usize = 300;
const KMEANS_TOL: f64 = 1e-4;
const MIN_BIN_WIDTH: f64 = 1e-8;

/// How bin edges are placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinningStrategy {
    Uniform,
    Quantile,
    KMeans,
}

impl FromStr for BinningStrategy {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "uniform" => Ok(BinningStrategy::Uniform),
            "quantile" => Ok(BinningStrategy::Quantile),
            "kmeans" => Ok(BinningStrategy::KMeans),
            other => Err(PipelineError::InvalidStrategy(other.to_string())),
        }
    }
}

/// Evenly spaced values from `start` to `end`, both included.
fn linspace(start: f64, end: f64, count: usize) -> Vec<f64> {
    if count == 1 {
        return vec![start];
    }
    let step = (end - start) / (count - 1) as f64;
    (0..count)
        .map(|i| if i == count - 1 { end } else { start + step * i as f64 })
        .collect()
}

/// Percentile `q` (in `[0, 100]`) of sorted values, with linear interpolation.
fn percentile(sorted: &[f64], q: f64) -> f64 {
    let position = q / 100.0 * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
}

/// Sorted cluster centers of a 1-D k-means fit started from `centers`.
fn kmeans_centers(values: &[f64], mut centers: Vec<f64>) -> Vec<f64> {
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    let tolerance = KMEANS_TOL * variance;
    for _ in 0..KMEANS_MAX_ITER {
        let mut sums = vec![0.0; centers.len()];
        let mut counts = vec![0usize; centers.len()];
        for &value in values {
            let nearest = centers
                .iter()
                .enumerate()
                .min_by(|(_, a), (_, b)| (value - **a).abs().total_cmp(&(value - **b).abs()))
                .map(|(i, _)| i)
                .unwrap_or(0);
            sums[nearest] += value;
            counts[nearest] += 1;
        }
        let mut shift = 0.0;
        for (k, center) in centers.iter_mut().enumerate() {
            // An empty cluster keeps its previous center.
            if counts[k] > 0 {
                let updated = sums[k] / counts[k] as f64;
                shift += (updated - *center).powi(2);
                *center = updated;
            }
        }
        if shift <= tolerance {
            break;
        }
    }
    centers.sort_by(f64::total_cmp);
    centers
}

/// Drops edges closer than `MIN_BIN_WIDTH` to their predecessor.
fn remove_narrow_bins(edges: Vec<f64>) -> Vec<f64> {
    let mut kept: Vec<f64> = Vec::with_capacity(edges.len());
    for edge in edges {
        match kept.last() {
            Some(&previous) if edge - previous <= MIN_BIN_WIDTH => {}
            _ => kept.push(edge),
        }
    }
    kept
}

/// Learned bin edges of one column: `edges.len() - 1` bins.
#[derive(Debug, Clone, PartialEq)]
pub struct BinEdges {
    pub column: String,
    pub edges: Vec<f64>,
}

impl BinEdges {
    /// Learns edges for `values` (non-empty) with the given strategy and requested bin count.
    pub fn fit(column: &str, values: &[f64], bins: usize, strategy: BinningStrategy) -> Self {
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if min == max {
            warn!("Column '{}' is constant; it is assigned a single bin", column);
            return Self {
                column: column.to_string(),
                edges: vec![f64::NEG_INFINITY, f64::INFINITY],
            };
        }
        let edges = match strategy {
            BinningStrategy::Uniform => linspace(min, max, bins + 1),
            BinningStrategy::Quantile => {
                let mut sorted = values.to_vec();
                sorted.sort_by(f64::total_cmp);
                let edges = linspace(0.0, 100.0, bins + 1)
                    .into_iter()
                    .map(|q| percentile(&sorted, q))
                    .collect();
                remove_narrow_bins(edges)
            }
            BinningStrategy::KMeans => {
                let uniform = linspace(min, max, bins + 1);
                let init = uniform.windows(2).map(|w| (w[0] + w[1]) * 0.5).collect();
                let centers = kmeans_centers(values, init);
                let mut edges = Vec::with_capacity(bins + 1);
                edges.push(min);
                edges.extend(centers.windows(2).map(|w| (w[0] + w[1]) * 0.5));
                edges.push(max);
                remove_narrow_bins(edges)
            }
        };
        if edges.len() - 1 < bins {
            warn!(
                "Bins whose width are too small in column '{}' were removed; {} of {} bins remain",
                column,
                edges.len() - 1,
                bins
            );
        }
        Self {
            column: column.to_string(),
            edges,
        }
    }

    /// Number of effective bins.
    pub fn n_bins(&self) -> usize {
        self.edges.len() - 1
    }

    /// Bin of `value`: the count of upper edges at or below it, clipped to the last bin.
    /// A small tolerance keeps values sitting on an edge from slipping into the lower bin.
    pub fn bin(&self, value: f64) -> i64 {
        let shifted = value + 1e-8 + 1e-5 * value.abs();
        let index = self.edges[1..].partition_point(|&edge| edge <= shifted);
        index.min(self.n_bins() - 1) as i64
    }
}

/// Reads a JSON object into `(key, value)` pairs, keeping key order.
fn ordered_bins<'de, D>(deserializer: D) -> Result<Vec<(String, usize)>, D::Error>
where
    D: Deserializer<'de>,
{
    struct OrderedBins;

    impl<'de> Visitor<'de> for OrderedBins {
        type Value = Vec<(String, usize)>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a map from column name to bin count")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
            let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some(entry) = map.next_entry::<String, usize>()? {
                entries.push(entry);
            }
            Ok(entries)
        }
    }

    deserializer.deserialize_map(OrderedBins)
}

/// Constructor parameters of [`Discretizer`].
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DiscretizerParams {
    /// Column name to bin count, in output order.
    #[serde(deserialize_with = "ordered_bins")]
    pub bins_per_column: Vec<(String, usize)>,
    /// One of `uniform`, `quantile`, `kmeans`; checked at fit.
    pub strategy: String,
}

#[derive(Debug, Clone)]
struct FittedDiscretizer {
    edges: Vec<BinEdges>,
    original_column_order: Vec<String>,
    passthrough: Vec<String>,
}

/// Bins the configured columns and reorders the output as
/// `[binned columns..., remaining columns...]`.
pub struct Discretizer {
    pub bins_per_column: Vec<(String, usize)>,
    pub strategy: String,
    state: FitState<FittedDiscretizer>,
}

impl Discretizer {
    pub const NAME: &'static str = "discretizer";

    pub fn new(bins_per_column: Vec<(String, usize)>, strategy: impl Into<String>) -> Self {
        Self {
            bins_per_column,
            strategy: strategy.into(),
            state: FitState::Unfitted,
        }
    }

    pub fn from_params(params: DiscretizerParams) -> Self {
        Self::new(params.bins_per_column, params.strategy)
    }

    /// Learned edges of `column`.
    pub fn bin_edges(&self, column: &str) -> Option<&BinEdges> {
        match &self.state {
            FitState::Fitted(fitted) => fitted.edges.iter().find(|e| e.column == column),
            FitState::Unfitted => None,
        }
    }

    /// Input column order recorded by the last `fit`.
    pub fn original_column_order(&self) -> Option<&[String]> {
        match &self.state {
            FitState::Fitted(fitted) => Some(&fitted.original_column_order),
            FitState::Unfitted => None,
        }
    }

    /// Output column order of the fitted discretizer.
    pub fn output_column_order(&self) -> PipelineResult<Vec<String>> {
        let fitted = self.state.get(Self::NAME)?;
        Ok(fitted
            .edges
            .iter()
            .map(|e| e.column.clone())
            .chain(fitted.passthrough.iter().cloned())
            .collect())
    }
}

impl Transformer for Discretizer {
    fn fit(&mut self, x: &RecordBatch, _y: Option<&Float64Array>) -> PipelineResult<()> {
        let strategy: BinningStrategy = self.strategy.parse()?;
        if self.bins_per_column.is_empty() {
            return Err(PipelineError::InvalidParameter(
                "bins_per_column must name at least one column".to_string(),
            ));
        }
        if x.num_rows() == 0 {
            return Err(PipelineError::InvalidParameter(
                "Cannot fit discretizer on zero rows".to_string(),
            ));
        }
        let mut edges = Vec::with_capacity(self.bins_per_column.len());
        for (i, (name, bins)) in self.bins_per_column.iter().enumerate() {
            if self.bins_per_column[..i].iter().any(|(seen, _)| seen == name) {
                return Err(PipelineError::InvalidParameter(format!(
                    "Column '{}' appears more than once in bins_per_column",
                    name
                )));
            }
            if *bins < 2 {
                return Err(PipelineError::InvalidParameter(format!(
                    "Column '{}' needs at least 2 bins, got {}",
                    name, bins
                )));
            }
            let values = numeric_values(x, name)?;
            edges.push(BinEdges::fit(name, &values, *bins, strategy));
        }
        let original_column_order = column_names(x);
        let passthrough = original_column_order
            .iter()
            .filter(|name| !self.bins_per_column.iter().any(|(binned, _)| binned == *name))
            .cloned()
            .collect();
        self.state.set(FittedDiscretizer {
            edges,
            original_column_order,
            passthrough,
        });
        Ok(())
    }

    fn transform(&self, x: &RecordBatch) -> PipelineResult<RecordBatch> {
        let fitted = self.state.get(Self::NAME)?;
        let mut output: Vec<(Field, ArrayRef)> =
            Vec::with_capacity(fitted.edges.len() + fitted.passthrough.len());
        for bin_edges in &fitted.edges {
            let codes: Int64Array = numeric_values(x, &bin_edges.column)?
                .into_iter()
                .map(|value| Some(bin_edges.bin(value)))
                .collect();
            output.push((
                Field::new(&bin_edges.column, DataType::Int64, false),
                Arc::new(codes) as ArrayRef,
            ));
        }
        let schema = x.schema();
        for name in &fitted.passthrough {
            let array = column(x, name)?;
            let field = schema.field_with_name(name)?;
            output.push((field.clone(), Arc::clone(array)));
        }
        from_columns(output, x.num_rows())
    }

    fn is_fitted(&self) -> bool {
        self.state.is_fitted()
    }
}
