//! ## Record Batch Helpers
//!
//! The pipeline works on Arrow [`RecordBatch`]es: named, row-aligned columns.
//! This module gathers the small column-level operations the steps share: lookup by name,
//! reading a column as strings or as `f64`, assembling a dense feature matrix,
//! appending a column, and splitting off the target column.

use crate::exceptions::{PipelineError, PipelineResult};
use arrow::array::{Array, ArrayRef, AsArray, Float64Array};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Field, Float64Type, Schema};
use arrow::record_batch::{RecordBatch, RecordBatchOptions};
use ndarray::Array2;
use std::sync::Arc;

/// Returns the column called `name`, or [`PipelineError::MissingColumn`].
pub fn column<'a>(batch: &'a RecordBatch, name: &str) -> PipelineResult<&'a ArrayRef> {
    batch
        .column_by_name(name)
        .ok_or_else(|| PipelineError::MissingColumn(format!("Column '{}' not found", name)))
}

/// Names of all columns, in schema order.
pub fn column_names(batch: &RecordBatch) -> Vec<String> {
    batch
        .schema()
        .fields()
        .iter()
        .map(|field| field.name().clone())
        .collect()
}

/// Reads a column as optional strings. Non-string columns are cast to `Utf8` first,
/// so integer or boolean categories compare by their textual form.
pub fn string_values(batch: &RecordBatch, name: &str) -> PipelineResult<Vec<Option<String>>> {
    let array = column(batch, name)?;
    let utf8 = cast(array.as_ref(), &DataType::Utf8)?;
    Ok(utf8
        .as_string::<i32>()
        .iter()
        .map(|value| value.map(str::to_string))
        .collect())
}

/// Returns true for data types that can be read as `f64` features.
pub fn is_numeric_type(data_type: &DataType) -> bool {
    data_type.is_numeric() || matches!(data_type, DataType::Boolean)
}

/// Reads a numeric (or boolean) column as `f64` values. Nulls are rejected.
pub fn numeric_values(batch: &RecordBatch, name: &str) -> PipelineResult<Vec<f64>> {
    let array = column(batch, name)?;
    if !is_numeric_type(array.data_type()) {
        return Err(PipelineError::InvalidParameter(format!(
            "Column '{}' must be numeric, but found {:?}",
            name,
            array.data_type()
        )));
    }
    if array.null_count() > 0 {
        return Err(PipelineError::InvalidParameter(format!(
            "Column '{}' contains {} null value(s)",
            name,
            array.null_count()
        )));
    }
    let floats = cast(array.as_ref(), &DataType::Float64)?;
    Ok(floats.as_primitive::<Float64Type>().values().to_vec())
}

/// Builds a dense row-major matrix from the named columns (one matrix column per name).
pub fn feature_matrix(batch: &RecordBatch, names: &[String]) -> PipelineResult<Array2<f64>> {
    let n_rows = batch.num_rows();
    let mut matrix = Array2::<f64>::zeros((n_rows, names.len()));
    for (j, name) in names.iter().enumerate() {
        let values = numeric_values(batch, name)?;
        for (i, value) in values.into_iter().enumerate() {
            matrix[[i, j]] = value;
        }
    }
    Ok(matrix)
}

/// Assembles a record batch from `(field, array)` pairs. An empty list yields a
/// zero-column batch that still carries `num_rows` rows.
pub fn from_columns(columns: Vec<(Field, ArrayRef)>, num_rows: usize) -> PipelineResult<RecordBatch> {
    let (fields, arrays): (Vec<Field>, Vec<ArrayRef>) = columns.into_iter().unzip();
    let options = RecordBatchOptions::new().with_row_count(Some(num_rows));
    RecordBatch::try_new_with_options(Arc::new(Schema::new(fields)), arrays, &options)
        .map_err(PipelineError::from)
}

/// Returns a copy of `batch` with `array` appended as column `name`.
/// An existing column with the same name is replaced in place.
pub fn with_column(batch: &RecordBatch, name: &str, array: ArrayRef) -> PipelineResult<RecordBatch> {
    let schema = batch.schema();
    let mut columns: Vec<(Field, ArrayRef)> = schema
        .fields()
        .iter()
        .zip(batch.columns())
        .map(|(field, array)| (field.as_ref().clone(), Arc::clone(array)))
        .collect();
    let field = Field::new(name, array.data_type().clone(), array.null_count() > 0);
    match columns.iter().position(|(f, _)| f.name() == name) {
        Some(index) => columns[index] = (field, array),
        None => columns.push((field, array)),
    }
    from_columns(columns, batch.num_rows())
}

/// Splits `batch` into the feature columns and the `target` column read as `f64`.
pub fn split_target(batch: &RecordBatch, target: &str) -> PipelineResult<(RecordBatch, Float64Array)> {
    let y = Float64Array::from(numeric_values(batch, target)?);
    let index = batch.schema().index_of(target)?;
    let mut features = batch.clone();
    features.remove_column(index);
    Ok((features, y))
}

/// Fails unless the target has exactly one value per row of `x`.
pub(crate) fn check_target_len(x: &RecordBatch, y: &Float64Array) -> PipelineResult<()> {
    if x.num_rows() != y.len() {
        return Err(PipelineError::InvalidParameter(format!(
            "Found {} rows in X but {} target values",
            x.num_rows(),
            y.len()
        )));
    }
    if y.null_count() > 0 {
        return Err(PipelineError::InvalidParameter(
            "Target vector contains null values".to_string(),
        ));
    }
    Ok(())
}
