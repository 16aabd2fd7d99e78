//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use arrow::array::{Array, ArrayRef, AsArray, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{Float64Type, Int32Type, Int64Type};
use arrow::record_batch::RecordBatch;

/// First rows of the medical insurance charges dataset.
pub fn insurance_batch() -> RecordBatch {
    let age: ArrayRef = Arc::new(Int64Array::from(vec![19, 18, 28, 33, 32, 31, 46, 37]));
    let sex: ArrayRef = Arc::new(StringArray::from(vec![
        "female", "male", "male", "male", "male", "female", "female", "female",
    ]));
    let bmi: ArrayRef = Arc::new(Float64Array::from(vec![
        27.9, 33.77, 33.0, 22.705, 28.88, 25.74, 33.44, 27.74,
    ]));
    let children: ArrayRef = Arc::new(Int64Array::from(vec![0, 1, 3, 0, 0, 0, 1, 3]));
    let smoker: ArrayRef = Arc::new(StringArray::from(vec![
        "yes", "no", "no", "no", "no", "no", "no", "no",
    ]));
    let region: ArrayRef = Arc::new(StringArray::from(vec![
        "southwest",
        "southeast",
        "southeast",
        "northwest",
        "northwest",
        "southeast",
        "southeast",
        "northwest",
    ]));
    let charges: ArrayRef = Arc::new(Float64Array::from(vec![
        16884.924, 1725.5523, 4449.462, 21984.47061, 3866.8552, 3756.6216, 8240.5896, 7281.5056,
    ]));
    RecordBatch::try_from_iter(vec![
        ("age", age),
        ("sex", sex),
        ("bmi", bmi),
        ("children", children),
        ("smoker", smoker),
        ("region", region),
        ("charges", charges),
    ])
    .expect("valid insurance batch")
}

/// Builds a batch from `(name, array)` pairs.
pub fn batch(columns: Vec<(&str, ArrayRef)>) -> RecordBatch {
    RecordBatch::try_from_iter(columns).expect("valid batch")
}

pub fn strings(values: &[&str]) -> ArrayRef {
    Arc::new(StringArray::from(values.to_vec()))
}

pub fn floats(values: &[f64]) -> ArrayRef {
    Arc::new(Float64Array::from(values.to_vec()))
}

pub fn schema_names(batch: &RecordBatch) -> Vec<String> {
    batch
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect()
}

pub fn f64_column(batch: &RecordBatch, name: &str) -> Vec<f64> {
    batch
        .column_by_name(name)
        .unwrap_or_else(|| panic!("missing column {}", name))
        .as_primitive::<Float64Type>()
        .values()
        .to_vec()
}

pub fn i64_column(batch: &RecordBatch, name: &str) -> Vec<i64> {
    batch
        .column_by_name(name)
        .unwrap_or_else(|| panic!("missing column {}", name))
        .as_primitive::<Int64Type>()
        .values()
        .to_vec()
}

pub fn i32_column(batch: &RecordBatch, name: &str) -> Vec<i32> {
    let array = batch
        .column_by_name(name)
        .unwrap_or_else(|| panic!("missing column {}", name));
    assert_eq!(array.null_count(), 0);
    array.as_primitive::<Int32Type>().values().to_vec()
}
