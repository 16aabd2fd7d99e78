mod common;

use std::path::Path;
use std::sync::Arc;

use arrow::array::{Array, ArrayRef};
use arrow::datatypes::DataType;
use regression_pipeline::columns::StaticColumnRegistry;
use regression_pipeline::config::parse_config;
use regression_pipeline::exceptions::{PipelineError, PipelineResult};
use regression_pipeline::io::{load_table, write_table, TableFormat};
use regression_pipeline::registry::build_estimator;
use regression_pipeline::table::{split_target, with_column};
use tempfile::tempdir;

use common::{f64_column, i64_column, insurance_batch, schema_names};

const INSURANCE_CSV: &str = "\
age,sex,bmi,children,smoker,region,charges
19,female,27.9,0,yes,southwest,16884.924
18,male,33.77,1,no,southeast,1725.5523
28,male,33.0,3,no,southeast,4449.462
33,male,22.705,0,no,northwest,21984.47061
32,male,28.88,0,no,northwest,3866.8552
";

#[test]
fn test_format_from_extension() {
    assert_eq!(
        TableFormat::from_path(Path::new("data/train.csv")).ok(),
        Some(TableFormat::Csv)
    );
    assert_eq!(
        TableFormat::from_path(Path::new("train.PARQUET")).ok(),
        Some(TableFormat::Parquet)
    );
    assert!(matches!(
        TableFormat::from_path(Path::new("train.json")),
        Err(PipelineError::UnsupportedFormat(_))
    ));
    assert!(TableFormat::from_path(Path::new("train")).is_err());
}

#[tokio::test]
async fn test_load_csv_infers_column_types() -> PipelineResult<()> {
    let dir = tempdir()?;
    let path = dir.path().join("insurance.csv");
    std::fs::write(&path, INSURANCE_CSV)?;

    let table = load_table(&path).await?;
    assert_eq!(table.num_rows(), 5);
    assert_eq!(
        schema_names(&table),
        vec!["age", "sex", "bmi", "children", "smoker", "region", "charges"]
    );
    let schema = table.schema();
    assert_eq!(schema.field_with_name("age")?.data_type(), &DataType::Int64);
    assert_eq!(schema.field_with_name("bmi")?.data_type(), &DataType::Float64);
    assert_eq!(i64_column(&table, "children"), vec![0, 1, 3, 0, 0]);
    Ok(())
}

#[tokio::test]
async fn test_parquet_round_trip_keeps_values() -> PipelineResult<()> {
    let dir = tempdir()?;
    let path = dir.path().join("insurance.parquet");
    let original = insurance_batch();
    write_table(&path, &original)?;

    let loaded = load_table(&path).await?;
    assert_eq!(schema_names(&loaded), schema_names(&original));
    assert_eq!(f64_column(&loaded, "charges"), f64_column(&original, "charges"));
    assert_eq!(i64_column(&loaded, "age"), i64_column(&original, "age"));
    Ok(())
}

#[tokio::test]
async fn test_unsupported_and_missing_files() {
    assert!(matches!(
        load_table("insurance.xlsx").await,
        Err(PipelineError::UnsupportedFormat(_))
    ));
    let dir = tempdir().expect("temp dir");
    assert!(load_table(dir.path().join("absent.csv")).await.is_err());
}

#[tokio::test]
async fn test_loaded_table_feeds_a_pipeline() -> PipelineResult<()> {
    let dir = tempdir()?;
    let train_path = dir.path().join("train.csv");
    std::fs::write(&train_path, INSURANCE_CSV)?;

    let config = parse_config(
        r#"[
            {"name": "categorical-encoder", "params": {"one_hot": true}},
            {"name": "linear-regressor"}
        ]"#,
    )?;
    let mut pipeline = build_estimator(&config, &StaticColumnRegistry::insurance())?;
    let train = load_table(&train_path).await?;
    let (x, y) = split_target(&train, "charges")?;
    pipeline.fit(&x, &y)?;
    let predictions = pipeline.predict(&x)?;
    assert_eq!(predictions.len(), 5);

    let output_path = dir.path().join("predictions.csv");
    let predictions: ArrayRef = Arc::new(predictions);
    write_table(&output_path, &with_column(&train, "prediction", predictions)?)?;

    let written = load_table(&output_path).await?;
    assert_eq!(schema_names(&written).last().map(String::as_str), Some("prediction"));
    assert_eq!(written.num_rows(), 5);
    Ok(())
}
