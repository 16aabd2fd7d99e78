//! Command-line entry point: fit a configured pipeline on a CSV or Parquet file,
//! report its fit, and optionally write predictions.
//!
//! ```sh
//! regression-pipeline --train insurance.csv --config pipeline.json --target charges \
//!     --test holdout.csv --output predictions.parquet
//! ```

use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array};
use arrow::record_batch::RecordBatch;
use clap::Parser;
use tracing::info;

use regression_pipeline::columns::StaticColumnRegistry;
use regression_pipeline::config::load_config;
use regression_pipeline::exceptions::PipelineResult;
use regression_pipeline::io::{load_table, write_table};
use regression_pipeline::metrics::{r2_score, root_mean_squared_error};
use regression_pipeline::pipeline::Pipeline;
use regression_pipeline::registry::build_estimator_with;
use regression_pipeline::table::{split_target, with_column};

/// Fit a regression pipeline described by a JSON configuration
#[derive(Parser, Debug)]
#[command(name = "regression-pipeline")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Training data (CSV or Parquet, determined by extension)
    #[arg(long)]
    train: PathBuf,

    /// Pipeline configuration: a JSON array of {"name": ..., "params": {...}} steps
    #[arg(short, long)]
    config: PathBuf,

    /// Name of the target column
    #[arg(short, long, default_value = "charges")]
    target: String,

    /// Column registry JSON ({"binary": [...], "categorical": [...], "values": {...}}).
    /// Defaults to the insurance dataset columns.
    #[arg(long)]
    columns: Option<PathBuf>,

    /// Data to predict on; it may or may not carry the target column.
    /// Defaults to the training data.
    #[arg(long)]
    test: Option<PathBuf>,

    /// Where to write the input rows with a `prediction` column (CSV or Parquet)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Log every step at INFO level
    #[arg(short, long)]
    verbose: bool,
}

/// Prints RMSE and R² of `predictions` against `y`.
fn report(label: &str, y: &Float64Array, predictions: &Float64Array) -> PipelineResult<()> {
    let rmse = root_mean_squared_error(y.values(), predictions.values())?;
    let r2 = r2_score(y.values(), predictions.values())?;
    println!("{:<6} rows={:<8} rmse={:<14.4} r2={:.4}", label, y.len(), rmse, r2);
    Ok(())
}

/// Predicts on `table`, scoring against its target column when present.
fn predict_table(pipeline: &Pipeline, table: &RecordBatch, target: &str) -> PipelineResult<Float64Array> {
    if table.column_by_name(target).is_some() {
        let (x, y) = split_target(table, target)?;
        let predictions = pipeline.predict(&x)?;
        report("test", &y, &predictions)?;
        Ok(predictions)
    } else {
        pipeline.predict(table)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    if cli.verbose {
        // No-op when DEBUG_REGRESSION_PIPELINE already installed a subscriber.
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .try_init();
    }

    let config = load_config(&cli.config)?;
    let registry = match &cli.columns {
        Some(path) => StaticColumnRegistry::from_json_file(path)?,
        None => StaticColumnRegistry::insurance(),
    };
    let mut pipeline = build_estimator_with(&config, &registry, cli.verbose)?;
    info!("Built pipeline with steps {:?}", pipeline.step_names());

    let train = load_table(&cli.train).await?;
    let (x, y) = split_target(&train, &cli.target)?;
    pipeline.fit(&x, &y)?;
    report("train", &y, &pipeline.predict(&x)?)?;

    let (table, predictions) = match &cli.test {
        Some(path) => {
            let test = load_table(path).await?;
            let predictions = predict_table(&pipeline, &test, &cli.target)?;
            (test, predictions)
        }
        None => {
            let predictions = pipeline.predict(&x)?;
            (train, predictions)
        }
    };

    if let Some(output) = &cli.output {
        let predictions: ArrayRef = Arc::new(predictions);
        let result = with_column(&table, "prediction", predictions)?;
        write_table(output, &result)?;
        println!("Wrote {} predictions to {}", result.num_rows(), output.display());
    }
    Ok(())
}
