//! ## Data Loading and Writing
//!
//! Loading goes through DataFusion, which infers a schema from CSV headers or reads the
//! Parquet footer, and the result is materialised into a single [`RecordBatch`] for the
//! pipeline. Output tables (e.g. predictions) are written with Arrow's CSV writer or
//! Parquet's `ArrowWriter`. The format is picked from the file extension.
//!
//! These are the only async and I/O-bound functions in the crate; the pipeline itself is
//! synchronous.

use crate::exceptions::{PipelineError, PipelineResult};
use arrow::compute::concat_batches;
use arrow::record_batch::RecordBatch;
use datafusion::prelude::{CsvReadOptions, ParquetReadOptions, SessionContext};
use parquet::arrow::ArrowWriter;
use std::fs::File;
use std::path::Path;
use tracing::debug;

/// Supported on-disk table formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Csv,
    Parquet,
}

impl TableFormat {
    /// Detects the format from the file extension (`.csv` or `.parquet`).
    pub fn from_path(path: &Path) -> PipelineResult<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => Ok(TableFormat::Csv),
            Some(ext) if ext.eq_ignore_ascii_case("parquet") => Ok(TableFormat::Parquet),
            _ => Err(PipelineError::UnsupportedFormat(format!(
                "'{}'; please provide a CSV or Parquet file",
                path.display()
            ))),
        }
    }
}

/// Reads a CSV or Parquet file into one record batch.
pub async fn load_table(path: impl AsRef<Path>) -> PipelineResult<RecordBatch> {
    let path = path.as_ref();
    let format = TableFormat::from_path(path)?;
    let location = path.to_string_lossy().to_string();
    let ctx = SessionContext::new();
    let df = match format {
        TableFormat::Csv => ctx.read_csv(location.as_str(), CsvReadOptions::new()).await?,
        TableFormat::Parquet => {
            ctx.read_parquet(location.as_str(), ParquetReadOptions::default())
                .await?
        }
    };
    let declared = df.schema().inner().clone();
    let batches = df.collect().await?;
    let schema = batches
        .first()
        .map(|batch| batch.schema())
        .unwrap_or(declared);
    let table = concat_batches(&schema, &batches)?;
    debug!(
        "Loaded {} rows x {} columns from '{}'",
        table.num_rows(),
        table.num_columns(),
        path.display()
    );
    Ok(table)
}

/// Writes `batch` to a CSV or Parquet file, replacing any existing file.
pub fn write_table(path: impl AsRef<Path>, batch: &RecordBatch) -> PipelineResult<()> {
    let path = path.as_ref();
    let format = TableFormat::from_path(path)?;
    let file = File::create(path)?;
    match format {
        TableFormat::Csv => {
            let mut writer = arrow::csv::Writer::new(file);
            writer.write(batch)?;
        }
        TableFormat::Parquet => {
            let mut writer = ArrowWriter::try_new(file, batch.schema(), None)?;
            writer.write(batch)?;
            writer.close()?;
        }
    }
    debug!("Wrote {} rows to '{}'", batch.num_rows(), path.display());
    Ok(())
}
