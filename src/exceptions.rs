//! ## Custom Errors for Regression Pipeline
//!
//! This module defines the error types returned by the library.
//! It uses the `thiserror` crate to derive the `Error` trait for custom error types.
//! The `PipelineError` enum holds the failures raised while building, fitting, and
//! applying a pipeline, plus wrappers around the errors of the underlying data stack.
//!
//! The `PipelineResult` type alias simplifies error handling by providing a convenient
//! alias for results returned by the library.
//!
//! ### Example
//!
//! ```rust
//! use regression_pipeline::exceptions::{PipelineError, PipelineResult};
//!
//! fn lookup(name: &str) -> PipelineResult<()> {
//!     Err(PipelineError::UnknownStep(name.into()))
//! }
//! ```

use thiserror::Error;

/// Errors specific to the Regression Pipeline library.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Wraps underlying I/O errors.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Wraps errors from DataFusion.
    #[error("DataFusion error: {0}")]
    DataFusionError(#[from] datafusion::error::DataFusionError),

    /// Wraps errors from Arrow.
    #[error("Arrow error: {0}")]
    ArrowError(#[from] arrow::error::ArrowError),

    /// Wraps errors from Parquet.
    #[error("Parquet error: {0}")]
    ParquetError(#[from] parquet::errors::ParquetError),

    /// Wraps JSON (de)serialization errors raised while reading configuration files.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// A configuration entry names a step that the estimator registry does not know.
    #[error("Unknown step: '{0}'")]
    UnknownStep(String),

    /// The parameters of a configuration entry do not match the step's constructor.
    #[error("Invalid params for step '{step}': {reason}")]
    InvalidParams { step: String, reason: String },

    /// `transform` or `predict` was called on a step that has not been fitted.
    #[error("Step '{0}' is not fitted; call fit first")]
    NotFitted(String),

    /// A categorical column holds a value outside its declared domain.
    #[error("Unknown category '{value}' in column '{column}'")]
    UnknownCategory { column: String, value: String },

    /// The discretizer was given a binning strategy it does not implement.
    #[error("Invalid binning strategy '{0}'; expected one of 'uniform', 'quantile', 'kmeans'")]
    InvalidStrategy(String),

    /// Indicates that an invalid parameter was provided (e.g., unsupported value or incorrect data type).
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Indicates that the provided data format is unsupported (e.g., unknown file format).
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Indicates that the specified column does not exist in the record batch.
    #[error("Missing column: {0}")]
    MissingColumn(String),

    /// A pipeline step failed; carries the step name and the underlying error.
    #[error("Step '{step}' failed: {source}")]
    StepFailed {
        step: String,
        #[source]
        source: Box<PipelineError>,
    },
}

impl PipelineError {
    /// Wraps `self` with the name of the pipeline step that raised it.
    pub fn in_step(self, step: &str) -> Self {
        PipelineError::StepFailed {
            step: step.to_string(),
            source: Box::new(self),
        }
    }

    /// Returns the innermost error, looking through any `StepFailed` wrappers.
    pub fn root_cause(&self) -> &PipelineError {
        match self {
            PipelineError::StepFailed { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

/// A convenient result type for Regression Pipeline operations.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_io_error() {
        let io_err = io::Error::new(io::ErrorKind::Other, "test io error");
        let err: PipelineError = io_err.into();
        let err_msg = format!("{}", err);
        assert!(err_msg.contains("I/O error:"));
        assert!(err_msg.contains("test io error"));
    }

    #[test]
    fn test_arrow_error() {
        let arrow_err = arrow::error::ArrowError::ComputeError("test compute error".into());
        let err: PipelineError = arrow_err.into();
        let err_msg = format!("{}", err);
        assert!(err_msg.contains("Arrow error:"));
        assert!(err_msg.contains("test compute error"));
    }

    #[test]
    fn test_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: PipelineError = json_err.into();
        assert!(format!("{}", err).contains("JSON error:"));
    }

    #[test]
    fn test_unknown_step_error() {
        let err = PipelineError::UnknownStep("random-forest".into());
        assert_eq!(format!("{}", err), "Unknown step: 'random-forest'");
    }

    #[test]
    fn test_unknown_category_error() {
        let err = PipelineError::UnknownCategory {
            column: "region".into(),
            value: "atlantis".into(),
        };
        let err_msg = format!("{}", err);
        assert!(err_msg.contains("'atlantis'"));
        assert!(err_msg.contains("'region'"));
    }

    #[test]
    fn test_not_fitted_error() {
        let err = PipelineError::NotFitted("discretizer".into());
        assert!(format!("{}", err).contains("call fit first"));
    }

    #[test]
    fn test_step_failed_keeps_root_cause() {
        let err = PipelineError::InvalidStrategy("median".into())
            .in_step("discretizer")
            .in_step("outer");
        assert!(format!("{}", err).starts_with("Step 'outer' failed:"));
        assert!(matches!(
            err.root_cause(),
            PipelineError::InvalidStrategy(name) if name == "median"
        ));
    }
}
