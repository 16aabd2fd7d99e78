//! # Regression Pipeline
//!
//! Configurable feature-engineering and regression pipelines over Apache Arrow record batches.
//!
//! A pipeline is described by an ordered list of `{name, params}` entries
//! ([`config::StepConfig`]). [`registry::build_estimator`] resolves each name to a step
//! (an encoder, a discretizer, a group-average feature, a scaler, or a regressor) and chains
//! them into a [`pipeline::Pipeline`] that is then fitted and used for prediction:
//!
//! ```rust,no_run
//! use regression_pipeline::columns::StaticColumnRegistry;
//! use regression_pipeline::config::parse_config;
//! use regression_pipeline::registry::build_estimator;
//! use regression_pipeline::table::split_target;
//! # fn run(train: arrow::record_batch::RecordBatch) -> regression_pipeline::exceptions::PipelineResult<()> {
//! let config = parse_config(
//!     r#"[{"name": "categorical-encoder", "params": {"one_hot": true}},
//!         {"name": "bagging", "params": {}}]"#,
//! )?;
//! let mut pipeline = build_estimator(&config, &StaticColumnRegistry::insurance())?;
//! let (x, y) = split_target(&train, "charges")?;
//! pipeline.fit(&x, &y)?;
//! let predictions = pipeline.predict(&x)?;
//! # Ok(())
//! # }
//! ```
//!
//! Fitting and prediction are synchronous and run on the caller's thread. A fitted
//! pipeline may be shared read-only across threads.

pub mod columns;
pub mod config;
pub mod estimators;
pub mod exceptions;
pub mod fitted;
pub mod io;
mod logging;
pub mod metrics;
pub mod pipeline;
pub mod registry;
pub mod table;
pub mod transformers;
