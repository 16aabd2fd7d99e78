//! # Regressor Implementations
//!
//! The submodules contain the fit/predict steps that may end a pipeline.

pub mod bagging;
pub mod group_average;
pub mod linear;
