//! # Transformer Implementations
//!
//! The submodules contain the fit/transform steps used for feature engineering.

pub mod categorical_encoding;
pub mod group_average;
pub mod scaling;
pub mod variable_discretization;
