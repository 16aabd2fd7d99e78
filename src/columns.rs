//! ## Column Registry
//!
//! The categorical encoder does not learn its categories from data. Instead, a
//! [`ColumnRegistry`] names the binary and categorical columns of a dataset and
//! declares the ordered set of values each of them may take. That order fixes the
//! ordinal codes and the one-hot column layout, independently of the training rows.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::exceptions::PipelineResult;

/// Source of categorical column metadata.
pub trait ColumnRegistry {
    /// Names of the two-valued columns (e.g. `sex`, `smoker`).
    fn binary_column_names(&self) -> Vec<String>;

    /// Names of the multi-valued categorical columns (e.g. `region`).
    fn categorical_column_names(&self) -> Vec<String>;

    /// Ordered allowed values for every binary and categorical column.
    fn categorical_values_mapping(&self) -> HashMap<String, Vec<String>>;
}

/// A registry whose contents are fixed at construction (or loaded from JSON).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StaticColumnRegistry {
    #[serde(default)]
    pub binary: Vec<String>,
    #[serde(default)]
    pub categorical: Vec<String>,
    #[serde(default)]
    pub values: HashMap<String, Vec<String>>,
}

impl StaticColumnRegistry {
    pub fn new(
        binary: Vec<String>,
        categorical: Vec<String>,
        values: HashMap<String, Vec<String>>,
    ) -> Self {
        Self {
            binary,
            categorical,
            values,
        }
    }

    /// Columns of the medical insurance charges dataset
    /// (`age`, `sex`, `bmi`, `children`, `smoker`, `region`, `charges`).
    pub fn insurance() -> Self {
        let owned = |values: &[&str]| values.iter().map(|v| v.to_string()).collect::<Vec<_>>();
        let values = HashMap::from([
            ("sex".to_string(), owned(&["female", "male"])),
            ("smoker".to_string(), owned(&["no", "yes"])),
            (
                "region".to_string(),
                owned(&["northeast", "northwest", "southeast", "southwest"]),
            ),
        ]);
        Self::new(owned(&["sex", "smoker"]), owned(&["region"]), values)
    }

    /// Reads a registry from a JSON file of the form
    /// `{"binary": [...], "categorical": [...], "values": {"col": [...]}}`.
    pub fn from_json_file(path: impl AsRef<Path>) -> PipelineResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

impl ColumnRegistry for StaticColumnRegistry {
    fn binary_column_names(&self) -> Vec<String> {
        self.binary.clone()
    }

    fn categorical_column_names(&self) -> Vec<String> {
        self.categorical.clone()
    }

    fn categorical_values_mapping(&self) -> HashMap<String, Vec<String>> {
        self.values.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insurance_registry_declares_every_column() {
        let registry = StaticColumnRegistry::insurance();
        let mapping = registry.categorical_values_mapping();
        for name in registry
            .binary_column_names()
            .iter()
            .chain(registry.categorical_column_names().iter())
        {
            assert!(mapping.contains_key(name), "no values declared for {}", name);
        }
        assert_eq!(mapping["region"].len(), 4);
    }

    #[test]
    fn test_registry_from_json() {
        let registry: StaticColumnRegistry = serde_json::from_str(
            r#"{"binary": ["smoker"], "values": {"smoker": ["no", "yes"]}}"#,
        )
        .unwrap();
        assert_eq!(registry.binary_column_names(), vec!["smoker"]);
        assert!(registry.categorical_column_names().is_empty());
    }
}
