//! Condition entries and comparison thresholds.

use serde::{Deserialize, Serialize};

/// A raw condition entry. The operator stays a string token until validation
/// so unknown tokens can be reported with a suggestion instead of a serde error.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ConditionSpec {
    pub parameter_index: u32,
    pub operator: String,
    pub threshold: Threshold,
}

/// Right-hand side of a comparison: a single number for ordering operators,
/// a finite list for `in` / `not_in`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Threshold {
    Number(f64),
    Set(Vec<f64>),
}

impl Threshold {
    /// Short type name used in validation messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Threshold::Number(_) => "number",
            Threshold::Set(_) => "list",
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Threshold::Number(n) => Some(*n),
            Threshold::Set(_) => None,
        }
    }

    pub fn as_set(&self) -> Option<&[f64]> {
        match self {
            Threshold::Number(_) => None,
            Threshold::Set(values) => Some(values),
        }
    }
}

impl From<f64> for Threshold {
    fn from(value: f64) -> Self {
        Threshold::Number(value)
    }
}

impl From<Vec<f64>> for Threshold {
    fn from(values: Vec<f64>) -> Self {
        Threshold::Set(values)
    }
}
