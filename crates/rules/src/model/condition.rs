//! Single numeric comparison against one parameter slot.

use serde::{Deserialize, Serialize};

use crate::error::{Result, RuleError};
use crate::schema::{ConditionSpec, Threshold};

use super::{Operator, ParameterValues};

/// `values[parameter_index] <operator> threshold`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub parameter_index: u32,
    pub operator: Operator,
    pub threshold: Threshold,
}

impl Condition {
    /// Build a condition, rejecting operator/threshold shape mismatches.
    pub fn new(parameter_index: u32, operator: Operator, threshold: impl Into<Threshold>) -> Result<Self> {
        let threshold = threshold.into();
        if !operator.accepts(&threshold) {
            return Err(RuleError::Validation(format!(
                "operator '{}' cannot compare against a {} threshold",
                operator,
                threshold.type_name()
            )));
        }
        Ok(Self {
            parameter_index,
            operator,
            threshold,
        })
    }

    /// Convert a schema entry. Callers are expected to have validated it;
    /// a bad token or shape still surfaces as an error here.
    pub fn from_spec(spec: &ConditionSpec) -> Result<Self> {
        let operator: Operator = spec.operator.parse().map_err(RuleError::Validation)?;
        Self::new(spec.parameter_index, operator, spec.threshold.clone())
    }

    pub fn to_spec(&self) -> ConditionSpec {
        ConditionSpec {
            parameter_index: self.parameter_index,
            operator: self.operator.token().to_string(),
            threshold: self.threshold.clone(),
        }
    }

    /// Evaluate against a parameter mapping. Never fails: a missing
    /// parameter is `false`.
    pub fn evaluate(&self, values: &ParameterValues) -> bool {
        match values.get(&self.parameter_index) {
            Some(&value) => self.operator.apply(value, &self.threshold),
            None => false,
        }
    }
}
