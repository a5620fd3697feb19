//! Point-in-time sample of monitored parameter values.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Parameter index → value.
pub type ParameterValues = HashMap<u32, f64>;

/// One immutable sample of all monitored parameters.
///
/// `values` are normalized (the engine evaluates against these);
/// `raw_values` carry the device-native reading for logging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub timestamp: DateTime<Utc>,
    pub values: ParameterValues,
    #[serde(default)]
    pub raw_values: ParameterValues,
}

impl Snapshot {
    /// An empty snapshot taken at `timestamp`.
    pub fn new(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            values: HashMap::new(),
            raw_values: HashMap::new(),
        }
    }

    /// Build a snapshot taken now whose raw values mirror the normalized ones.
    pub fn from_values(values: impl IntoIterator<Item = (u32, f64)>) -> Self {
        let values: ParameterValues = values.into_iter().collect();
        Self {
            timestamp: Utc::now(),
            raw_values: values.clone(),
            values,
        }
    }

    /// Add a parameter reading.
    pub fn with_value(mut self, index: u32, normalized: f64, raw: f64) -> Self {
        self.values.insert(index, normalized);
        self.raw_values.insert(index, raw);
        self
    }

    /// Normalized value of a parameter, if sampled.
    pub fn value(&self, index: u32) -> Option<f64> {
        self.values.get(&index).copied()
    }
}
