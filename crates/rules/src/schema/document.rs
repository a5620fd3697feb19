//! Rule set document root and per-rule entries.

use serde::{Deserialize, Serialize};

use super::{Action, ConditionSpec};

/// A rule set as written in a YAML document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RuleSetDocument {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub rules: Vec<RuleSpec>,
}

/// A single rule entry inside a [`RuleSetDocument`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RuleSpec {
    pub id: String,
    /// Display name; falls back to `id` when omitted.
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Minimum seconds between two firings of this rule. `0` disables the gate.
    #[serde(default)]
    pub cooldown_seconds: f64,
    #[serde(default)]
    pub conditions: Vec<ConditionSpec>,
    #[serde(default)]
    pub actions: Vec<Action>,
}

pub(crate) fn default_true() -> bool {
    true
}
