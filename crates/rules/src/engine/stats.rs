//! Engine statistics.

use serde::{Deserialize, Serialize};

/// Running counters plus registry-derived totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineStats {
    /// Calls to evaluate (one per sample).
    pub total_evaluations: u64,
    /// Rules that triggered across all evaluations.
    pub total_triggers: u64,
    /// Dispatch attempts, successful or not.
    pub total_action_executions: u64,
    /// Registered rule sets (derived, not resettable).
    pub loaded_rulesets: usize,
    /// Rules across all registered rule sets (derived, not resettable).
    pub total_rules: usize,
}

/// The resettable subset of [`EngineStats`].
#[derive(Debug, Clone, Copy, Default)]
pub(super) struct Counters {
    pub evaluations: u64,
    pub triggers: u64,
    pub action_executions: u64,
}
