//! Per-file load outcomes.

use std::path::PathBuf;

use crate::model::RuleSet;

/// Outcome of loading a single rule file.
#[derive(Debug)]
pub struct LoadResult {
    /// Path to the file that was loaded.
    pub path: PathBuf,
    /// Status of the load attempt.
    pub status: LoadStatus,
}

/// Status of a single file load attempt.
#[derive(Debug)]
pub enum LoadStatus {
    /// The file parsed and validated into a rule set.
    Loaded { ruleset: RuleSet },
    /// File was skipped (dotfile, non-YAML, etc.).
    Skipped { reason: String },
    /// Parse or validation error occurred.
    Failed { error: String },
}

impl LoadResult {
    pub fn ruleset(&self) -> Option<&RuleSet> {
        match &self.status {
            LoadStatus::Loaded { ruleset } => Some(ruleset),
            _ => None,
        }
    }

    pub fn into_ruleset(self) -> Option<RuleSet> {
        match self.status {
            LoadStatus::Loaded { ruleset } => Some(ruleset),
            _ => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.status, LoadStatus::Failed { .. })
    }
}
