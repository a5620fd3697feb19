//! [`RuleEngine`]: rule set registry, evaluation pass, and dispatch.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::loader::load_ruleset_file;
use crate::model::{Rule, RuleSet, Snapshot};
use crate::schema::Action;

use super::sink::ActionSink;
use super::stats::{Counters, EngineStats};

/// A rule that passed evaluation and was marked triggered.
#[derive(Debug, Clone, PartialEq)]
pub struct TriggeredRule {
    pub ruleset_id: String,
    pub rule_id: String,
    pub rule_name: String,
    pub actions: Vec<Action>,
}

/// Outcome of dispatching one action.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionRecord {
    pub ruleset_id: String,
    pub rule_id: String,
    pub action_type: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Owns the rule set registry and runs one evaluation pass per sample.
///
/// Rule sets are evaluated in registration order and rules in declaration
/// order, so trigger order within a pass is deterministic.
pub struct RuleEngine {
    rulesets: IndexMap<String, RuleSet>,
    counters: Counters,
    sink: Arc<dyn ActionSink>,
}

impl RuleEngine {
    /// Create an empty engine dispatching to `sink`.
    pub fn new(sink: Arc<dyn ActionSink>) -> Self {
        Self {
            rulesets: IndexMap::new(),
            counters: Counters::default(),
            sink,
        }
    }

    // ── Registry ────────────────────────────────────────────────────

    /// Register a rule set. An existing set with the same id is replaced
    /// in place, keeping its evaluation position.
    pub fn add_ruleset(&mut self, ruleset: RuleSet) {
        let id = ruleset.id.clone();
        if self.rulesets.insert(id.clone(), ruleset).is_some() {
            info!(ruleset_id = %id, "replaced rule set");
        } else {
            info!(ruleset_id = %id, "registered rule set");
        }
    }

    /// Register a new version of a rule set. Rules whose id survives keep
    /// their last fire time, so cooldowns run on across the reload.
    pub fn reload_ruleset(&mut self, mut ruleset: RuleSet) {
        if let Some(previous) = self.rulesets.get(&ruleset.id) {
            let carried = ruleset.inherit_fire_times(previous);
            debug!(ruleset_id = %ruleset.id, carried, "carried rule fire times");
        }
        self.add_ruleset(ruleset);
    }

    /// Unregister a rule set, preserving the order of the rest.
    pub fn remove_ruleset(&mut self, id: &str) -> Option<RuleSet> {
        let removed = self.rulesets.shift_remove(id);
        if removed.is_some() {
            info!(ruleset_id = %id, "removed rule set");
        }
        removed
    }

    /// Parse a YAML rule set file and register it.
    ///
    /// On any parse or validation error nothing is registered.
    pub fn load_ruleset_from_yaml(&mut self, path: impl AsRef<Path>) -> Result<&RuleSet> {
        let ruleset = load_ruleset_file(path.as_ref())?;
        let id = ruleset.id.clone();
        let (index, previous) = self.rulesets.insert_full(id.clone(), ruleset);
        info!(
            ruleset_id = %id,
            path = %path.as_ref().display(),
            replaced = previous.is_some(),
            "loaded rule set from YAML"
        );
        Ok(&self.rulesets[index])
    }

    pub fn get_ruleset(&self, id: &str) -> Option<&RuleSet> {
        self.rulesets.get(id)
    }

    pub fn get_ruleset_mut(&mut self, id: &str) -> Option<&mut RuleSet> {
        self.rulesets.get_mut(id)
    }

    /// Registered rule sets in evaluation order.
    pub fn rulesets(&self) -> impl Iterator<Item = &RuleSet> {
        self.rulesets.values()
    }

    pub fn total_rules(&self) -> usize {
        self.rulesets.values().map(RuleSet::len).sum()
    }

    // ── Evaluation ──────────────────────────────────────────────────

    /// Evaluate every enabled rule set against `snapshot`, mark triggered
    /// rules, and dispatch their actions in order.
    ///
    /// Returns one record per dispatched action.
    pub async fn evaluate(&mut self, snapshot: &Snapshot) -> Vec<ExecutionRecord> {
        let triggered = self.collect_triggered(snapshot, Utc::now(), |_| true);
        self.dispatch(&triggered).await
    }

    /// First half of [`evaluate`](Self::evaluate): find triggered rules as of
    /// `now` and mark them, without dispatching anything.
    ///
    /// `gate` is consulted for each rule that passed its own checks; returning
    /// `false` suppresses that fire (the rule is not marked). Counts one
    /// evaluation and every rule that got through the gate.
    pub fn collect_triggered<F>(
        &mut self,
        snapshot: &Snapshot,
        now: DateTime<Utc>,
        mut gate: F,
    ) -> Vec<TriggeredRule>
    where
        F: FnMut(&Rule) -> bool,
    {
        self.counters.evaluations += 1;
        let mut triggered = Vec::new();

        for ruleset in self.rulesets.values_mut() {
            let ruleset_id = ruleset.id.clone();
            let hits: Vec<String> = ruleset
                .evaluate_all_at(snapshot, now)
                .into_iter()
                .map(|rule| rule.id.clone())
                .collect();

            for rule_id in hits {
                let Some(rule) = ruleset.get_rule_mut(&rule_id) else {
                    continue;
                };
                if !gate(rule) {
                    debug!(ruleset_id = %ruleset_id, rule_id = %rule.id, "fire suppressed by gate");
                    continue;
                }

                rule.mark_triggered_at(now);
                debug!(ruleset_id = %ruleset_id, rule_id = %rule.id, "rule triggered");
                triggered.push(TriggeredRule {
                    ruleset_id: ruleset_id.clone(),
                    rule_id: rule.id.clone(),
                    rule_name: rule.name.clone(),
                    actions: rule.actions.clone(),
                });
            }
        }

        self.counters.triggers += triggered.len() as u64;
        triggered
    }

    /// Second half of [`evaluate`](Self::evaluate): dispatch every action of
    /// `triggered` in order. Failures are recorded and do not stop the pass.
    pub async fn dispatch(&mut self, triggered: &[TriggeredRule]) -> Vec<ExecutionRecord> {
        let mut records = Vec::new();

        for fired in triggered {
            for action in &fired.actions {
                self.counters.action_executions += 1;
                let outcome = self.sink.dispatch(action).await;
                if let Err(e) = &outcome {
                    warn!(
                        ruleset_id = %fired.ruleset_id,
                        rule_id = %fired.rule_id,
                        action_type = %action.action_type,
                        error = %e,
                        "action dispatch failed"
                    );
                }
                records.push(ExecutionRecord {
                    ruleset_id: fired.ruleset_id.clone(),
                    rule_id: fired.rule_id.clone(),
                    action_type: action.action_type.clone(),
                    success: outcome.is_ok(),
                    error: outcome.err().map(|e| e.to_string()),
                });
            }
        }

        records
    }

    // ── Statistics ──────────────────────────────────────────────────

    pub fn get_stats(&self) -> EngineStats {
        EngineStats {
            total_evaluations: self.counters.evaluations,
            total_triggers: self.counters.triggers,
            total_action_executions: self.counters.action_executions,
            loaded_rulesets: self.rulesets.len(),
            total_rules: self.total_rules(),
        }
    }

    /// Zero the running counters. Registry-derived totals are unaffected.
    pub fn reset_stats(&mut self) {
        self.counters = Counters::default();
    }
}
