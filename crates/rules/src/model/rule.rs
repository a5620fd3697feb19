//! A named, cooldown-gated conjunction of conditions mapped to actions.

use chrono::{DateTime, Duration, Utc};
use tracing::trace;

use crate::error::Result;
use crate::schema::{Action, RuleSpec};

use super::cooldown::{seconds_to_duration, CooldownState};
use super::{Condition, Snapshot};

/// A single automation rule.
///
/// The rule fires when it is enabled, off cooldown, and every condition
/// holds (an empty condition list always holds). Evaluating never records a
/// fire; the engine calls [`mark_triggered`](Rule::mark_triggered) for rules
/// whose actions it actually attempts.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub id: String,
    pub name: String,
    pub conditions: Vec<Condition>,
    pub actions: Vec<Action>,
    pub enabled: bool,
    pub cooldown_seconds: f64,
    last_triggered_at: Option<DateTime<Utc>>,
}

impl Rule {
    /// An enabled rule with no conditions, actions, or cooldown.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            conditions: Vec::new(),
            actions: Vec::new(),
            enabled: true,
            cooldown_seconds: 0.0,
            last_triggered_at: None,
        }
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn with_action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    pub fn with_cooldown(mut self, seconds: f64) -> Self {
        self.cooldown_seconds = seconds;
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Build a rule from a validated schema entry.
    pub fn from_spec(spec: &RuleSpec) -> Result<Self> {
        let conditions = spec
            .conditions
            .iter()
            .map(Condition::from_spec)
            .collect::<Result<Vec<_>>>()?;

        let name = if spec.name.trim().is_empty() {
            spec.id.clone()
        } else {
            spec.name.clone()
        };

        Ok(Self {
            id: spec.id.clone(),
            name,
            conditions,
            actions: spec.actions.clone(),
            enabled: spec.enabled,
            cooldown_seconds: spec.cooldown_seconds,
            last_triggered_at: None,
        })
    }

    pub fn to_spec(&self) -> RuleSpec {
        RuleSpec {
            id: self.id.clone(),
            name: self.name.clone(),
            enabled: self.enabled,
            cooldown_seconds: self.cooldown_seconds,
            conditions: self.conditions.iter().map(Condition::to_spec).collect(),
            actions: self.actions.clone(),
        }
    }

    pub fn cooldown(&self) -> Duration {
        seconds_to_duration(self.cooldown_seconds)
    }

    pub fn last_triggered_at(&self) -> Option<DateTime<Utc>> {
        self.last_triggered_at
    }

    pub fn cooldown_state(&self, now: DateTime<Utc>) -> CooldownState {
        CooldownState::at(self.last_triggered_at, self.cooldown(), now)
    }

    /// Evaluate against a snapshot using the current wall clock.
    pub fn evaluate(&self, snapshot: &Snapshot) -> bool {
        self.evaluate_at(snapshot, Utc::now())
    }

    /// Evaluate against a snapshot as of `now`.
    ///
    /// The enabled flag and cooldown are checked before any condition, so a
    /// cooling rule never looks at the snapshot.
    pub fn evaluate_at(&self, snapshot: &Snapshot, now: DateTime<Utc>) -> bool {
        if !self.enabled {
            return false;
        }

        if let CooldownState::Cooling { until } = self.cooldown_state(now) {
            trace!(rule_id = %self.id, until = %until, "rule cooling down");
            return false;
        }

        self.conditions
            .iter()
            .all(|condition| condition.evaluate(&snapshot.values))
    }

    /// Record a fire at the current wall clock.
    pub fn mark_triggered(&mut self) {
        self.mark_triggered_at(Utc::now());
    }

    /// Record a fire at a specific instant.
    ///
    /// Useful for testing and deterministic replay.
    pub fn mark_triggered_at(&mut self, at: DateTime<Utc>) {
        self.last_triggered_at = Some(at);
    }
}
