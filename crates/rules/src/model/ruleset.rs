//! Ordered, independently enable-able collection of rules.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::{Result, RuleError};
use crate::schema::RuleSetDocument;
use crate::validation::validate_document;

use super::{Rule, Snapshot};

/// A named group of rules evaluated together in declaration order.
///
/// Rule ids are unique within a set; [`add_rule`](RuleSet::add_rule) enforces
/// it for programmatic construction and validation enforces it for documents.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleSet {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub enabled: bool,
    rules: Vec<Rule>,
}

impl RuleSet {
    /// An enabled, empty rule set.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            enabled: true,
            rules: Vec::new(),
        }
    }

    /// Builder form of [`add_rule`](RuleSet::add_rule).
    pub fn with_rule(mut self, rule: Rule) -> Result<Self> {
        self.add_rule(rule)?;
        Ok(self)
    }

    /// Append a rule, rejecting a duplicate id.
    pub fn add_rule(&mut self, rule: Rule) -> Result<()> {
        if self.get_rule(&rule.id).is_some() {
            return Err(RuleError::Validation(format!(
                "duplicate rule id '{}' in rule set '{}'",
                rule.id, self.id
            )));
        }
        self.rules.push(rule);
        Ok(())
    }

    /// Remove a rule by id, keeping the order of the others.
    pub fn remove_rule(&mut self, id: &str) -> Option<Rule> {
        let pos = self.rules.iter().position(|r| r.id == id)?;
        Some(self.rules.remove(pos))
    }

    /// Validate a parsed document and build the rule set from it.
    ///
    /// Any validation error rejects the whole document.
    pub fn from_document(doc: &RuleSetDocument) -> Result<Self> {
        let report = validate_document(doc);
        if !report.is_valid() {
            return Err(RuleError::Invalid(report));
        }
        for warning in report.warnings() {
            debug!(ruleset_id = %doc.id, path = %warning.path, "{}", warning.message);
        }

        let rules = doc
            .rules
            .iter()
            .map(Rule::from_spec)
            .collect::<Result<Vec<_>>>()?;

        let name = if doc.name.trim().is_empty() {
            doc.id.clone()
        } else {
            doc.name.clone()
        };

        Ok(Self {
            id: doc.id.clone(),
            name,
            description: doc.description.clone(),
            enabled: doc.enabled,
            rules,
        })
    }

    pub fn to_document(&self) -> RuleSetDocument {
        RuleSetDocument {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            enabled: self.enabled,
            rules: self.rules.iter().map(Rule::to_spec).collect(),
        }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn get_rule(&self, id: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.id == id)
    }

    /// Mutable access to a rule. Changing its `id` to one already in use
    /// breaks lookup for the shadowed rule.
    pub fn get_rule_mut(&mut self, id: &str) -> Option<&mut Rule> {
        self.rules.iter_mut().find(|r| r.id == id)
    }

    /// Enable a rule. Returns `false` if no rule has this id.
    pub fn enable_rule(&mut self, id: &str) -> bool {
        self.set_rule_enabled(id, true)
    }

    /// Disable a rule. Returns `false` if no rule has this id.
    pub fn disable_rule(&mut self, id: &str) -> bool {
        self.set_rule_enabled(id, false)
    }

    fn set_rule_enabled(&mut self, id: &str, enabled: bool) -> bool {
        match self.get_rule_mut(id) {
            Some(rule) => {
                rule.enabled = enabled;
                true
            }
            None => false,
        }
    }

    /// Copy last fire times from `previous` onto rules with the same id, so a
    /// reloaded set keeps cooling rules cooling. Returns how many carried.
    pub fn inherit_fire_times(&mut self, previous: &RuleSet) -> usize {
        let mut carried = 0;
        for rule in &mut self.rules {
            if let Some(at) = previous.get_rule(&rule.id).and_then(Rule::last_triggered_at) {
                rule.mark_triggered_at(at);
                carried += 1;
            }
        }
        carried
    }

    /// Rules that fire for `snapshot` right now, in declaration order.
    pub fn evaluate_all(&self, snapshot: &Snapshot) -> Vec<&Rule> {
        self.evaluate_all_at(snapshot, Utc::now())
    }

    /// Rules that fire for `snapshot` as of `now`, in declaration order.
    ///
    /// A disabled set returns nothing without consulting any rule.
    pub fn evaluate_all_at(&self, snapshot: &Snapshot, now: DateTime<Utc>) -> Vec<&Rule> {
        if !self.enabled {
            return Vec::new();
        }
        self.rules
            .iter()
            .filter(|rule| rule.evaluate_at(snapshot, now))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Condition, Operator};
    use crate::schema::Action;

    fn above(id: &str, threshold: f64) -> Rule {
        Rule::new(id, id.to_uppercase())
            .with_condition(Condition::new(0, Operator::Gt, threshold).unwrap())
            .with_action(Action::fire_clip(0, 0))
    }

    fn set() -> RuleSet {
        RuleSet::new("set", "Set")
            .with_rule(above("high", 0.8))
            .unwrap()
            .with_rule(above("mid", 0.5))
            .unwrap()
            .with_rule(above("low", 0.2))
            .unwrap()
    }

    fn ids<'a>(rules: &[&'a Rule]) -> Vec<&'a str> {
        rules.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn evaluate_all_preserves_declaration_order() {
        let set = set();
        let snap = Snapshot::from_values([(0, 0.9)]);
        assert_eq!(ids(&set.evaluate_all(&snap)), vec!["high", "mid", "low"]);

        let snap = Snapshot::from_values([(0, 0.6)]);
        assert_eq!(ids(&set.evaluate_all(&snap)), vec!["mid", "low"]);
    }

    #[test]
    fn disabled_set_returns_nothing() {
        let mut set = set();
        set.enabled = false;
        let snap = Snapshot::from_values([(0, 0.9)]);
        assert!(set.evaluate_all(&snap).is_empty());
    }

    #[test]
    fn enable_disable_target_one_rule() {
        let mut set = set();
        assert!(set.disable_rule("mid"));
        assert!(!set.get_rule("mid").unwrap().enabled);
        assert!(set.get_rule("high").unwrap().enabled);
        assert!(set.get_rule("low").unwrap().enabled);

        let snap = Snapshot::from_values([(0, 0.9)]);
        assert_eq!(ids(&set.evaluate_all(&snap)), vec!["high", "low"]);

        assert!(set.enable_rule("mid"));
        assert!(set.get_rule("mid").unwrap().enabled);
    }

    #[test]
    fn unknown_rule_id_is_reported() {
        let mut set = set();
        let before = set.clone();
        assert!(!set.enable_rule("nope"));
        assert!(!set.disable_rule("nope"));
        assert_eq!(set, before);
        assert!(set.get_rule("nope").is_none());
    }

    #[test]
    fn duplicate_rule_id_rejected() {
        let err = set().with_rule(above("mid", 0.1)).unwrap_err();
        assert!(err.to_string().contains("duplicate rule id 'mid'"));
    }

    #[test]
    fn remove_rule_keeps_order() {
        let mut set = set();
        assert_eq!(set.remove_rule("mid").unwrap().id, "mid");
        let order: Vec<_> = set.rules().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(order, vec!["high", "low"]);
        assert!(set.remove_rule("mid").is_none());
    }

    #[test]
    fn document_round_trip() {
        let set = set();
        let rebuilt = RuleSet::from_document(&set.to_document()).unwrap();
        assert_eq!(rebuilt, set);
    }

    #[test]
    fn inherit_fire_times_matches_by_rule_id() {
        let t0 = Utc::now();
        let mut old = set();
        old.get_rule_mut("high").unwrap().mark_triggered_at(t0);
        old.get_rule_mut("low").unwrap().mark_triggered_at(t0);

        let mut reloaded = RuleSet::new("set", "Set")
            .with_rule(above("high", 0.9))
            .unwrap()
            .with_rule(above("fresh", 0.1))
            .unwrap();
        assert_eq!(reloaded.inherit_fire_times(&old), 1);
        assert_eq!(reloaded.get_rule("high").unwrap().last_triggered_at(), Some(t0));
        assert_eq!(reloaded.get_rule("fresh").unwrap().last_triggered_at(), None);
    }
}
