//! Document, rule, condition, and action checks.

use std::collections::HashMap;

use crate::model::{Operator, MAX_COOLDOWN_SECONDS};
use crate::schema::*;

use super::fuzzy::{closest, suggest_operator};
use super::ValidationResult;

// ── Header ──────────────────────────────────────────────────────────

pub(super) fn validate_header(doc: &RuleSetDocument, result: &mut ValidationResult) {
    validate_id(&doc.id, "id", result);

    if !doc.enabled {
        result.warn("enabled", "rule set is disabled; none of its rules will fire");
    }
    if doc.rules.is_empty() {
        result.warn("rules", "rule set contains no rules");
    }
}

fn validate_id(id: &str, path: &str, result: &mut ValidationResult) {
    if id.trim().is_empty() {
        result.error(path, "id must not be empty");
    } else if id.chars().any(char::is_whitespace) {
        result.error(path, format!("id must not contain whitespace, got '{id}'"));
    }
}

// ── Rules ───────────────────────────────────────────────────────────

pub(super) fn validate_rules(doc: &RuleSetDocument, result: &mut ValidationResult) {
    let mut first_seen: HashMap<&str, usize> = HashMap::new();

    for (i, rule) in doc.rules.iter().enumerate() {
        let base = format!("rules[{i}]");
        validate_id(&rule.id, &format!("{base}.id"), result);

        if let Some(first) = first_seen.get(rule.id.as_str()) {
            result.error(
                format!("{base}.id"),
                format!("duplicate rule id '{}' (first declared at rules[{first}])", rule.id),
            );
        } else {
            first_seen.insert(rule.id.as_str(), i);
        }

        if !rule.cooldown_seconds.is_finite() || rule.cooldown_seconds < 0.0 {
            result.error(
                format!("{base}.cooldown_seconds"),
                format!(
                    "cooldown_seconds must be a non-negative number, got {}",
                    rule.cooldown_seconds
                ),
            );
        } else if rule.cooldown_seconds > MAX_COOLDOWN_SECONDS {
            result.error(
                format!("{base}.cooldown_seconds"),
                format!(
                    "cooldown_seconds must be at most {MAX_COOLDOWN_SECONDS}, got {}",
                    rule.cooldown_seconds
                ),
            );
        }

        if rule.conditions.is_empty() {
            result.warn(
                format!("{base}.conditions"),
                "rule has no conditions and fires on every cycle it is off cooldown",
            );
        }
        for (j, condition) in rule.conditions.iter().enumerate() {
            validate_condition(condition, &format!("{base}.conditions[{j}]"), result);
        }

        if rule.actions.is_empty() {
            result.warn(format!("{base}.actions"), "rule has no actions");
        }
        for (k, action) in rule.actions.iter().enumerate() {
            validate_action(action, &format!("{base}.actions[{k}]"), result);
        }
    }
}

// ── Conditions ──────────────────────────────────────────────────────

fn validate_condition(condition: &ConditionSpec, path: &str, result: &mut ValidationResult) {
    let operator = match condition.operator.parse::<Operator>() {
        Ok(op) => op,
        Err(_) => {
            result.error_with_suggestion(
                format!("{path}.operator"),
                format!(
                    "unknown operator '{}', expected one of: {}",
                    condition.operator,
                    Operator::TOKENS.join(" ")
                ),
                suggest_operator(&condition.operator).map(|s| format!("Did you mean '{s}'?")),
            );
            return;
        }
    };

    let threshold_path = format!("{path}.threshold");
    if !operator.accepts(&condition.threshold) {
        let expected = if operator.is_membership() { "list" } else { "number" };
        result.error(
            &threshold_path,
            format!(
                "operator '{operator}' expects a {expected} threshold, got a {}",
                condition.threshold.type_name()
            ),
        );
        return;
    }

    match &condition.threshold {
        Threshold::Number(n) if !n.is_finite() => {
            result.error(&threshold_path, format!("threshold must be finite, got {n}"));
        }
        Threshold::Set(values) => {
            if values.iter().any(|v| !v.is_finite()) {
                result.error(&threshold_path, "threshold list must contain only finite numbers");
            }
            if values.is_empty() {
                let effect = if operator == Operator::In { "never" } else { "always" };
                result.warn(
                    &threshold_path,
                    format!("empty threshold list: '{operator}' {effect} matches"),
                );
            }
        }
        Threshold::Number(_) => {}
    }
}

// ── Actions ─────────────────────────────────────────────────────────

fn validate_action(action: &Action, path: &str, result: &mut ValidationResult) {
    if action.action_type.trim().is_empty() {
        result.error(format!("{path}.type"), "action type must not be empty");
        return;
    }

    for field in action.missing_fields() {
        result.error(
            format!("{path}.{field}"),
            format!("'{}' action requires '{field}'", action.action_type),
        );
    }

    if let Some(value) = action.target_value {
        if !value.is_finite() {
            result.error(
                format!("{path}.target_value"),
                format!("target_value must be finite, got {value}"),
            );
        }
    }

    if !KNOWN_ACTION_TYPES.contains(&action.action_type.as_str()) {
        let message = match closest(&action.action_type, KNOWN_ACTION_TYPES) {
            Some(known) => format!(
                "action type '{}' is not built in and will be passed through as-is (did you mean '{known}'?)",
                action.action_type
            ),
            None => format!(
                "action type '{}' is not built in and will be passed through as-is",
                action.action_type
            ),
        };
        result.warn(format!("{path}.type"), message);
    }
}
