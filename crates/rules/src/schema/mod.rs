//! YAML schema types with serde deserialization.
//!
//! Defines the declarative shape of a rule set document:
//! - `RuleSetDocument`: one rule set per file (id, name, enabled, rules)
//! - `RuleSpec`: a single rule with its cooldown, conditions and actions
//! - `ConditionSpec` / `Threshold`: raw comparison entries, operator kept as a token
//! - `Action`: the action payload, shared verbatim with the runtime model
//!
//! Operator tokens stay strings here; validation turns them into
//! [`Operator`](crate::model::Operator) and reports unknown ones by path.

mod action;
mod condition;
mod document;

pub use action::*;
pub use condition::*;
pub use document::*;

#[cfg(test)]
mod tests;
