//! Declarative rule engine for real-time parameter automation.
//!
//! This crate provides:
//! - YAML rule set documents with serde deserialization
//! - Validation with per-field paths and operator suggestions
//! - Runtime model: conditions, rules with cooldowns, rule sets
//! - Filesystem loader with hot-reload via `notify` watcher
//! - The [`RuleEngine`](engine::RuleEngine) that evaluates snapshots and
//!   dispatches actions to an [`ActionSink`](engine::ActionSink)

pub mod engine;
pub mod error;
pub mod loader;
pub mod model;
pub mod schema;
pub mod validation;
