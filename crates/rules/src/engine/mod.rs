//! Rule engine: rule set registry, per-sample evaluation, action dispatch.
//!
//! The engine owns every registered [`RuleSet`](crate::model::RuleSet) and
//! evaluates them in registration order against each [`Snapshot`](crate::model::Snapshot).
//! Actions of triggered rules go to an injected [`ActionSink`]; each attempt
//! produces an [`ExecutionRecord`] and bumps the [`EngineStats`] counters.

mod core;
mod sink;
mod stats;


pub use self::core::{ExecutionRecord, RuleEngine, TriggeredRule};
pub use self::sink::{ActionSink, DispatchError};
pub use self::stats::EngineStats;
