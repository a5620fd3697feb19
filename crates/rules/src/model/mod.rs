//! Runtime rule model: validated, evaluable counterparts of the schema types.
//!
//! - [`Operator`]: closed set of comparison operators
//! - [`Condition`]: one comparison against a parameter slot
//! - [`Rule`]: cooldown-gated conjunction of conditions mapped to actions
//! - [`RuleSet`]: ordered, independently enable-able collection of rules
//! - [`Snapshot`]: one immutable sample of parameter values

mod condition;
mod cooldown;
mod operator;
mod rule;
mod ruleset;
mod snapshot;

pub use condition::Condition;
pub use cooldown::{CooldownState, MAX_COOLDOWN_SECONDS};
pub use operator::Operator;
pub use rule::Rule;
pub use ruleset::RuleSet;
pub use snapshot::{ParameterValues, Snapshot};
