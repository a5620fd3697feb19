//! Filesystem rule set loader with optional hot-reload via `notify`.
//!
//! A loader root is either a single YAML file or a directory scanned
//! recursively for `*.yml` / `*.yaml`. Each file holds one rule set and is
//! parsed and validated atomically. With [`RuleSetLoader::watch`], changed
//! files are re-parsed off the caller's thread and delivered as
//! [`RuleSetChange`] messages; the receiver decides when to apply them.

mod core;
mod report;
mod watcher;

#[cfg(test)]
mod tests;

pub use self::core::{load_ruleset_file, parse_ruleset, RuleSetLoader};
pub use self::report::{LoadResult, LoadStatus};
pub use self::watcher::RuleSetChange;
pub use crate::error::{Result, RuleError};
