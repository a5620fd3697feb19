//! Error types for rule loading and registration.

use crate::validation::ValidationResult;

/// Errors that can occur while loading, validating, or registering rule sets.
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    /// Filesystem I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parse/deserialization error (missing fields, wrong types, unknown keys).
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// The document parsed but failed schema validation.
    #[error("invalid rule set: {}", .0.summary())]
    Invalid(ValidationResult),

    /// A single validation problem outside of document loading
    /// (e.g. adding a duplicate rule programmatically).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Filesystem watcher error.
    #[error("Notify watcher error: {0}")]
    Notify(#[from] notify::Error),
}

/// Result alias for rule operations.
pub type Result<T> = std::result::Result<T, RuleError>;
