//! Rule set validation with path-addressed errors and suggestions.
//!
//! Validation runs on the parsed schema before any runtime type is built,
//! so a document is either accepted whole or rejected with every problem
//! listed. Returns a [`ValidationResult`] with errors (reject the document)
//! and warnings (advisory).

mod document_checks;
mod fuzzy;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::schema::RuleSetDocument;

// ── Issues ──────────────────────────────────────────────────────────

/// Errors reject the document; warnings are logged and let it load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// One problem found in a rule set document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub severity: Severity,
    /// Location inside the document, e.g. `"rules[1].conditions[0].operator"`.
    /// Empty when the document could not be parsed at all.
    pub path: String,
    pub message: String,
    /// "Did you mean ...?" hint for misspelled tokens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = if self.path.is_empty() { "document" } else { &self.path };
        write!(f, "{path}: {}", self.message)?;
        if let Some(hint) = &self.suggestion {
            write!(f, " ({hint})")?;
        }
        Ok(())
    }
}

/// Every issue found in one document, in the order the checks ran.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationResult {
    pub issues: Vec<Issue>,
}

impl ValidationResult {
    /// True when no issue is an error.
    pub fn is_valid(&self) -> bool {
        self.errors().next().is_none()
    }

    pub fn errors(&self) -> impl Iterator<Item = &Issue> {
        self.with_severity(Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Issue> {
        self.with_severity(Severity::Warning)
    }

    fn with_severity(&self, severity: Severity) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(move |i| i.severity == severity)
    }

    pub(crate) fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.error_with_suggestion(path, message, None);
    }

    pub(crate) fn error_with_suggestion(
        &mut self,
        path: impl Into<String>,
        message: impl Into<String>,
        suggestion: Option<String>,
    ) {
        self.issues.push(Issue {
            severity: Severity::Error,
            path: path.into(),
            message: message.into(),
            suggestion,
        });
    }

    pub(crate) fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.issues.push(Issue {
            severity: Severity::Warning,
            path: path.into(),
            message: message.into(),
            suggestion: None,
        });
    }

    /// Every error on one line, for logs and error messages.
    pub fn summary(&self) -> String {
        self.errors()
            .map(Issue::to_string)
            .collect::<Vec<_>>()
            .join("; ")
    }
}

// ── Public API ──────────────────────────────────────────────────────

/// Validate a parsed rule set document.
pub fn validate_document(doc: &RuleSetDocument) -> ValidationResult {
    let mut result = ValidationResult::default();
    document_checks::validate_header(doc, &mut result);
    document_checks::validate_rules(doc, &mut result);
    result
}

/// Parse raw YAML and validate. Parse errors are reported as a root-level error.
pub fn validate_yaml(yaml: &str) -> ValidationResult {
    match serde_yaml::from_str::<RuleSetDocument>(yaml) {
        Ok(doc) => validate_document(&doc),
        Err(e) => {
            let mut result = ValidationResult::default();
            result.error("", format!("YAML parse error: {e}"));
            result
        }
    }
}
