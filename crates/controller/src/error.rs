//! Controller error type and process exit codes.

use std::path::PathBuf;

use liverule_rules::error::RuleError;

use crate::config::{MAX_RATE_HZ, MIN_RATE_HZ};
use crate::source::SamplerError;

/// Exit code for a normal run.
pub const EXIT_OK: u8 = 0;
/// Exit code when the rules path does not exist.
pub const EXIT_MISSING_RULES: u8 = 1;
/// Exit code when `--rate` is outside the supported range.
pub const EXIT_RATE_OUT_OF_RANGE: u8 = 2;
/// Exit code when the controller or device could not be set up.
pub const EXIT_INIT_FAILED: u8 = 3;
/// Exit code when a rule file fails to load.
pub const EXIT_RULES_INVALID: u8 = 4;
/// Exit code when the parameter source fails mid-run.
pub const EXIT_ENGINE_FAILED: u8 = 5;
/// Exit code for anything unexpected (panics, runtime errors).
pub const EXIT_UNEXPECTED: u8 = 6;

/// Fatal controller errors. Each maps to one process exit code.
#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    #[error("rules path not found: {}", .0.display())]
    MissingRules(PathBuf),

    #[error("rate {0} Hz is out of range ({min}..={max} Hz)", min = MIN_RATE_HZ, max = MAX_RATE_HZ)]
    RateOutOfRange(f64),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("controller init failed: {0}")]
    Init(String),

    #[error("failed to load rules: {0}")]
    RuleLoad(#[from] RuleError),

    #[error("rejected rule file(s) under {}: {detail}", path.display())]
    RulesRejected { path: PathBuf, detail: String },

    #[error("parameter source failed: {0}")]
    Sampler(#[from] SamplerError),
}

impl ControllerError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            ControllerError::MissingRules(_) => EXIT_MISSING_RULES,
            ControllerError::RateOutOfRange(_) => EXIT_RATE_OUT_OF_RANGE,
            ControllerError::InvalidConfig(_) | ControllerError::Init(_) => EXIT_INIT_FAILED,
            ControllerError::RuleLoad(_) | ControllerError::RulesRejected { .. } => {
                EXIT_RULES_INVALID
            }
            ControllerError::Sampler(_) => EXIT_ENGINE_FAILED,
        }
    }
}
