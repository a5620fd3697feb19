//! Controller configuration and range checks.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::ControllerError;

pub const MIN_RATE_HZ: f64 = 5.0;
pub const MAX_RATE_HZ: f64 = 30.0;
pub const DEFAULT_RATE_HZ: f64 = 10.0;
/// Cycles between two periodic statistics lines.
pub const DEFAULT_STATS_INTERVAL: u64 = 100;
pub const DEFAULT_LATENCY_TARGET_MS: f64 = 50.0;
/// Parameters exposed by the simulated device.
pub const DEFAULT_PARAM_COUNT: u32 = 8;

/// Everything the control loop needs to run.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Rule set file, or a directory scanned for rule files.
    pub rules_path: PathBuf,
    pub track: u32,
    pub device: u32,
    pub rate_hz: f64,
    /// Stop after this long; `None` runs until cancelled.
    pub duration: Option<Duration>,
    /// Evaluate and log, never dispatch.
    pub dry_run: bool,
    /// Reload rule files when they change on disk.
    pub watch: bool,
    pub stats_interval: u64,
    pub latency_target_ms: f64,
    /// Controller-level minimum time between two fires of the same rule name,
    /// applied on top of each rule's own cooldown. Zero leaves the gate open.
    pub cooldown: Duration,
    /// Stop after this many cycles.
    pub max_cycles: Option<u64>,
    pub param_count: u32,
}

impl ControllerConfig {
    /// Defaults for everything except the rules path.
    pub fn new(rules_path: impl Into<PathBuf>) -> Self {
        Self {
            rules_path: rules_path.into(),
            track: 0,
            device: 0,
            rate_hz: DEFAULT_RATE_HZ,
            duration: None,
            dry_run: false,
            watch: false,
            stats_interval: DEFAULT_STATS_INTERVAL,
            latency_target_ms: DEFAULT_LATENCY_TARGET_MS,
            cooldown: Duration::ZERO,
            max_cycles: None,
            param_count: DEFAULT_PARAM_COUNT,
        }
    }

    /// Check the configuration before anything is started.
    ///
    /// The rules path is checked first, then the rate, so each problem maps
    /// to its own exit code.
    pub fn validate(&self) -> Result<(), ControllerError> {
        self.check_rules_path()?;
        if !(MIN_RATE_HZ..=MAX_RATE_HZ).contains(&self.rate_hz) {
            return Err(ControllerError::RateOutOfRange(self.rate_hz));
        }
        if self.stats_interval == 0 {
            return Err(ControllerError::InvalidConfig(
                "stats interval must be at least 1 cycle".to_string(),
            ));
        }
        if !self.latency_target_ms.is_finite() || self.latency_target_ms <= 0.0 {
            return Err(ControllerError::InvalidConfig(format!(
                "latency target must be a positive number of milliseconds, got {}",
                self.latency_target_ms
            )));
        }
        if self.param_count == 0 {
            return Err(ControllerError::InvalidConfig(
                "device must expose at least one parameter".to_string(),
            ));
        }
        Ok(())
    }

    /// Apply the run length and cooldown given in seconds. A zero duration
    /// runs until cancelled. A missing rules path is reported before either
    /// value is looked at.
    pub fn with_seconds(mut self, duration: f64, cooldown: f64) -> Result<Self, ControllerError> {
        self.check_rules_path()?;
        let duration = seconds("duration", duration)?;
        self.duration = (!duration.is_zero()).then_some(duration);
        self.cooldown = seconds("cooldown", cooldown)?;
        Ok(self)
    }

    fn check_rules_path(&self) -> Result<(), ControllerError> {
        if self.rules_path.exists() {
            Ok(())
        } else {
            Err(ControllerError::MissingRules(self.rules_path.clone()))
        }
    }

    /// Target time between two poll starts.
    pub fn period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.rate_hz)
    }
}

/// Convert a seconds flag to a [`Duration`], rejecting negative and
/// non-finite values.
pub fn seconds(name: &str, value: f64) -> Result<Duration, ControllerError> {
    Duration::try_from_secs_f64(value).map_err(|_| {
        ControllerError::InvalidConfig(format!(
            "{name} must be a non-negative number of seconds, got {value}"
        ))
    })
}
