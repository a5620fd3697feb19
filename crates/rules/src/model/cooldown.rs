//! Cooldown state derived from a rule's last fire time.

use chrono::{DateTime, Duration, Utc};

/// Longest cooldown a rule file may declare: one day.
pub const MAX_COOLDOWN_SECONDS: f64 = 86_400.0;

/// Whether a rule may fire at a given instant.
///
/// `Rule::mark_triggered` is the only producer of `Cooling`; the state
/// returns to `Idle` once `now >= until`. A cooldown reaching past the
/// last representable instant saturates there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CooldownState {
    Idle,
    Cooling { until: DateTime<Utc> },
}

impl CooldownState {
    /// Compute the state at `now` for a rule last fired at `last_fired`.
    pub fn at(last_fired: Option<DateTime<Utc>>, cooldown: Duration, now: DateTime<Utc>) -> Self {
        match last_fired {
            Some(fired) if cooldown > Duration::zero() => {
                let until = fired
                    .checked_add_signed(cooldown)
                    .unwrap_or(DateTime::<Utc>::MAX_UTC);
                if now < until {
                    CooldownState::Cooling { until }
                } else {
                    CooldownState::Idle
                }
            }
            _ => CooldownState::Idle,
        }
    }

    pub fn is_cooling(&self) -> bool {
        matches!(self, CooldownState::Cooling { .. })
    }

    /// Time left before the rule re-arms, if cooling.
    pub fn remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        match self {
            CooldownState::Idle => None,
            CooldownState::Cooling { until } => Some(*until - now),
        }
    }
}

/// Convert fractional seconds to a chrono duration with microsecond precision.
pub(crate) fn seconds_to_duration(seconds: f64) -> Duration {
    if !seconds.is_finite() || seconds <= 0.0 {
        return Duration::zero();
    }
    Duration::microseconds((seconds * 1_000_000.0).round() as i64)
}
