//! Controller-level fire gate keyed by rule name.

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Minimum spacing between two fires of the same rule name.
///
/// Independent of each rule's own `cooldown_seconds`; a rule has to pass
/// both. A zero cooldown leaves the gate open.
#[derive(Debug, Clone)]
pub struct FireGate {
    cooldown: Duration,
    last_fired: HashMap<String, Instant>,
}

impl FireGate {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_fired: HashMap::new(),
        }
    }

    /// Whether `rule_name` may fire at `now`. Records the fire when allowed.
    pub fn try_fire(&mut self, rule_name: &str, now: Instant) -> bool {
        if let Some(last) = self.last_fired.get(rule_name) {
            if now.saturating_duration_since(*last) < self.cooldown {
                return false;
            }
        }
        self.last_fired.insert(rule_name.to_string(), now);
        true
    }

    /// When `rule_name` last got through the gate.
    pub fn last_fired(&self, rule_name: &str) -> Option<Instant> {
        self.last_fired.get(rule_name).copied()
    }
}
