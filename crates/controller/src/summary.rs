//! Periodic and end-of-run statistics.

use std::fmt;

use serde::Serialize;

/// Aggregate line emitted every `stats_interval` cycles.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodicStats {
    pub cycles: u64,
    pub observed_hz: f64,
    pub rules_fired: u64,
    pub rules_per_sec: f64,
    pub window_avg_ms: Option<f64>,
    pub window_max_ms: Option<f64>,
}

/// Final report, produced on every exit path of the loop.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub cycles: u64,
    pub elapsed_secs: f64,
    pub target_hz: f64,
    pub actual_hz: f64,
    pub dry_run: bool,
    pub rules_fired: u64,
    pub actions_dispatched: u64,
    pub action_failures: u64,
    pub latency_samples: u64,
    pub latency_avg_ms: Option<f64>,
    pub latency_min_ms: Option<f64>,
    pub latency_max_ms: Option<f64>,
    pub latency_target_ms: f64,
    /// Average latency within target. `None` when nothing was measured.
    pub passed: Option<bool>,
}

impl RunSummary {
    /// Rate over `elapsed_secs`, zero for an instantaneous run.
    pub fn rate(count: u64, elapsed_secs: f64) -> f64 {
        if elapsed_secs > 0.0 {
            count as f64 / elapsed_secs
        } else {
            0.0
        }
    }
}

fn ms(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.2} ms"))
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = if self.dry_run { " (dry run)" } else { "" };
        let verdict = match self.passed {
            Some(true) => "PASS",
            Some(false) => "FAIL",
            None => "NO DATA",
        };

        writeln!(f, "── Run summary{mode} ──")?;
        writeln!(f, "cycles:        {}", self.cycles)?;
        writeln!(f, "elapsed:       {:.2} s", self.elapsed_secs)?;
        writeln!(f, "rate:          {:.2} Hz (target {:.2} Hz)", self.actual_hz, self.target_hz)?;
        writeln!(f, "rules fired:   {}", self.rules_fired)?;
        writeln!(
            f,
            "actions:       {} dispatched, {} failed",
            self.actions_dispatched, self.action_failures
        )?;
        writeln!(
            f,
            "latency:       avg {} / min {} / max {}",
            ms(self.latency_avg_ms),
            ms(self.latency_min_ms),
            ms(self.latency_max_ms)
        )?;
        write!(f, "latency check: {verdict} (target {:.2} ms)", self.latency_target_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary() -> RunSummary {
        RunSummary {
            cycles: 50,
            elapsed_secs: 5.0,
            target_hz: 10.0,
            actual_hz: 10.0,
            dry_run: true,
            rules_fired: 3,
            actions_dispatched: 0,
            action_failures: 0,
            latency_samples: 49,
            latency_avg_ms: Some(1.25),
            latency_min_ms: Some(0.5),
            latency_max_ms: Some(4.0),
            latency_target_ms: 50.0,
            passed: Some(true),
        }
    }

    #[test]
    fn rate_handles_zero_elapsed() {
        assert_eq!(RunSummary::rate(10, 0.0), 0.0);
        assert_eq!(RunSummary::rate(10, 2.0), 5.0);
    }

    #[test]
    fn display_reports_verdict_and_mode() {
        let text = summary().to_string();
        assert!(text.contains("(dry run)"));
        assert!(text.contains("cycles:        50"));
        assert!(text.contains("avg 1.25 ms / min 0.50 ms / max 4.00 ms"));
        assert!(text.ends_with("latency check: PASS (target 50.00 ms)"));
    }

    #[test]
    fn display_without_samples() {
        let mut s = summary();
        s.latency_avg_ms = None;
        s.latency_min_ms = None;
        s.latency_max_ms = None;
        s.passed = None;
        let text = s.to_string();
        assert!(text.contains("avg n/a"));
        assert!(text.contains("NO DATA"));
    }

    #[test]
    fn serializes_to_json() {
        let value = serde_json::to_value(summary()).unwrap();
        assert_eq!(value["cycles"], 50);
        assert_eq!(value["passed"], true);
    }
}
