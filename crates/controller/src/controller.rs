//! The poll → evaluate → dispatch → sleep loop.

use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use liverule_rules::engine::{ActionSink, RuleEngine};
use liverule_rules::loader::{LoadStatus, RuleSetChange, RuleSetLoader};
use liverule_rules::model::Snapshot;
use tracing::{debug, error, info, warn};

use crate::config::ControllerConfig;
use crate::error::{ControllerError, EXIT_OK};
use crate::gate::FireGate;
use crate::latency::LatencyTracker;
use crate::shutdown::ShutdownSignal;
use crate::source::ParameterSource;
use crate::summary::{PeriodicStats, RunSummary};

/// Why the loop stopped.
#[derive(Debug)]
pub enum LoopExit {
    DurationElapsed,
    Cancelled,
    CycleLimit,
    Failed(ControllerError),
}

/// Outcome of [`Controller::run`]: how it ended plus the final statistics.
#[derive(Debug)]
pub struct RunReport {
    pub summary: RunSummary,
    pub exit: LoopExit,
}

impl RunReport {
    pub fn exit_code(&self) -> u8 {
        match &self.exit {
            LoopExit::Failed(e) => e.exit_code(),
            _ => EXIT_OK,
        }
    }
}

/// Drives a [`RuleEngine`] at a fixed rate.
///
/// Rules are loaded on the first cycle. Every later cycle polls the source,
/// evaluates all rule sets, and dispatches actions of triggered rules
/// (or only logs them in dry-run mode). Time from poll start to dispatch
/// completion is recorded as the cycle latency.
pub struct Controller {
    config: ControllerConfig,
    engine: RuleEngine,
    source: Arc<dyn ParameterSource>,
    gate: FireGate,
    latency: LatencyTracker,
    shutdown: ShutdownSignal,
    rules_loaded: bool,
    /// Held so the rule file watcher stays alive.
    loader: Option<RuleSetLoader>,
    changes: Option<Receiver<RuleSetChange>>,
    rules_fired: u64,
    action_failures: u64,
}

impl Controller {
    pub fn new(
        config: ControllerConfig,
        source: Arc<dyn ParameterSource>,
        sink: Arc<dyn ActionSink>,
    ) -> Self {
        Self {
            gate: FireGate::new(config.cooldown),
            engine: RuleEngine::new(sink),
            source,
            latency: LatencyTracker::default(),
            shutdown: ShutdownSignal::new(),
            rules_loaded: false,
            loader: None,
            changes: None,
            rules_fired: 0,
            action_failures: 0,
            config,
        }
    }

    /// Handle for stopping the loop from another task.
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.clone()
    }

    pub fn engine(&self) -> &RuleEngine {
        &self.engine
    }

    pub fn latency(&self) -> &LatencyTracker {
        &self.latency
    }

    /// Run until the duration elapses, the cycle limit is hit, the shutdown
    /// signal fires, or a fatal error occurs. Always returns a summary.
    pub async fn run(&mut self) -> RunReport {
        let period = self.config.period();
        let started = Instant::now();
        let mut cycles: u64 = 0;

        info!(
            rules = %self.config.rules_path.display(),
            rate_hz = self.config.rate_hz,
            dry_run = self.config.dry_run,
            "controller starting"
        );

        let exit = loop {
            if self.shutdown.is_cancelled() {
                break LoopExit::Cancelled;
            }
            if let Some(limit) = self.config.duration {
                if started.elapsed() >= limit {
                    break LoopExit::DurationElapsed;
                }
            }
            if let Some(max) = self.config.max_cycles {
                if cycles >= max {
                    break LoopExit::CycleLimit;
                }
            }

            self.apply_rule_changes();

            let cycle_start = Instant::now();
            let snapshot = match self.source.poll().await {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    error!(error = %e, cycle = cycles + 1, "parameter poll failed, stopping");
                    break LoopExit::Failed(e.into());
                }
            };
            cycles += 1;

            if !self.rules_loaded {
                if let Err(e) = self.load_rules() {
                    error!(error = %e, "rule loading failed, stopping");
                    break LoopExit::Failed(e);
                }
                self.shutdown
                    .sleep(period.saturating_sub(cycle_start.elapsed()))
                    .await;
                continue;
            }

            self.run_cycle(&snapshot).await;
            let work = cycle_start.elapsed();
            self.latency.record(work.as_secs_f64() * 1000.0);

            if cycles % self.config.stats_interval == 0 {
                self.log_periodic(cycles, started.elapsed());
            }

            self.shutdown.sleep(period.saturating_sub(work)).await;
        };

        let summary = self.summary(cycles, started.elapsed());
        match &exit {
            LoopExit::Failed(e) => error!(error = %e, cycles, "controller stopped on error"),
            other => info!(reason = ?other, cycles, "controller stopped"),
        }
        RunReport { summary, exit }
    }

    // ── Cycle ───────────────────────────────────────────────────────

    async fn run_cycle(&mut self, snapshot: &Snapshot) {
        let now = Instant::now();
        let gate = &mut self.gate;
        let triggered = self
            .engine
            .collect_triggered(snapshot, Utc::now(), |rule| gate.try_fire(&rule.name, now));
        if triggered.is_empty() {
            return;
        }
        self.rules_fired += triggered.len() as u64;

        if self.config.dry_run {
            for fired in &triggered {
                info!(
                    ruleset_id = %fired.ruleset_id,
                    rule_id = %fired.rule_id,
                    rule_name = %fired.rule_name,
                    actions = fired.actions.len(),
                    "dry run: would fire"
                );
            }
            return;
        }

        for fired in &triggered {
            info!(
                ruleset_id = %fired.ruleset_id,
                rule_id = %fired.rule_id,
                rule_name = %fired.rule_name,
                actions = fired.actions.len(),
                "rule fired"
            );
        }
        let records = self.engine.dispatch(&triggered).await;
        self.action_failures += records.iter().filter(|r| !r.success).count() as u64;
    }

    // ── Rules ───────────────────────────────────────────────────────

    /// Load every rule set under the configured path. Any rejected file
    /// fails the load and nothing is registered.
    fn load_rules(&mut self) -> Result<(), ControllerError> {
        let mut loader = RuleSetLoader::new(&self.config.rules_path);
        let results = loader.load_all()?;

        let rejected: Vec<String> = results
            .iter()
            .filter_map(|r| match &r.status {
                LoadStatus::Failed { error } => Some(format!("{}: {error}", r.path.display())),
                _ => None,
            })
            .collect();
        if !rejected.is_empty() {
            return Err(ControllerError::RulesRejected {
                path: self.config.rules_path.clone(),
                detail: rejected.join("; "),
            });
        }

        for result in results {
            if let Some(ruleset) = result.into_ruleset() {
                self.engine.add_ruleset(ruleset);
            }
        }

        let stats = self.engine.get_stats();
        if stats.total_rules == 0 {
            warn!(path = %self.config.rules_path.display(), "no rules loaded; nothing will fire");
        }
        info!(
            rulesets = stats.loaded_rulesets,
            rules = stats.total_rules,
            "rules loaded"
        );

        if self.config.watch {
            let (tx, rx) = mpsc::channel();
            loader.watch(tx)?;
            self.changes = Some(rx);
        }
        self.loader = Some(loader);
        self.rules_loaded = true;
        Ok(())
    }

    /// Apply rule set changes reported by the watcher since the last cycle.
    fn apply_rule_changes(&mut self) {
        let Some(changes) = &self.changes else {
            return;
        };
        for change in changes.try_iter() {
            match change {
                RuleSetChange::Upsert { path, ruleset } => {
                    debug!(path = %path.display(), ruleset_id = %ruleset.id, "applying reloaded rule set");
                    self.engine.reload_ruleset(ruleset);
                }
                RuleSetChange::Remove { path, ruleset_id } => {
                    debug!(path = %path.display(), ruleset_id = %ruleset_id, "removing rule set");
                    self.engine.remove_ruleset(&ruleset_id);
                }
            }
        }
    }

    // ── Statistics ──────────────────────────────────────────────────

    fn log_periodic(&self, cycles: u64, elapsed: Duration) {
        let secs = elapsed.as_secs_f64();
        let stats = PeriodicStats {
            cycles,
            observed_hz: RunSummary::rate(cycles, secs),
            rules_fired: self.rules_fired,
            rules_per_sec: RunSummary::rate(self.rules_fired, secs),
            window_avg_ms: self.latency.window_avg(),
            window_max_ms: self.latency.window_max(),
        };
        info!(
            cycles = stats.cycles,
            observed_hz = format_args!("{:.2}", stats.observed_hz),
            rules_fired = stats.rules_fired,
            rules_per_sec = format_args!("{:.2}", stats.rules_per_sec),
            window_avg_ms = ?stats.window_avg_ms,
            window_max_ms = ?stats.window_max_ms,
            "controller stats"
        );
    }

    fn summary(&self, cycles: u64, elapsed: Duration) -> RunSummary {
        let secs = elapsed.as_secs_f64();
        let avg = self.latency.avg();
        RunSummary {
            cycles,
            elapsed_secs: secs,
            target_hz: self.config.rate_hz,
            actual_hz: RunSummary::rate(cycles, secs),
            dry_run: self.config.dry_run,
            rules_fired: self.rules_fired,
            actions_dispatched: self.engine.get_stats().total_action_executions,
            action_failures: self.action_failures,
            latency_samples: self.latency.count(),
            latency_avg_ms: avg,
            latency_min_ms: self.latency.min(),
            latency_max_ms: self.latency.max(),
            latency_target_ms: self.config.latency_target_ms,
            passed: avg.map(|a| a <= self.config.latency_target_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use liverule_rules::model::{Condition, Operator, Rule, RuleSet};
    use liverule_rules::schema::Action;

    use super::*;
    use crate::device::SimulatedDevice;

    fn controller() -> Controller {
        let device = Arc::new(SimulatedDevice::connect(0, 0, 4).unwrap());
        Controller::new(ControllerConfig::new("energy.yml"), device.clone(), device)
    }

    fn energy(rule_ids: &[&str]) -> RuleSet {
        rule_ids
            .iter()
            .map(|id| {
                Rule::new(*id, *id)
                    .with_condition(Condition::new(0, Operator::Gt, 0.5).unwrap())
                    .with_action(Action::set_parameter(0, 0, 1, 0.9))
                    .with_cooldown(60.0)
            })
            .try_fold(RuleSet::new("energy", "Energy"), RuleSet::with_rule)
            .unwrap()
    }

    fn fired(controller: &mut Controller) -> Vec<String> {
        let snapshot = Snapshot::from_values([(0, 0.8)]);
        controller
            .engine
            .collect_triggered(&snapshot, Utc::now(), |_| true)
            .into_iter()
            .map(|t| t.rule_id)
            .collect()
    }

    #[test]
    fn queued_changes_are_applied_in_order() {
        let mut controller = controller();
        controller.engine.add_ruleset(energy(&["open"]));
        assert_eq!(fired(&mut controller), vec!["open"]);

        let (tx, rx) = mpsc::channel();
        controller.changes = Some(rx);
        tx.send(RuleSetChange::Upsert {
            path: "energy.yml".into(),
            ruleset: energy(&["open", "close"]),
        })
        .unwrap();
        controller.apply_rule_changes();

        assert_eq!(controller.engine().total_rules(), 2);
        // "open" is still cooling from before the reload.
        assert_eq!(fired(&mut controller), vec!["close"]);

        tx.send(RuleSetChange::Remove {
            path: "energy.yml".into(),
            ruleset_id: "energy".to_string(),
        })
        .unwrap();
        controller.apply_rule_changes();
        assert_eq!(controller.engine().get_stats().loaded_rulesets, 0);
    }

    #[test]
    fn no_watcher_means_no_changes() {
        let mut controller = controller();
        controller.engine.add_ruleset(energy(&["open"]));
        controller.apply_rule_changes();
        assert_eq!(controller.engine().get_stats().loaded_rulesets, 1);
    }
}
