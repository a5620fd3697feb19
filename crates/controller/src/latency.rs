//! Rolling per-cycle latency series.

use std::collections::VecDeque;

/// Samples kept for the trailing-window statistics.
pub const DEFAULT_WINDOW: usize = 100;

// ── Window ──────────────────────────────────────────────────────────

/// The most recent latencies, oldest evicted first, with their running sum.
#[derive(Debug, Clone)]
pub struct LatencyWindow {
    samples: VecDeque<f64>,
    capacity: usize,
    sum: f64,
}

impl LatencyWindow {
    /// A zero capacity is bumped to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
            sum: 0.0,
        }
    }

    pub fn push(&mut self, ms: f64) {
        if self.samples.len() == self.capacity {
            if let Some(evicted) = self.samples.pop_front() {
                self.sum -= evicted;
            }
        }
        self.samples.push_back(ms);
        self.sum += ms;
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn mean(&self) -> Option<f64> {
        (!self.is_empty()).then(|| self.sum / self.samples.len() as f64)
    }

    pub fn max(&self) -> Option<f64> {
        self.samples.iter().copied().reduce(f64::max)
    }
}

// ── Latency tracker ─────────────────────────────────────────────────

/// Cycle latencies in milliseconds: a trailing window plus all-time
/// aggregates.
#[derive(Debug, Clone)]
pub struct LatencyTracker {
    window: LatencyWindow,
    count: u64,
    sum: f64,
    min: f64,
    max: f64,
}

impl Default for LatencyTracker {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}

impl LatencyTracker {
    pub fn new(window: usize) -> Self {
        Self {
            window: LatencyWindow::new(window),
            count: 0,
            sum: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }

    pub fn record(&mut self, ms: f64) {
        self.window.push(ms);
        self.count += 1;
        self.sum += ms;
        self.min = self.min.min(ms);
        self.max = self.max.max(ms);
    }

    /// Samples recorded since creation.
    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn avg(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }

    pub fn min(&self) -> Option<f64> {
        (self.count > 0).then_some(self.min)
    }

    pub fn max(&self) -> Option<f64> {
        (self.count > 0).then_some(self.max)
    }

    pub fn window_avg(&self) -> Option<f64> {
        self.window.mean()
    }

    pub fn window_max(&self) -> Option<f64> {
        self.window.max()
    }
}
