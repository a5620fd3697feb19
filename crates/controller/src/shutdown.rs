//! Cooperative cancellation for the control loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;

/// Cloneable stop flag. The loop checks it once per cycle and races it
/// against the inter-cycle sleep; an in-flight dispatch always completes.
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    cancelled: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a stop. Safe to call more than once.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        // notify_one stores a permit, so a sleep that starts after this still wakes.
        self.notify.notify_one();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Sleep for `duration` unless cancelled first.
    ///
    /// Returns `false` if the sleep was cut short by cancellation.
    pub async fn sleep(&self, duration: Duration) -> bool {
        if self.is_cancelled() {
            return false;
        }
        if duration.is_zero() {
            return true;
        }
        tokio::select! {
            _ = tokio::time::sleep(duration) => true,
            _ = self.notify.notified() => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;

    #[tokio::test]
    async fn uncancelled_sleep_runs_to_completion() {
        let signal = ShutdownSignal::new();
        assert!(signal.sleep(Duration::from_millis(5)).await);
        assert!(!signal.is_cancelled());
    }

    #[tokio::test]
    async fn cancel_wakes_a_sleeping_loop() {
        let signal = ShutdownSignal::new();
        let canceller = signal.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            canceller.cancel();
        });

        let started = Instant::now();
        assert!(!signal.sleep(Duration::from_secs(30)).await);
        assert!(started.elapsed() < Duration::from_secs(5));
        assert!(signal.is_cancelled());
    }

    #[tokio::test]
    async fn cancel_before_sleep_returns_immediately() {
        let signal = ShutdownSignal::new();
        signal.cancel();
        assert!(!signal.sleep(Duration::from_secs(30)).await);
    }
}
