//! Enumeration scheduler
//!
//! Fires every registered enumerator once at startup, on every polling tick,
//! and whenever a refresh is requested through a [`SchedulerHandle`]. Firing
//! only transmits requests; the registry fills in afterwards as responses
//! arrive on each enumerator's own receive task.

use crate::enumerator::Enumerator;
use crate::types::{FireReason, FireSummary};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Drives periodic and on-demand enumeration.
pub struct Scheduler {
    enumerators: Vec<Arc<dyn Enumerator>>,
    interval: Duration,
    refresh: Arc<Notify>,
    cancel: CancellationToken,
}

/// Cloneable control surface for a running [`Scheduler`].
#[derive(Clone)]
pub struct SchedulerHandle {
    refresh: Arc<Notify>,
    cancel: CancellationToken,
    enumerator_count: usize,
}

impl Scheduler {
    /// Creates a scheduler over `enumerators`, polling every `interval`.
    pub fn new(enumerators: Vec<Arc<dyn Enumerator>>, interval: Duration) -> Self {
        Self {
            enumerators,
            interval,
            refresh: Arc::new(Notify::new()),
            cancel: CancellationToken::new(),
        }
    }

    /// Ties the scheduler's lifetime to `token`; cancelling it stops the loop.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Returns a control handle without starting the loop.
    pub fn handle(&self) -> SchedulerHandle {
        SchedulerHandle {
            refresh: self.refresh.clone(),
            cancel: self.cancel.clone(),
            enumerator_count: self.enumerators.len(),
        }
    }

    /// Spawns the scheduling loop onto the current runtime.
    pub fn spawn(self) -> (SchedulerHandle, JoinHandle<()>) {
        let handle = self.handle();
        let task = tokio::spawn(self.run());
        (handle, task)
    }

    /// Runs until cancelled, then shuts every enumerator down.
    pub async fn run(self) {
        info!(
            enumerators = self.enumerators.len(),
            interval_secs = self.interval.as_secs(),
            "Scheduler started"
        );

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        // The first tick completes immediately.
        let mut reason = FireReason::Startup;

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                _ = ticker.tick() => {
                    let summary = Self::fire(&self.enumerators, reason).await;
                    report(reason, summary);
                    reason = FireReason::Interval;
                }
                _ = self.refresh.notified() => {
                    let summary = Self::fire(&self.enumerators, FireReason::Refresh).await;
                    report(FireReason::Refresh, summary);
                }
            }
        }

        for enumerator in &self.enumerators {
            enumerator.shutdown();
        }

        info!("Scheduler stopped");
    }

    /// Asks every enumerator to broadcast once.
    ///
    /// A failing enumerator is logged and skipped; the next round retries it.
    pub async fn fire(enumerators: &[Arc<dyn Enumerator>], reason: FireReason) -> FireSummary {
        info!(reason = %reason, enumerators = enumerators.len(), "Enumerating devices");

        let mut summary = FireSummary::default();
        for enumerator in enumerators {
            match enumerator.query().await {
                Ok(()) => {
                    debug!(enumerator = enumerator.name(), "Query sent");
                    summary.sent += 1;
                }
                Err(e) => {
                    warn!(
                        enumerator = enumerator.name(),
                        error = %e,
                        transient = e.is_transient(),
                        "Query failed"
                    );
                    summary.failed += 1;
                }
            }
        }

        summary
    }
}

fn report(reason: FireReason, summary: FireSummary) {
    if summary.failed > 0 {
        warn!(
            reason = %reason,
            sent = summary.sent,
            failed = summary.failed,
            "Enumeration round incomplete, next round retries"
        );
    } else {
        debug!(reason = %reason, sent = summary.sent, "Enumeration round complete");
    }
}

impl SchedulerHandle {
    /// Requests an immediate enumeration round and returns without waiting.
    ///
    /// Requests made while one is already pending are merged.
    pub fn refresh(&self) {
        self.refresh.notify_one();
    }

    /// Stops the scheduling loop.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// False once the loop has been told to stop.
    pub fn is_running(&self) -> bool {
        !self.cancel.is_cancelled()
    }

    /// Number of enumerators the scheduler fires each round.
    pub fn enumerator_count(&self) -> usize {
        self.enumerator_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DiscoveryError, Result};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingEnumerator {
        queries: AtomicUsize,
        stopped: AtomicBool,
        fail: bool,
    }

    #[async_trait]
    impl Enumerator for CountingEnumerator {
        fn name(&self) -> &str {
            "counting"
        }

        async fn query(&self) -> Result<()> {
            self.queries.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(DiscoveryError::Send {
                    target: "192.168.1.255:38899".parse().unwrap(),
                    source: std::io::Error::new(std::io::ErrorKind::Other, "network down"),
                });
            }
            Ok(())
        }

        fn shutdown(&self) {
            self.stopped.store(true, Ordering::SeqCst);
        }
    }

    async fn wait_for_queries(enumerator: &CountingEnumerator, expected: usize) {
        for _ in 0..100 {
            if enumerator.queries.load(Ordering::SeqCst) >= expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    #[tokio::test]
    async fn test_fire_continues_past_failures() {
        let failing = Arc::new(CountingEnumerator {
            fail: true,
            ..Default::default()
        });
        let healthy = Arc::new(CountingEnumerator::default());
        let enumerators: Vec<Arc<dyn Enumerator>> = vec![failing.clone(), healthy.clone()];

        let summary = Scheduler::fire(&enumerators, FireReason::Refresh).await;

        assert_eq!(summary, FireSummary { sent: 1, failed: 1 });
        assert_eq!(failing.queries.load(Ordering::SeqCst), 1);
        assert_eq!(healthy.queries.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_fire_with_no_enumerators() {
        let summary = Scheduler::fire(&[], FireReason::Startup).await;
        assert_eq!(summary, FireSummary::default());
    }

    #[tokio::test(start_paused = true)]
    async fn test_startup_interval_and_refresh() {
        let enumerator = Arc::new(CountingEnumerator::default());
        let scheduler = Scheduler::new(vec![enumerator.clone()], Duration::from_secs(60));
        let (handle, task) = scheduler.spawn();
        assert_eq!(handle.enumerator_count(), 1);

        wait_for_queries(&enumerator, 1).await;
        assert_eq!(enumerator.queries.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_secs(60)).await;
        wait_for_queries(&enumerator, 2).await;
        assert_eq!(enumerator.queries.load(Ordering::SeqCst), 2);

        handle.refresh();
        wait_for_queries(&enumerator, 3).await;
        assert_eq!(enumerator.queries.load(Ordering::SeqCst), 3);

        handle.shutdown();
        task.await.unwrap();
        assert!(!handle.is_running());
        assert!(enumerator.stopped.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_round_keeps_scheduling() {
        let failing = Arc::new(CountingEnumerator {
            fail: true,
            ..Default::default()
        });
        let (handle, task) =
            Scheduler::new(vec![failing.clone()], Duration::from_secs(60)).spawn();

        wait_for_queries(&failing, 1).await;
        handle.refresh();
        wait_for_queries(&failing, 2).await;
        assert_eq!(failing.queries.load(Ordering::SeqCst), 2);
        assert!(handle.is_running());

        handle.shutdown();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_with_no_enumerators() {
        let (handle, task) = Scheduler::new(Vec::new(), Duration::from_secs(3600)).spawn();

        handle.refresh();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(handle.is_running());

        handle.shutdown();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_external_cancellation_stops_loop() {
        let token = CancellationToken::new();
        let enumerator = Arc::new(CountingEnumerator::default());
        let (handle, task) = Scheduler::new(vec![enumerator.clone()], Duration::from_secs(60))
            .with_cancellation(token.clone())
            .spawn();

        token.cancel();
        task.await.unwrap();

        assert!(!handle.is_running());
        assert!(enumerator.stopped.load(Ordering::SeqCst));
    }
}
