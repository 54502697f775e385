//! Scheduler: runs ticks periodically and on demand, one at a time.
//!
//! Every tick, scheduled or triggered, goes through [`Scheduler::trigger`],
//! which holds a single-flight guard for the whole tick. A trigger arriving
//! while a tick is in flight is rejected with [`TickError::AlreadyRunning`]
//! rather than queued, so a slow tick never causes a burst of catch-up ticks.
//!
//! The tick itself runs on its own task, which owns the guard. Dropping the
//! future returned by [`Scheduler::trigger`] (a client disconnecting, a
//! request timeout) therefore never cuts a tick short: the remaining
//! appliances are still processed and the counters still updated.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::ports::{ApplianceStore, Notifier};
use crate::tick::{TickError, TickOrchestrator, TickReport};

/// Running counters of tick outcomes.
#[derive(Debug, Default)]
struct TickStats {
    completed: AtomicU64,
    failed: AtomicU64,
    skipped: AtomicU64,
}

/// Point-in-time copy of the tick counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TickStatsSnapshot {
    pub completed: u64,
    pub failed: u64,
    pub skipped: u64,
}

impl TickStats {
    fn record(&self, result: &Result<TickReport, TickError>) {
        let counter = match result {
            Ok(_) => &self.completed,
            Err(TickError::StoreUnavailable(_) | TickError::Aborted(_)) => &self.failed,
            Err(TickError::AlreadyRunning) => &self.skipped,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> TickStatsSnapshot {
        TickStatsSnapshot {
            completed: self.completed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
        }
    }
}

/// Periodic driver of a [`TickOrchestrator`].
pub struct Scheduler<S, N> {
    orchestrator: Arc<TickOrchestrator<S, N>>,
    period: Duration,
    running: Arc<Mutex<()>>,
    stats: Arc<TickStats>,
}

impl<S, N> Scheduler<S, N>
where
    S: ApplianceStore + 'static,
    N: Notifier + 'static,
{
    /// Create a scheduler ticking every `period`.
    pub fn new(orchestrator: TickOrchestrator<S, N>, period: Duration) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            period,
            running: Arc::new(Mutex::new(())),
            stats: Arc::new(TickStats::default()),
        }
    }

    /// Interval between scheduled ticks.
    #[must_use]
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Counters of completed, failed and skipped ticks.
    #[must_use]
    pub fn stats(&self) -> TickStatsSnapshot {
        self.stats.snapshot()
    }

    /// Run one tick now and wait for its report.
    ///
    /// The tick keeps running to completion even if the returned future is
    /// dropped.
    ///
    /// # Errors
    ///
    /// Returns [`TickError::AlreadyRunning`] when another tick is in flight,
    /// [`TickError::Aborted`] when the tick task panicked, or the
    /// orchestrator's error when the tick aborts.
    pub async fn trigger(&self) -> Result<TickReport, TickError> {
        let Ok(guard) = Arc::clone(&self.running).try_lock_owned() else {
            let result = Err(TickError::AlreadyRunning);
            self.stats.record(&result);
            return result;
        };

        let orchestrator = Arc::clone(&self.orchestrator);
        let stats = Arc::clone(&self.stats);
        let tick = tokio::spawn(async move {
            let _guard = guard;
            let result = orchestrator.run_tick().await;
            stats.record(&result);
            result
        });

        match tick.await {
            Ok(result) => result,
            Err(err) => {
                let result = Err(TickError::Aborted(err));
                self.stats.record(&result);
                result
            }
        }
    }

    /// Spawn the periodic loop.
    ///
    /// The first tick fires one period after the call. The loop exits once
    /// `shutdown` turns `true` (or its sender is dropped); a tick already in
    /// flight is allowed to finish first.
    pub fn start(self: Arc<Self>, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }

    async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval_at(Instant::now() + self.period, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tracing::info!(period = ?self.period, "scheduler started");

        loop {
            if *shutdown.borrow() {
                break;
            }
            tokio::select! {
                _ = ticker.tick() => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                    continue;
                }
            }

            match self.trigger().await {
                Ok(report) => tracing::debug!(processed = report.processed, "scheduled tick done"),
                Err(TickError::AlreadyRunning) => {
                    tracing::info!("previous tick still running, skipping scheduled tick");
                }
                Err(err) => tracing::error!(error = ?err, "scheduled tick failed"),
            }
        }

        tracing::info!(stats = ?self.stats(), "scheduler stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::{InMemoryStore, RecordingNotifier, appliance, home};
    use crate::tick::TickSettings;
    use shems_domain::appliance::Condition;

    fn scheduler(
        store: &Arc<InMemoryStore>,
        period: Duration,
    ) -> Arc<Scheduler<Arc<InMemoryStore>, RecordingNotifier>> {
        let orchestrator = TickOrchestrator::new(
            Arc::clone(store),
            RecordingNotifier::default(),
            TickSettings::default(),
        )
        .with_seed(7);
        Arc::new(Scheduler::new(orchestrator, period))
    }

    fn one_appliance_store() -> Arc<InMemoryStore> {
        Arc::new(InMemoryStore::with(
            &[home(1)],
            &[appliance(1, 1, Condition::On)],
        ))
    }

    #[tokio::test]
    async fn should_run_tick_on_demand() {
        let store = one_appliance_store();
        let scheduler = scheduler(&store, Duration::from_secs(3600));

        let report = scheduler.trigger().await.unwrap();

        assert_eq!(report.processed, 1);
        assert_eq!(scheduler.stats().completed, 1);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["processed"], 1);
    }

    #[tokio::test]
    async fn should_reject_trigger_while_tick_in_flight() {
        let store = one_appliance_store();
        store.set_list_delay(Duration::from_millis(100));
        let scheduler = scheduler(&store, Duration::from_secs(3600));

        let (first, second) = tokio::join!(scheduler.trigger(), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            scheduler.trigger().await
        });

        assert!(first.is_ok());
        assert!(matches!(second, Err(TickError::AlreadyRunning)));
        assert_eq!(store.observation_count(), 1);
        assert_eq!(
            scheduler.stats(),
            TickStatsSnapshot {
                completed: 1,
                failed: 0,
                skipped: 1
            }
        );
    }

    #[tokio::test]
    async fn should_finish_tick_when_trigger_is_dropped() {
        let store = Arc::new(InMemoryStore::with(
            &[home(1)],
            &[
                appliance(1, 1, Condition::On),
                appliance(1, 2, Condition::On),
                appliance(1, 3, Condition::On),
            ],
        ));
        store.set_read_delay(Duration::from_millis(50));
        let scheduler = scheduler(&store, Duration::from_secs(3600));

        let dropped = tokio::time::timeout(Duration::from_millis(75), scheduler.trigger()).await;
        assert!(dropped.is_err());
        assert!(matches!(
            scheduler.trigger().await,
            Err(TickError::AlreadyRunning)
        ));

        tokio::time::sleep(Duration::from_millis(300)).await;

        assert_eq!(store.observation_count(), 3);
        for class in 1..=3 {
            assert_eq!(store.observations_of(1, class).len(), 1);
        }
        assert_eq!(scheduler.stats().completed, 1);
        assert!(scheduler.trigger().await.is_ok());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn should_never_overlap_ticks() {
        let store = one_appliance_store();
        store.set_list_delay(Duration::from_millis(15));
        let scheduler = scheduler(&store, Duration::from_secs(3600));

        let mut handles = Vec::new();
        for i in 0..16u64 {
            let scheduler = Arc::clone(&scheduler);
            handles.push(tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(i * 4)).await;
                scheduler.trigger().await.is_ok()
            }));
        }
        let mut completed = 0;
        for handle in handles {
            if handle.await.unwrap() {
                completed += 1;
            }
        }

        let mut windows = store.tick_windows();
        assert_eq!(windows.len(), completed);
        windows.sort();
        for pair in windows.windows(2) {
            assert!(pair[1].0 >= pair[0].1, "ticks overlapped: {pair:?}");
        }
        assert_eq!(store.observation_count(), completed);
    }

    #[tokio::test]
    async fn should_count_failed_ticks() {
        let store = one_appliance_store();
        store.set_unavailable(true);
        let scheduler = scheduler(&store, Duration::from_secs(3600));

        assert!(matches!(
            scheduler.trigger().await,
            Err(TickError::StoreUnavailable(_))
        ));
        store.set_unavailable(false);
        assert!(scheduler.trigger().await.is_ok());

        let stats = scheduler.stats();
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.completed, 1);
    }

    #[tokio::test]
    async fn should_tick_periodically_until_shutdown() {
        let store = one_appliance_store();
        let scheduler = scheduler(&store, Duration::from_millis(20));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle = Arc::clone(&scheduler).start(shutdown_rx);
        tokio::time::sleep(Duration::from_millis(110)).await;
        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();

        let ticks = scheduler.stats().completed;
        assert!(ticks >= 2, "expected at least two ticks, got {ticks}");
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(scheduler.stats().completed, ticks);
    }

    #[tokio::test]
    async fn should_not_tick_immediately_on_start() {
        let store = one_appliance_store();
        let scheduler = scheduler(&store, Duration::from_secs(3600));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle = Arc::clone(&scheduler).start(shutdown_rx);
        tokio::time::sleep(Duration::from_millis(30)).await;
        drop(shutdown_tx);
        handle.await.unwrap();

        assert_eq!(scheduler.stats().completed, 0);
        assert_eq!(store.observation_count(), 0);
    }

    #[tokio::test]
    async fn should_keep_ticking_after_failed_tick() {
        let store = one_appliance_store();
        store.set_unavailable(true);
        let scheduler = scheduler(&store, Duration::from_millis(15));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle = Arc::clone(&scheduler).start(shutdown_rx);
        tokio::time::sleep(Duration::from_millis(50)).await;
        store.set_unavailable(false);
        tokio::time::sleep(Duration::from_millis(60)).await;
        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();

        let stats = scheduler.stats();
        assert!(stats.failed >= 1);
        assert!(stats.completed >= 1);
    }
}
