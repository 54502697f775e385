//! Tick orchestrator: one pass of the control loop over every appliance.
//!
//! For each appliance the orchestrator reads the newest observation,
//! runs one simulation step, then commits the new condition (when it
//! flipped) together with the new observation. The commit runs on its own
//! task: once it lands, that task hands the transition to the notifier, so
//! a slow or failing notifier never holds up the tick and a commit that
//! outlives its timeout is still notified.
//!
//! Failure handling:
//! - the store cannot list appliances (or is unreachable mid-tick): the
//!   tick aborts with [`TickError::StoreUnavailable`];
//! - the commit does not answer within the store timeout: the appliance is
//!   reported as pending and the commit keeps running;
//! - any other failure for one appliance (including a condition changed
//!   since it was read): logged, the appliance is skipped and the next one
//!   is processed.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use tokio::sync::oneshot;

use shems_domain::appliance::{ApplianceConfig, Condition};
use shems_domain::error::ShemsError;
use shems_domain::observation::{self, Observation};
use shems_domain::simulation::{self, StepOutcome};
use shems_domain::time::{self, Timestamp};
use shems_domain::transition::TransitionEvent;

use crate::ports::{ApplianceStore, ConditionChange, Notifier};

const COMMIT_STEP: &str = "commit_step";

/// Why a tick did not run to completion.
#[derive(Debug, thiserror::Error)]
pub enum TickError {
    /// Another tick holds the single-flight guard.
    #[error("a tick is already running")]
    AlreadyRunning,

    /// The store could not be reached; no appliance was processed past the failure.
    #[error("store unavailable")]
    StoreUnavailable(#[source] ShemsError),

    /// The task running the tick panicked or was cancelled.
    #[error("tick task aborted")]
    Aborted(#[source] tokio::task::JoinError),
}

/// Summary of one completed tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickReport {
    pub started_at: Timestamp,
    /// Appliances listed by the store.
    pub appliances: usize,
    /// Appliances whose step was committed.
    pub processed: usize,
    /// Appliances skipped because of a per-appliance failure.
    pub skipped: usize,
    /// Appliances whose commit was still running when the tick stopped
    /// waiting for it. A transition is notified once its commit lands.
    pub pending_commits: usize,
    /// Condition flips committed during this tick.
    pub transitions: usize,
    /// Energy consumed by all processed appliances during this tick, in kWh.
    pub energy_consumed_kwh: f64,
}

/// Timeouts bounding the external calls made during a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickSettings {
    pub store_timeout: Duration,
    pub notify_timeout: Duration,
}

impl Default for TickSettings {
    fn default() -> Self {
        Self {
            store_timeout: Duration::from_secs(10),
            notify_timeout: Duration::from_secs(30),
        }
    }
}

/// Runs ticks against a store, handing transitions to a notifier.
///
/// The orchestrator itself does not prevent overlapping ticks; wrap it in a
/// [`Scheduler`](crate::scheduler::Scheduler) for that.
pub struct TickOrchestrator<S, N> {
    store: Arc<S>,
    notifier: Arc<N>,
    rng: Mutex<StdRng>,
    settings: TickSettings,
}

impl<S, N> TickOrchestrator<S, N>
where
    S: ApplianceStore + 'static,
    N: Notifier + 'static,
{
    /// Create an orchestrator seeded from OS entropy.
    pub fn new(store: S, notifier: N, settings: TickSettings) -> Self {
        Self {
            store: Arc::new(store),
            notifier: Arc::new(notifier),
            rng: Mutex::new(StdRng::from_entropy()),
            settings,
        }
    }

    /// Replace the random source with a deterministic one.
    #[must_use]
    pub fn with_seed(self, seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            ..self
        }
    }

    /// Run one tick over every appliance.
    ///
    /// # Errors
    ///
    /// Returns [`TickError::StoreUnavailable`] when the appliance list
    /// cannot be read, or when the store becomes unreachable mid-tick.
    #[tracing::instrument(skip(self))]
    pub async fn run_tick(&self) -> Result<TickReport, TickError> {
        let started_at = time::now();
        let configs = bounded(
            self.settings.store_timeout,
            "list_appliance_configs",
            self.store.list_appliance_configs(),
        )
        .await
        .map_err(TickError::StoreUnavailable)?;

        let mut report = TickReport {
            started_at,
            appliances: configs.len(),
            processed: 0,
            skipped: 0,
            pending_commits: 0,
            transitions: 0,
            energy_consumed_kwh: 0.0,
        };

        for config in &configs {
            match self.process(config).await {
                Ok(outcome) => {
                    report.processed += 1;
                    report.energy_consumed_kwh += outcome.energy_consumed;
                    if outcome.transitioned {
                        report.transitions += 1;
                    }
                }
                Err(err) if err.is_store_unavailable() => {
                    tracing::error!(
                        home_id = %config.home_id,
                        appliance_id = %config.appliance_id,
                        error = ?err,
                        "store became unavailable, aborting tick"
                    );
                    return Err(TickError::StoreUnavailable(err));
                }
                Err(ShemsError::Timeout {
                    operation: COMMIT_STEP,
                }) => {
                    tracing::warn!(
                        home_id = %config.home_id,
                        appliance_id = %config.appliance_id,
                        "commit still running, moving on"
                    );
                    report.pending_commits += 1;
                }
                Err(err) => {
                    tracing::warn!(
                        home_id = %config.home_id,
                        appliance_id = %config.appliance_id,
                        error = ?err,
                        "skipping appliance"
                    );
                    report.skipped += 1;
                }
            }
        }

        tracing::info!(
            appliances = report.appliances,
            processed = report.processed,
            skipped = report.skipped,
            pending_commits = report.pending_commits,
            transitions = report.transitions,
            energy_consumed_kwh = report.energy_consumed_kwh,
            "tick completed"
        );
        Ok(report)
    }

    async fn process(&self, config: &ApplianceConfig) -> Result<StepOutcome, ShemsError> {
        let last = bounded(
            self.settings.store_timeout,
            "last_observation",
            self.store.last_observation(config.home_id, config.appliance_id),
        )
        .await?;
        let last_output = observation::last_output(last.as_ref());

        let outcome = {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            simulation::step(config, last_output, &mut *rng)?
        };

        let recorded_at = time::not_before(time::now(), last.map(|obs| obs.recorded_at));
        let observation = Observation::new(
            config.home_id,
            config.appliance_id,
            recorded_at,
            outcome.energy_consumed,
            outcome.output,
        );
        let change = outcome.transitioned.then_some(ConditionChange {
            from: config.condition,
            to: outcome.condition,
        });

        let committed = self.spawn_commit(config.clone(), change, observation);
        match tokio::time::timeout(self.settings.store_timeout, committed).await {
            Ok(Ok(result)) => result?,
            Ok(Err(_)) => {
                return Err(ShemsError::Storage("commit task ended without a result".into()));
            }
            Err(_) => {
                return Err(ShemsError::Timeout {
                    operation: COMMIT_STEP,
                });
            }
        }

        tracing::debug!(
            home_id = %config.home_id,
            appliance_id = %config.appliance_id,
            last_output,
            output = outcome.output,
            energy_consumed = outcome.energy_consumed,
            condition = %outcome.condition,
            "appliance stepped"
        );
        Ok(outcome)
    }

    /// Commit one step on a detached task and notify its transition once it
    /// landed. The receiver yields the commit result; dropping it does not
    /// cancel the commit.
    fn spawn_commit(
        &self,
        config: ApplianceConfig,
        change: Option<ConditionChange>,
        observation: Observation,
    ) -> oneshot::Receiver<Result<(), ShemsError>> {
        let (committed_tx, committed_rx) = oneshot::channel();
        let store = Arc::clone(&self.store);
        let notifier = Arc::clone(&self.notifier);
        let settings = self.settings;
        let at = observation.recorded_at;

        tokio::spawn(async move {
            let result = store.commit_step(change, observation).await;
            let landed = result.is_ok();
            if let Err(unclaimed) = committed_tx.send(result) {
                match unclaimed {
                    Ok(()) => tracing::info!(
                        home_id = %config.home_id,
                        appliance_id = %config.appliance_id,
                        "commit landed after the tick stopped waiting"
                    ),
                    Err(err) => tracing::warn!(
                        home_id = %config.home_id,
                        appliance_id = %config.appliance_id,
                        error = ?err,
                        "late commit failed"
                    ),
                }
            }
            if let (true, Some(change)) = (landed, change) {
                dispatch(&*store, &*notifier, settings, &config, change.to, at).await;
            }
        });

        committed_rx
    }
}

/// Resolve the recipient of a committed transition and deliver it.
async fn dispatch<S, N>(
    store: &S,
    notifier: &N,
    settings: TickSettings,
    config: &ApplianceConfig,
    new_condition: Condition,
    at: Timestamp,
) where
    S: ApplianceStore,
    N: Notifier,
{
    let mut event = TransitionEvent::new(config, new_condition, at);
    if event.recipient.is_none() {
        let address = bounded(
            settings.store_timeout,
            "home_notify_address",
            store.home_notify_address(config.home_id),
        )
        .await;
        match address {
            Ok(Some(address)) => event = event.with_recipient(address),
            Ok(None) => {
                tracing::warn!(home_id = %config.home_id, "home has no notification address");
            }
            Err(err) => {
                tracing::warn!(
                    home_id = %config.home_id,
                    error = ?err,
                    "cannot resolve notification address"
                );
            }
        }
    }

    tracing::info!(
        home_id = %event.home_id,
        appliance_id = %event.appliance_id,
        from = %event.old_condition,
        to = %event.new_condition,
        "appliance condition changed"
    );

    let transition_id = event.id;
    match tokio::time::timeout(settings.notify_timeout, notifier.notify(event)).await {
        Ok(Ok(())) => tracing::debug!(%transition_id, "notification delivered"),
        Ok(Err(err)) => {
            tracing::warn!(%transition_id, error = ?err, "notification failed");
        }
        Err(_) => tracing::warn!(%transition_id, "notification timed out"),
    }
}

async fn bounded<T>(
    timeout: Duration,
    operation: &'static str,
    call: impl Future<Output = Result<T, ShemsError>>,
) -> Result<T, ShemsError> {
    tokio::time::timeout(timeout, call)
        .await
        .map_err(|_| ShemsError::Timeout { operation })?
}
