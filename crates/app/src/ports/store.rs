//! Storage ports: what the control loop and the management services persist.
//!
//! [`ApplianceStore`] is the narrow surface one tick needs. The three
//! repository traits back the management use-cases. A single adapter
//! usually implements all four over the same database.

use std::future::Future;
use std::sync::Arc;

use shems_domain::appliance::{ApplianceConfig, Condition};
use shems_domain::error::ShemsError;
use shems_domain::home::Home;
use shems_domain::id::{ApplianceId, HomeId};
use shems_domain::observation::Observation;

/// A condition flip decided by one simulation step.
///
/// `from` is the condition the step was computed with. Stores apply the
/// change only while the appliance still holds `from`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConditionChange {
    pub from: Condition,
    pub to: Condition,
}

/// Storage used by the tick orchestrator.
///
/// Adapters report connection-level failures as
/// [`ShemsError::StoreUnavailable`] and every other failure as
/// [`ShemsError::Storage`]; the orchestrator aborts a tick on the former
/// and skips a single appliance on the latter.
pub trait ApplianceStore: Send + Sync {
    /// Every appliance of every home, with its current condition and thresholds.
    fn list_appliance_configs(
        &self,
    ) -> impl Future<Output = Result<Vec<ApplianceConfig>, ShemsError>> + Send;

    /// Newest observation of an appliance, or `None` when it has no history.
    fn last_observation(
        &self,
        home_id: HomeId,
        appliance_id: ApplianceId,
    ) -> impl Future<Output = Result<Option<Observation>, ShemsError>> + Send;

    /// Persist `change.to` if the stored condition still equals `change.from`.
    ///
    /// Fails with [`ShemsError::Conflict`] when the condition was changed
    /// (or the appliance removed) since it was read.
    fn update_condition(
        &self,
        home_id: HomeId,
        appliance_id: ApplianceId,
        change: ConditionChange,
    ) -> impl Future<Output = Result<(), ShemsError>> + Send;

    /// Append an observation to the appliance's history.
    fn append_observation(
        &self,
        observation: Observation,
    ) -> impl Future<Output = Result<(), ShemsError>> + Send;

    /// Notification destination of a home, `None` when the home is unknown.
    fn home_notify_address(
        &self,
        home_id: HomeId,
    ) -> impl Future<Output = Result<Option<String>, ShemsError>> + Send;

    /// Persist the result of one simulation step: the condition change (when
    /// it flipped) and the observation.
    ///
    /// The provided implementation performs the two writes in sequence and
    /// appends nothing when the condition change conflicts. Adapters that
    /// support transactions should override it so that both writes become
    /// visible together or not at all.
    fn commit_step(
        &self,
        change: Option<ConditionChange>,
        observation: Observation,
    ) -> impl Future<Output = Result<(), ShemsError>> + Send {
        async move {
            if let Some(change) = change {
                self.update_condition(observation.home_id, observation.appliance_id, change)
                    .await?;
            }
            self.append_observation(observation).await
        }
    }
}

/// Repository for [`Home`]s.
pub trait HomeRepository: Send + Sync {
    /// Persist a new home.
    fn create_home(&self, home: Home) -> impl Future<Output = Result<Home, ShemsError>> + Send;

    /// Get a home by its identifier.
    fn get_home(
        &self,
        id: HomeId,
    ) -> impl Future<Output = Result<Option<Home>, ShemsError>> + Send;

    /// List all homes ordered by identifier.
    fn list_homes(&self) -> impl Future<Output = Result<Vec<Home>, ShemsError>> + Send;
}

/// Repository for [`ApplianceConfig`]s.
pub trait ApplianceRepository: Send + Sync {
    /// Persist a new appliance.
    fn create_appliance(
        &self,
        config: ApplianceConfig,
    ) -> impl Future<Output = Result<ApplianceConfig, ShemsError>> + Send;

    /// Get one appliance of a home.
    fn get_appliance(
        &self,
        home_id: HomeId,
        appliance_id: ApplianceId,
    ) -> impl Future<Output = Result<Option<ApplianceConfig>, ShemsError>> + Send;

    /// List the appliances of a home ordered by class.
    fn find_by_home(
        &self,
        home_id: HomeId,
    ) -> impl Future<Output = Result<Vec<ApplianceConfig>, ShemsError>> + Send;

    /// Replace the thresholds of an existing appliance, leaving every other
    /// column untouched, and return the updated record.
    ///
    /// Fails with [`ShemsError::NotFound`] when the appliance does not exist.
    fn update_thresholds(
        &self,
        home_id: HomeId,
        appliance_id: ApplianceId,
        start_value: f64,
        stop_value: f64,
    ) -> impl Future<Output = Result<ApplianceConfig, ShemsError>> + Send;

    /// Unconditionally set the condition of an existing appliance and return
    /// the updated record.
    ///
    /// Fails with [`ShemsError::NotFound`] when the appliance does not exist.
    fn override_condition(
        &self,
        home_id: HomeId,
        appliance_id: ApplianceId,
        condition: Condition,
    ) -> impl Future<Output = Result<ApplianceConfig, ShemsError>> + Send;

    /// Delete an appliance together with its observations.
    fn delete_appliance(
        &self,
        home_id: HomeId,
        appliance_id: ApplianceId,
    ) -> impl Future<Output = Result<(), ShemsError>> + Send;
}

/// Read access to appliance history.
pub trait ObservationRepository: Send + Sync {
    /// Most recent observations of an appliance, newest first.
    fn recent_observations(
        &self,
        home_id: HomeId,
        appliance_id: ApplianceId,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<Observation>, ShemsError>> + Send;

    /// Total energy consumed by every appliance of a home, in kWh.
    fn home_energy_total(
        &self,
        home_id: HomeId,
    ) -> impl Future<Output = Result<f64, ShemsError>> + Send;
}

/// Everything a full storage backend provides.
pub trait Store:
    ApplianceStore + HomeRepository + ApplianceRepository + ObservationRepository
{
}

impl<T> Store for T where
    T: ApplianceStore + HomeRepository + ApplianceRepository + ObservationRepository
{
}

impl<T: ApplianceStore> ApplianceStore for Arc<T> {
    fn list_appliance_configs(
        &self,
    ) -> impl Future<Output = Result<Vec<ApplianceConfig>, ShemsError>> + Send {
        (**self).list_appliance_configs()
    }

    fn last_observation(
        &self,
        home_id: HomeId,
        appliance_id: ApplianceId,
    ) -> impl Future<Output = Result<Option<Observation>, ShemsError>> + Send {
        (**self).last_observation(home_id, appliance_id)
    }

    fn update_condition(
        &self,
        home_id: HomeId,
        appliance_id: ApplianceId,
        change: ConditionChange,
    ) -> impl Future<Output = Result<(), ShemsError>> + Send {
        (**self).update_condition(home_id, appliance_id, change)
    }

    fn append_observation(
        &self,
        observation: Observation,
    ) -> impl Future<Output = Result<(), ShemsError>> + Send {
        (**self).append_observation(observation)
    }

    fn home_notify_address(
        &self,
        home_id: HomeId,
    ) -> impl Future<Output = Result<Option<String>, ShemsError>> + Send {
        (**self).home_notify_address(home_id)
    }

    fn commit_step(
        &self,
        change: Option<ConditionChange>,
        observation: Observation,
    ) -> impl Future<Output = Result<(), ShemsError>> + Send {
        (**self).commit_step(change, observation)
    }
}

impl<T: HomeRepository> HomeRepository for Arc<T> {
    fn create_home(&self, home: Home) -> impl Future<Output = Result<Home, ShemsError>> + Send {
        (**self).create_home(home)
    }

    fn get_home(
        &self,
        id: HomeId,
    ) -> impl Future<Output = Result<Option<Home>, ShemsError>> + Send {
        (**self).get_home(id)
    }

    fn list_homes(&self) -> impl Future<Output = Result<Vec<Home>, ShemsError>> + Send {
        (**self).list_homes()
    }
}

impl<T: ApplianceRepository> ApplianceRepository for Arc<T> {
    fn create_appliance(
        &self,
        config: ApplianceConfig,
    ) -> impl Future<Output = Result<ApplianceConfig, ShemsError>> + Send {
        (**self).create_appliance(config)
    }

    fn get_appliance(
        &self,
        home_id: HomeId,
        appliance_id: ApplianceId,
    ) -> impl Future<Output = Result<Option<ApplianceConfig>, ShemsError>> + Send {
        (**self).get_appliance(home_id, appliance_id)
    }

    fn find_by_home(
        &self,
        home_id: HomeId,
    ) -> impl Future<Output = Result<Vec<ApplianceConfig>, ShemsError>> + Send {
        (**self).find_by_home(home_id)
    }

    fn update_thresholds(
        &self,
        home_id: HomeId,
        appliance_id: ApplianceId,
        start_value: f64,
        stop_value: f64,
    ) -> impl Future<Output = Result<ApplianceConfig, ShemsError>> + Send {
        (**self).update_thresholds(home_id, appliance_id, start_value, stop_value)
    }

    fn override_condition(
        &self,
        home_id: HomeId,
        appliance_id: ApplianceId,
        condition: Condition,
    ) -> impl Future<Output = Result<ApplianceConfig, ShemsError>> + Send {
        (**self).override_condition(home_id, appliance_id, condition)
    }

    fn delete_appliance(
        &self,
        home_id: HomeId,
        appliance_id: ApplianceId,
    ) -> impl Future<Output = Result<(), ShemsError>> + Send {
        (**self).delete_appliance(home_id, appliance_id)
    }
}

impl<T: ObservationRepository> ObservationRepository for Arc<T> {
    fn recent_observations(
        &self,
        home_id: HomeId,
        appliance_id: ApplianceId,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<Observation>, ShemsError>> + Send {
        (**self).recent_observations(home_id, appliance_id, limit)
    }

    fn home_energy_total(
        &self,
        home_id: HomeId,
    ) -> impl Future<Output = Result<f64, ShemsError>> + Send {
        (**self).home_energy_total(home_id)
    }
}
