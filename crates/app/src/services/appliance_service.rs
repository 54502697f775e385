//! Appliance service: use-cases for managing the appliances of a home.
//!
//! The control loop only ever flips conditions; everything else about an
//! appliance (creation, manual override, thresholds, removal) goes through
//! this service.

use shems_domain::appliance::{ApplianceConfig, Condition, validate_thresholds};
use shems_domain::error::{NotFoundError, ShemsError, ValidationError};
use shems_domain::id::{ApplianceId, HomeId};
use shems_domain::observation::Observation;

use crate::ports::{ApplianceRepository, HomeRepository, ObservationRepository};

/// Upper bound on the number of observations returned by one history query.
pub const MAX_HISTORY_LIMIT: usize = 1_000;

/// Application service for appliance CRUD, overrides and history.
pub struct ApplianceService<S> {
    store: S,
}

impl<S> ApplianceService<S>
where
    S: HomeRepository + ApplianceRepository + ObservationRepository,
{
    /// Create a new service backed by the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Add an appliance to an existing home.
    ///
    /// # Errors
    ///
    /// Returns [`ShemsError::Validation`] if invariants fail or the home
    /// already owns an appliance of this class, [`ShemsError::Config`] when
    /// the class is not in the catalog, [`ShemsError::NotFound`] when the
    /// home does not exist, or a storage error.
    #[tracing::instrument(
        skip(self, config),
        fields(home_id = %config.home_id, appliance_id = %config.appliance_id)
    )]
    pub async fn add_appliance(
        &self,
        mut config: ApplianceConfig,
    ) -> Result<ApplianceConfig, ShemsError> {
        config.validate()?;
        config.class()?;
        self.ensure_home(config.home_id).await?;
        if self
            .store
            .get_appliance(config.home_id, config.appliance_id)
            .await?
            .is_some()
        {
            return Err(ValidationError::DuplicateAppliance {
                home_id: config.home_id.to_string(),
                appliance_id: config.appliance_id.to_string(),
            }
            .into());
        }
        // The address always comes from the home.
        config.notify_address = None;
        self.store.create_appliance(config).await
    }

    /// Look up one appliance.
    ///
    /// # Errors
    ///
    /// Returns [`ShemsError::NotFound`] when the appliance does not exist,
    /// or a storage error.
    #[tracing::instrument(skip(self))]
    pub async fn get_appliance(
        &self,
        home_id: HomeId,
        appliance_id: ApplianceId,
    ) -> Result<ApplianceConfig, ShemsError> {
        self.store
            .get_appliance(home_id, appliance_id)
            .await?
            .ok_or_else(|| {
                NotFoundError {
                    entity: "Appliance",
                    id: format!("{home_id}/{appliance_id}"),
                }
                .into()
            })
    }

    /// List the appliances of a home.
    ///
    /// # Errors
    ///
    /// Returns [`ShemsError::NotFound`] when the home does not exist, or a
    /// storage error.
    pub async fn list_appliances(
        &self,
        home_id: HomeId,
    ) -> Result<Vec<ApplianceConfig>, ShemsError> {
        self.ensure_home(home_id).await?;
        self.store.find_by_home(home_id).await
    }

    /// Override the condition of an appliance.
    ///
    /// The control loop keeps applying hysteresis from the new condition on
    /// its next tick. A tick that read the previous condition cannot commit
    /// a flip over this override.
    ///
    /// # Errors
    ///
    /// Returns [`ShemsError::NotFound`] when the appliance does not exist,
    /// or a storage error.
    #[tracing::instrument(skip(self))]
    pub async fn set_condition(
        &self,
        home_id: HomeId,
        appliance_id: ApplianceId,
        condition: Condition,
    ) -> Result<ApplianceConfig, ShemsError> {
        self.store
            .override_condition(home_id, appliance_id, condition)
            .await
    }

    /// Replace the thresholds of an appliance.
    ///
    /// Only the thresholds are written; a condition committed concurrently
    /// by the control loop is kept.
    ///
    /// # Errors
    ///
    /// Returns [`ShemsError::Validation`] when the thresholds are not
    /// finite or `stop_value >= start_value`, [`ShemsError::NotFound`] when
    /// the appliance does not exist, or a storage error.
    #[tracing::instrument(skip(self))]
    pub async fn update_thresholds(
        &self,
        home_id: HomeId,
        appliance_id: ApplianceId,
        start_value: f64,
        stop_value: f64,
    ) -> Result<ApplianceConfig, ShemsError> {
        validate_thresholds(start_value, stop_value)?;
        self.store
            .update_thresholds(home_id, appliance_id, start_value, stop_value)
            .await
    }

    /// Remove an appliance and its history.
    ///
    /// # Errors
    ///
    /// Returns [`ShemsError::NotFound`] when the appliance does not exist,
    /// or a storage error.
    #[tracing::instrument(skip(self))]
    pub async fn remove_appliance(
        &self,
        home_id: HomeId,
        appliance_id: ApplianceId,
    ) -> Result<(), ShemsError> {
        self.get_appliance(home_id, appliance_id).await?;
        self.store.delete_appliance(home_id, appliance_id).await
    }

    /// Most recent observations of an appliance, newest first.
    ///
    /// `limit` is capped at [`MAX_HISTORY_LIMIT`].
    ///
    /// # Errors
    ///
    /// Returns [`ShemsError::NotFound`] when the appliance does not exist,
    /// or a storage error.
    pub async fn observations(
        &self,
        home_id: HomeId,
        appliance_id: ApplianceId,
        limit: usize,
    ) -> Result<Vec<Observation>, ShemsError> {
        self.get_appliance(home_id, appliance_id).await?;
        self.store
            .recent_observations(home_id, appliance_id, limit.min(MAX_HISTORY_LIMIT))
            .await
    }

    /// Total energy consumed by the appliances of a home, in kWh.
    ///
    /// # Errors
    ///
    /// Returns [`ShemsError::NotFound`] when the home does not exist, or a
    /// storage error.
    pub async fn home_energy_total(&self, home_id: HomeId) -> Result<f64, ShemsError> {
        self.ensure_home(home_id).await?;
        self.store.home_energy_total(home_id).await
    }

    async fn ensure_home(&self, home_id: HomeId) -> Result<(), ShemsError> {
        match self.store.get_home(home_id).await? {
            Some(_) => Ok(()),
            None => Err(NotFoundError {
                entity: "Home",
                id: home_id.to_string(),
            }
            .into()),
        }
    }
}
