//! [`SqliteStore`]: the storage ports over one `SQLite` pool.
//!
//! This file implements [`ApplianceStore`], the surface used by the tick
//! orchestrator. The management repositories live in their own modules.

use sqlx::SqlitePool;

use shems_app::ports::{ApplianceStore, ConditionChange};
use shems_domain::appliance::ApplianceConfig;
use shems_domain::error::{ConflictError, ShemsError};
use shems_domain::id::{ApplianceId, HomeId};
use shems_domain::observation::Observation;

use crate::appliance_repo;
use crate::codec;
use crate::error::StorageError;
use crate::observation_repo;

const UPDATE_CONDITION: &str = r"
    UPDATE appliances SET condition = ?
    WHERE home_id = ? AND appliance_id = ? AND condition = ?
";
const SELECT_NOTIFY_ADDRESS: &str = "SELECT notify_address FROM homes WHERE id = ?";

/// `SQLite`-backed implementation of every storage port.
///
/// Cloning is cheap and shares the underlying pool.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Create a new store using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn update_condition_query(
    home_id: HomeId,
    appliance_id: ApplianceId,
    change: ConditionChange,
) -> sqlx::query::Query<'static, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'static>> {
    sqlx::query(UPDATE_CONDITION)
        .bind(change.to.to_string())
        .bind(i64::from(home_id.get()))
        .bind(i64::from(appliance_id.get()))
        .bind(change.from.to_string())
}

fn conflict(home_id: HomeId, appliance_id: ApplianceId) -> ShemsError {
    ConflictError {
        entity: "Appliance",
        id: format!("{home_id}/{appliance_id}"),
    }
    .into()
}

fn insert_observation_query(
    observation: &Observation,
) -> sqlx::query::Query<'static, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'static>> {
    sqlx::query(observation_repo::INSERT)
        .bind(i64::from(observation.home_id.get()))
        .bind(i64::from(observation.appliance_id.get()))
        .bind(codec::format_timestamp(observation.recorded_at))
        .bind(observation.energy_consumed)
        .bind(observation.output)
}

impl ApplianceStore for SqliteStore {
    async fn list_appliance_configs(&self) -> Result<Vec<ApplianceConfig>, ShemsError> {
        let rows: Vec<appliance_repo::Wrapper> = sqlx::query_as(appliance_repo::SELECT_ALL)
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(rows.into_iter().map(|w| w.0).collect())
    }

    async fn last_observation(
        &self,
        home_id: HomeId,
        appliance_id: ApplianceId,
    ) -> Result<Option<Observation>, ShemsError> {
        let row: Option<observation_repo::Wrapper> =
            sqlx::query_as(observation_repo::SELECT_RECENT)
                .bind(i64::from(home_id.get()))
                .bind(i64::from(appliance_id.get()))
                .bind(1_i64)
                .fetch_optional(&self.pool)
                .await
                .map_err(StorageError::from)?;

        Ok(observation_repo::Wrapper::maybe(row))
    }

    async fn update_condition(
        &self,
        home_id: HomeId,
        appliance_id: ApplianceId,
        change: ConditionChange,
    ) -> Result<(), ShemsError> {
        let result = update_condition_query(home_id, appliance_id, change)
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        if result.rows_affected() == 0 {
            return Err(conflict(home_id, appliance_id));
        }
        Ok(())
    }

    async fn append_observation(&self, observation: Observation) -> Result<(), ShemsError> {
        insert_observation_query(&observation)
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(())
    }

    async fn home_notify_address(&self, home_id: HomeId) -> Result<Option<String>, ShemsError> {
        let address: Option<String> = sqlx::query_scalar(SELECT_NOTIFY_ADDRESS)
            .bind(i64::from(home_id.get()))
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(address)
    }

    /// Both writes run in one transaction; a conflicting condition change
    /// rolls the observation back too.
    async fn commit_step(
        &self,
        change: Option<ConditionChange>,
        observation: Observation,
    ) -> Result<(), ShemsError> {
        let mut tx = self.pool.begin().await.map_err(StorageError::from)?;

        if let Some(change) = change {
            let result =
                update_condition_query(observation.home_id, observation.appliance_id, change)
                    .execute(&mut *tx)
                    .await
                    .map_err(StorageError::from)?;
            if result.rows_affected() == 0 {
                return Err(conflict(observation.home_id, observation.appliance_id));
            }
        }
        insert_observation_query(&observation)
            .execute(&mut *tx)
            .await
            .map_err(StorageError::from)?;

        tx.commit().await.map_err(StorageError::from)?;
        Ok(())
    }
}
