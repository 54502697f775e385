//! `SQLite` implementation of [`ApplianceRepository`].

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};

use shems_app::ports::ApplianceRepository;
use shems_domain::appliance::{ApplianceConfig, Condition};
use shems_domain::error::{NotFoundError, ShemsError};
use shems_domain::id::{ApplianceId, HomeId};

use crate::codec;
use crate::error::StorageError;
use crate::store::SqliteStore;

/// Wrapper for converting database rows into domain types without polluting
/// domain structs with database concerns.
pub(crate) struct Wrapper(pub(crate) ApplianceConfig);

impl Wrapper {
    fn maybe(value: Option<Self>) -> Option<ApplianceConfig> {
        value.map(|w| w.0)
    }
}

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let home_id: i64 = row.try_get("home_id")?;
        let appliance_id: i64 = row.try_get("appliance_id")?;
        let condition: String = row.try_get("condition")?;

        Ok(Self(ApplianceConfig {
            home_id: codec::home_id(home_id)?,
            appliance_id: codec::appliance_id(appliance_id)?,
            name: row.try_get("name")?,
            condition: codec::condition(&condition)?,
            start_value: row.try_get("start_value")?,
            stop_value: row.try_get("stop_value")?,
            notify_address: row.try_get("notify_address")?,
        }))
    }
}

pub(crate) const SELECT_ALL: &str = r"
    SELECT a.home_id, a.appliance_id, a.name, a.condition, a.start_value, a.stop_value,
           h.notify_address
    FROM appliances a
    LEFT JOIN homes h ON h.id = a.home_id
    ORDER BY a.home_id, a.appliance_id
";

const SELECT_BY_KEY: &str = r"
    SELECT a.home_id, a.appliance_id, a.name, a.condition, a.start_value, a.stop_value,
           h.notify_address
    FROM appliances a
    LEFT JOIN homes h ON h.id = a.home_id
    WHERE a.home_id = ? AND a.appliance_id = ?
";

const SELECT_BY_HOME: &str = r"
    SELECT a.home_id, a.appliance_id, a.name, a.condition, a.start_value, a.stop_value,
           h.notify_address
    FROM appliances a
    LEFT JOIN homes h ON h.id = a.home_id
    WHERE a.home_id = ?
    ORDER BY a.appliance_id
";

const INSERT: &str = r"
    INSERT INTO appliances (home_id, appliance_id, name, condition, start_value, stop_value)
    VALUES (?, ?, ?, ?, ?, ?)
";

const UPDATE_THRESHOLDS: &str = r"
    UPDATE appliances SET start_value = ?, stop_value = ?
    WHERE home_id = ? AND appliance_id = ?
";

const OVERRIDE_CONDITION: &str =
    "UPDATE appliances SET condition = ? WHERE home_id = ? AND appliance_id = ?";

const DELETE_OBSERVATIONS: &str =
    "DELETE FROM observations WHERE home_id = ? AND appliance_id = ?";
const DELETE_BY_KEY: &str = "DELETE FROM appliances WHERE home_id = ? AND appliance_id = ?";

fn not_found(home_id: HomeId, appliance_id: ApplianceId) -> ShemsError {
    NotFoundError {
        entity: "Appliance",
        id: format!("{home_id}/{appliance_id}"),
    }
    .into()
}

impl SqliteStore {
    /// Run a single-row update and read the row back in the same transaction.
    async fn update_and_fetch(
        &self,
        update: sqlx::query::Query<'static, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'static>>,
        home_id: HomeId,
        appliance_id: ApplianceId,
    ) -> Result<ApplianceConfig, ShemsError> {
        let mut tx = self.pool().begin().await.map_err(StorageError::from)?;

        let result = update.execute(&mut *tx).await.map_err(StorageError::from)?;
        if result.rows_affected() == 0 {
            return Err(not_found(home_id, appliance_id));
        }
        let row: Wrapper = sqlx::query_as(SELECT_BY_KEY)
            .bind(i64::from(home_id.get()))
            .bind(i64::from(appliance_id.get()))
            .fetch_one(&mut *tx)
            .await
            .map_err(StorageError::from)?;

        tx.commit().await.map_err(StorageError::from)?;
        Ok(row.0)
    }
}

impl ApplianceRepository for SqliteStore {
    async fn create_appliance(
        &self,
        config: ApplianceConfig,
    ) -> Result<ApplianceConfig, ShemsError> {
        sqlx::query(INSERT)
            .bind(i64::from(config.home_id.get()))
            .bind(i64::from(config.appliance_id.get()))
            .bind(&config.name)
            .bind(config.condition.to_string())
            .bind(config.start_value)
            .bind(config.stop_value)
            .execute(self.pool())
            .await
            .map_err(StorageError::from)?;

        Ok(config)
    }

    async fn get_appliance(
        &self,
        home_id: HomeId,
        appliance_id: ApplianceId,
    ) -> Result<Option<ApplianceConfig>, ShemsError> {
        let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_KEY)
            .bind(i64::from(home_id.get()))
            .bind(i64::from(appliance_id.get()))
            .fetch_optional(self.pool())
            .await
            .map_err(StorageError::from)?;

        Ok(Wrapper::maybe(row))
    }

    async fn find_by_home(&self, home_id: HomeId) -> Result<Vec<ApplianceConfig>, ShemsError> {
        let rows: Vec<Wrapper> = sqlx::query_as(SELECT_BY_HOME)
            .bind(i64::from(home_id.get()))
            .fetch_all(self.pool())
            .await
            .map_err(StorageError::from)?;

        Ok(rows.into_iter().map(|w| w.0).collect())
    }

    async fn update_thresholds(
        &self,
        home_id: HomeId,
        appliance_id: ApplianceId,
        start_value: f64,
        stop_value: f64,
    ) -> Result<ApplianceConfig, ShemsError> {
        let update = sqlx::query(UPDATE_THRESHOLDS)
            .bind(start_value)
            .bind(stop_value)
            .bind(i64::from(home_id.get()))
            .bind(i64::from(appliance_id.get()));
        self.update_and_fetch(update, home_id, appliance_id).await
    }

    async fn override_condition(
        &self,
        home_id: HomeId,
        appliance_id: ApplianceId,
        condition: Condition,
    ) -> Result<ApplianceConfig, ShemsError> {
        let update = sqlx::query(OVERRIDE_CONDITION)
            .bind(condition.to_string())
            .bind(i64::from(home_id.get()))
            .bind(i64::from(appliance_id.get()));
        self.update_and_fetch(update, home_id, appliance_id).await
    }

    async fn delete_appliance(
        &self,
        home_id: HomeId,
        appliance_id: ApplianceId,
    ) -> Result<(), ShemsError> {
        let mut tx = self.pool().begin().await.map_err(StorageError::from)?;

        sqlx::query(DELETE_OBSERVATIONS)
            .bind(i64::from(home_id.get()))
            .bind(i64::from(appliance_id.get()))
            .execute(&mut *tx)
            .await
            .map_err(StorageError::from)?;
        sqlx::query(DELETE_BY_KEY)
            .bind(i64::from(home_id.get()))
            .bind(i64::from(appliance_id.get()))
            .execute(&mut *tx)
            .await
            .map_err(StorageError::from)?;

        tx.commit().await.map_err(StorageError::from)?;
        Ok(())
    }
}
