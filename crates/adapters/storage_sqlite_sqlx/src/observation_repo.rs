//! `SQLite` implementation of [`ObservationRepository`].

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};

use shems_app::ports::ObservationRepository;
use shems_domain::error::ShemsError;
use shems_domain::id::{ApplianceId, HomeId};
use shems_domain::observation::Observation;

use crate::codec;
use crate::error::StorageError;
use crate::store::SqliteStore;

pub(crate) struct Wrapper(pub(crate) Observation);

impl Wrapper {
    pub(crate) fn maybe(value: Option<Self>) -> Option<Observation> {
        value.map(|w| w.0)
    }
}

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let home_id: i64 = row.try_get("home_id")?;
        let appliance_id: i64 = row.try_get("appliance_id")?;
        let recorded_at: String = row.try_get("recorded_at")?;

        Ok(Self(Observation {
            home_id: codec::home_id(home_id)?,
            appliance_id: codec::appliance_id(appliance_id)?,
            recorded_at: codec::timestamp(&recorded_at)?,
            energy_consumed: row.try_get("energy_consumed")?,
            output: row.try_get("output")?,
        }))
    }
}

pub(crate) const INSERT: &str = r"
    INSERT INTO observations (home_id, appliance_id, recorded_at, energy_consumed, output)
    VALUES (?, ?, ?, ?, ?)
";

pub(crate) const SELECT_RECENT: &str = r"
    SELECT * FROM observations
    WHERE home_id = ? AND appliance_id = ?
    ORDER BY id DESC
    LIMIT ?
";

const SUM_BY_HOME: &str =
    "SELECT COALESCE(SUM(energy_consumed), 0.0) FROM observations WHERE home_id = ?";

impl ObservationRepository for SqliteStore {
    async fn recent_observations(
        &self,
        home_id: HomeId,
        appliance_id: ApplianceId,
        limit: usize,
    ) -> Result<Vec<Observation>, ShemsError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows: Vec<Wrapper> = sqlx::query_as(SELECT_RECENT)
            .bind(i64::from(home_id.get()))
            .bind(i64::from(appliance_id.get()))
            .bind(limit)
            .fetch_all(self.pool())
            .await
            .map_err(StorageError::from)?;

        Ok(rows.into_iter().map(|w| w.0).collect())
    }

    async fn home_energy_total(&self, home_id: HomeId) -> Result<f64, ShemsError> {
        let total: f64 = sqlx::query_scalar(SUM_BY_HOME)
            .bind(i64::from(home_id.get()))
            .fetch_one(self.pool())
            .await
            .map_err(StorageError::from)?;

        Ok(total)
    }
}
