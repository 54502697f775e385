//! `SQLite` implementation of [`HomeRepository`].

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};

use shems_app::ports::HomeRepository;
use shems_domain::error::ShemsError;
use shems_domain::home::Home;
use shems_domain::id::HomeId;

use crate::codec;
use crate::error::StorageError;
use crate::store::SqliteStore;

struct Wrapper(Home);

impl Wrapper {
    fn maybe(value: Option<Self>) -> Option<Home> {
        value.map(|w| w.0)
    }
}

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: i64 = row.try_get("id")?;

        Ok(Self(Home {
            id: codec::home_id(id)?,
            name: row.try_get("name")?,
            notify_address: row.try_get("notify_address")?,
        }))
    }
}

const INSERT: &str = "INSERT INTO homes (id, name, notify_address) VALUES (?, ?, ?)";
const SELECT_BY_ID: &str = "SELECT * FROM homes WHERE id = ?";
const SELECT_ALL: &str = "SELECT * FROM homes ORDER BY id";

impl HomeRepository for SqliteStore {
    async fn create_home(&self, home: Home) -> Result<Home, ShemsError> {
        sqlx::query(INSERT)
            .bind(i64::from(home.id.get()))
            .bind(&home.name)
            .bind(&home.notify_address)
            .execute(self.pool())
            .await
            .map_err(StorageError::from)?;

        Ok(home)
    }

    async fn get_home(&self, id: HomeId) -> Result<Option<Home>, ShemsError> {
        let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_ID)
            .bind(i64::from(id.get()))
            .fetch_optional(self.pool())
            .await
            .map_err(StorageError::from)?;

        Ok(Wrapper::maybe(row))
    }

    async fn list_homes(&self) -> Result<Vec<Home>, ShemsError> {
        let rows: Vec<Wrapper> = sqlx::query_as(SELECT_ALL)
            .fetch_all(self.pool())
            .await
            .map_err(StorageError::from)?;

        Ok(rows.into_iter().map(|w| w.0).collect())
    }
}
