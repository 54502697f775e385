//! Storage-specific error type wrapping sqlx errors.

use shems_domain::error::ShemsError;

/// Errors originating from the `SQLite` storage layer.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// A query or connection failed.
    #[error("database error")]
    Database(#[from] sqlx::Error),

    /// Failed to run migrations.
    #[error("migration error")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl StorageError {
    /// Whether the failure concerns the connection rather than one query.
    #[must_use]
    pub fn is_connection_failure(&self) -> bool {
        matches!(
            self,
            Self::Database(
                sqlx::Error::PoolTimedOut
                    | sqlx::Error::PoolClosed
                    | sqlx::Error::Io(_)
                    | sqlx::Error::Tls(_)
                    | sqlx::Error::WorkerCrashed
            )
        )
    }
}

impl From<StorageError> for ShemsError {
    fn from(err: StorageError) -> Self {
        if err.is_connection_failure() {
            Self::StoreUnavailable(Box::new(err))
        } else {
            Self::Storage(Box::new(err))
        }
    }
}
