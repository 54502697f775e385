//! Home service: use-cases for managing homes.

use shems_domain::error::{NotFoundError, ShemsError, ValidationError};
use shems_domain::home::Home;
use shems_domain::id::HomeId;

use crate::ports::HomeRepository;

/// Application service for home registration and lookup.
pub struct HomeService<R> {
    repo: R,
}

impl<R: HomeRepository> HomeService<R> {
    /// Create a new service backed by the given repository.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Register a new home after validating domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`ShemsError::Validation`] if invariants fail or the id is
    /// already taken, or a storage error propagated from the repository.
    #[tracing::instrument(skip(self, home), fields(home_id = %home.id))]
    pub async fn register_home(&self, home: Home) -> Result<Home, ShemsError> {
        home.validate()?;
        if self.repo.get_home(home.id).await?.is_some() {
            return Err(ValidationError::DuplicateHome(home.id.to_string()).into());
        }
        self.repo.create_home(home).await
    }

    /// Look up a home by id, returning an error if not found.
    ///
    /// # Errors
    ///
    /// Returns [`ShemsError::NotFound`] when no home with `id` exists,
    /// or a storage error from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn get_home(&self, id: HomeId) -> Result<Home, ShemsError> {
        self.repo.get_home(id).await?.ok_or_else(|| {
            NotFoundError {
                entity: "Home",
                id: id.to_string(),
            }
            .into()
        })
    }

    /// List all homes.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn list_homes(&self) -> Result<Vec<Home>, ShemsError> {
        self.repo.list_homes().await
    }
}
