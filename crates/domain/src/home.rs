//! Home: the owner of appliances and the destination of their notifications.

use serde::{Deserialize, Serialize};

use crate::error::{ShemsError, ValidationError};
use crate::id::HomeId;

/// A registered home.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Home {
    pub id: HomeId,
    pub name: String,
    /// Opaque destination for condition-change notifications (an e-mail
    /// address in the default deployment).
    pub notify_address: String,
}

impl Home {
    /// Create a builder for constructing a [`Home`].
    #[must_use]
    pub fn builder() -> HomeBuilder {
        HomeBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`ShemsError::Validation`] when `name` or `notify_address`
    /// is empty.
    pub fn validate(&self) -> Result<(), ShemsError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        if self.notify_address.trim().is_empty() {
            return Err(ValidationError::EmptyNotifyAddress.into());
        }
        Ok(())
    }
}

/// Step-by-step builder for [`Home`].
#[derive(Debug, Default)]
pub struct HomeBuilder {
    id: Option<HomeId>,
    name: Option<String>,
    notify_address: Option<String>,
}

impl HomeBuilder {
    #[must_use]
    pub fn id(mut self, id: HomeId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn notify_address(mut self, address: impl Into<String>) -> Self {
        self.notify_address = Some(address.into());
        self
    }

    /// Consume the builder, validate, and return a [`Home`].
    ///
    /// # Errors
    ///
    /// Returns [`ShemsError::Validation`] if the id is missing or a field
    /// is empty.
    pub fn build(self) -> Result<Home, ShemsError> {
        let id = self
            .id
            .ok_or_else(|| ValidationError::InvalidId("home id is required".to_string()))?;
        let home = Home {
            id,
            name: self.name.unwrap_or_default(),
            notify_address: self.notify_address.unwrap_or_default(),
        };
        home.validate()?;
        Ok(home)
    }
}
