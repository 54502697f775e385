//! Appliance: one controllable device of a given class inside one home.
//!
//! A home owns at most one appliance per class, so `(home_id, appliance_id)`
//! identifies an appliance. Its condition is flipped by the control loop
//! whenever the last observed output leaves the `[stop_value, start_value]`
//! deadband, and may be overridden by the owner.

use serde::{Deserialize, Serialize};

use crate::appliance_class::ApplianceClass;
use crate::error::{ConfigError, ShemsError, ValidationError};
use crate::id::{ApplianceId, HomeId};

/// On/off condition of an appliance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Condition {
    On,
    #[default]
    Off,
}

impl Condition {
    /// The opposite condition.
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::On => Self::Off,
            Self::Off => Self::On,
        }
    }

    #[must_use]
    pub fn is_on(self) -> bool {
        matches!(self, Self::On)
    }
}

impl From<bool> for Condition {
    fn from(on: bool) -> Self {
        if on { Self::On } else { Self::Off }
    }
}

impl From<Condition> for bool {
    fn from(condition: Condition) -> Self {
        condition.is_on()
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::On => f.write_str("on"),
            Self::Off => f.write_str("off"),
        }
    }
}

impl std::str::FromStr for Condition {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "on" => Ok(Self::On),
            "off" => Ok(Self::Off),
            other => Err(ValidationError::InvalidCondition(other.to_string())),
        }
    }
}

/// Configuration and current condition of one appliance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplianceConfig {
    pub home_id: HomeId,
    pub appliance_id: ApplianceId,
    pub name: String,
    pub condition: Condition,
    /// Upper threshold: a running appliance switches off above it.
    pub start_value: f64,
    /// Lower threshold: an idle appliance switches on below it.
    pub stop_value: f64,
    /// Notification destination of the owning home, when the store joined it in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notify_address: Option<String>,
}

impl ApplianceConfig {
    /// Create a builder for constructing an [`ApplianceConfig`].
    #[must_use]
    pub fn builder() -> ApplianceConfigBuilder {
        ApplianceConfigBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`ShemsError::Validation`] when the name is empty, a
    /// threshold is not finite, or `stop_value >= start_value`.
    pub fn validate(&self) -> Result<(), ShemsError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        validate_thresholds(self.start_value, self.stop_value)?;
        Ok(())
    }

    /// The catalog row driving this appliance's numeric model.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownApplianceClass`] for ids missing from
    /// the catalog.
    pub fn class(&self) -> Result<&'static ApplianceClass, ConfigError> {
        ApplianceClass::lookup(self.appliance_id)
    }
}

/// Check a `(start, stop)` threshold pair.
///
/// # Errors
///
/// Returns [`ValidationError::NonFiniteThreshold`] or
/// [`ValidationError::InvertedThresholds`].
pub fn validate_thresholds(start_value: f64, stop_value: f64) -> Result<(), ValidationError> {
    if !start_value.is_finite() || !stop_value.is_finite() {
        return Err(ValidationError::NonFiniteThreshold);
    }
    if stop_value >= start_value {
        return Err(ValidationError::InvertedThresholds {
            start: start_value,
            stop: stop_value,
        });
    }
    Ok(())
}

/// Step-by-step builder for [`ApplianceConfig`].
#[derive(Debug, Default)]
pub struct ApplianceConfigBuilder {
    home_id: Option<HomeId>,
    appliance_id: Option<ApplianceId>,
    name: Option<String>,
    condition: Condition,
    start_value: Option<f64>,
    stop_value: Option<f64>,
    notify_address: Option<String>,
}

impl ApplianceConfigBuilder {
    #[must_use]
    pub fn home_id(mut self, home_id: HomeId) -> Self {
        self.home_id = Some(home_id);
        self
    }

    #[must_use]
    pub fn appliance_id(mut self, appliance_id: ApplianceId) -> Self {
        self.appliance_id = Some(appliance_id);
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn condition(mut self, condition: Condition) -> Self {
        self.condition = condition;
        self
    }

    #[must_use]
    pub fn thresholds(mut self, start_value: f64, stop_value: f64) -> Self {
        self.start_value = Some(start_value);
        self.stop_value = Some(stop_value);
        self
    }

    #[must_use]
    pub fn notify_address(mut self, address: impl Into<String>) -> Self {
        self.notify_address = Some(address.into());
        self
    }

    /// Consume the builder, validate, and return an [`ApplianceConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`ShemsError::Validation`] if an id or threshold is missing,
    /// or if the resulting configuration is invalid.
    pub fn build(self) -> Result<ApplianceConfig, ShemsError> {
        let home_id = self
            .home_id
            .ok_or_else(|| ValidationError::InvalidId("home id is required".to_string()))?;
        let appliance_id = self
            .appliance_id
            .ok_or_else(|| ValidationError::InvalidId("appliance id is required".to_string()))?;
        let config = ApplianceConfig {
            home_id,
            appliance_id,
            name: self.name.unwrap_or_default(),
            condition: self.condition,
            start_value: self.start_value.unwrap_or(f64::NAN),
            stop_value: self.stop_value.unwrap_or(f64::NAN),
            notify_address: self.notify_address,
        };
        config.validate()?;
        Ok(config)
    }
}
