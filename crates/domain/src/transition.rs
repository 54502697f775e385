//! Transition event: raised when the control loop flips an appliance.
//!
//! Transition events are ephemeral: they are handed to the notifier once and
//! never persisted.

use serde::{Deserialize, Serialize};

use crate::appliance::{ApplianceConfig, Condition};
use crate::id::{ApplianceId, HomeId, TransitionId};
use crate::time::Timestamp;

/// An on/off flip of one appliance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionEvent {
    pub id: TransitionId,
    pub home_id: HomeId,
    pub appliance_id: ApplianceId,
    pub appliance_name: String,
    pub old_condition: Condition,
    pub new_condition: Condition,
    /// Notification destination of the owning home, if known.
    pub recipient: Option<String>,
    pub occurred_at: Timestamp,
}

impl TransitionEvent {
    /// Describe the flip of `config` to `new_condition`.
    #[must_use]
    pub fn new(config: &ApplianceConfig, new_condition: Condition, occurred_at: Timestamp) -> Self {
        Self {
            id: TransitionId::new(),
            home_id: config.home_id,
            appliance_id: config.appliance_id,
            appliance_name: config.name.clone(),
            old_condition: config.condition,
            new_condition,
            recipient: config.notify_address.clone(),
            occurred_at,
        }
    }

    /// Attach the notification destination.
    #[must_use]
    pub fn with_recipient(mut self, recipient: impl Into<String>) -> Self {
        self.recipient = Some(recipient.into());
        self
    }

    /// Subject line used by message-based notifiers.
    #[must_use]
    pub fn subject(&self) -> String {
        format!("SHEMS - Appliance Condition Update: {}", self.appliance_name)
    }

    /// One-line human readable description.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "{} switched from {} to {}",
            self.appliance_name,
            upper(self.old_condition),
            upper(self.new_condition)
        )
    }
}

fn upper(condition: Condition) -> &'static str {
    match condition {
        Condition::On => "ON",
        Condition::Off => "OFF",
    }
}
