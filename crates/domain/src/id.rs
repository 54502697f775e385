//! Typed identifier newtypes.
//!
//! Homes and appliance classes are addressed by small positive integers
//! (that is what the owners type into forms and what the catalog is keyed
//! on). Transition events get random UUIDs.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

macro_rules! define_numeric_id {
    ($(#[doc = $doc:expr])* $name:ident($inner:ty, $serde_inner:tt)) => {
        $(#[doc = $doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = $serde_inner, into = $serde_inner)]
        pub struct $name($inner);

        impl $name {
            /// Wrap a raw value, rejecting zero.
            ///
            /// # Errors
            ///
            /// Returns [`ValidationError::InvalidId`] when `value` is zero.
            pub fn new(value: $inner) -> Result<Self, ValidationError> {
                if value == 0 {
                    return Err(ValidationError::InvalidId(format!(
                        "{} must be positive",
                        stringify!($name)
                    )));
                }
                Ok(Self(value))
            }

            /// Access the raw value.
            #[must_use]
            pub fn get(self) -> $inner {
                self.0
            }
        }

        impl TryFrom<$inner> for $name {
            type Error = ValidationError;

            fn try_from(value: $inner) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for $inner {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let value: $inner = s
                    .parse()
                    .map_err(|_| ValidationError::InvalidId(s.to_string()))?;
                Self::new(value)
            }
        }
    };
}

define_numeric_id!(
    /// Identifier of a [`Home`](crate::home::Home).
    HomeId(u32, "u32")
);

define_numeric_id!(
    /// Identifier of an appliance class (freezer, refrigerator, …).
    ///
    /// Together with a [`HomeId`] it identifies one appliance instance.
    ApplianceId(u16, "u16")
);

/// Unique identifier for a [`TransitionEvent`](crate::transition::TransitionEvent).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransitionId(uuid::Uuid);

impl Default for TransitionId {
    fn default() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl TransitionId {
    /// Generate a new random identifier.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Access the inner UUID.
    #[must_use]
    pub fn as_uuid(self) -> uuid::Uuid {
        self.0
    }
}

impl fmt::Display for TransitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
