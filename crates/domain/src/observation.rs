//! Observation: one immutable time-series sample of an appliance.
//!
//! Observations are appended once per appliance per tick and never mutated.
//! The newest one is the authoritative current state of its appliance.

use serde::{Deserialize, Serialize};

use crate::id::{ApplianceId, HomeId};
use crate::time::Timestamp;

/// A sample of energy use and output for one appliance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub home_id: HomeId,
    pub appliance_id: ApplianceId,
    pub recorded_at: Timestamp,
    /// Energy consumed during the tick that produced this sample, in kWh.
    pub energy_consumed: f64,
    /// Output reading (temperature for the built-in classes).
    pub output: f64,
}

impl Observation {
    /// Create a new observation.
    #[must_use]
    pub fn new(
        home_id: HomeId,
        appliance_id: ApplianceId,
        recorded_at: Timestamp,
        energy_consumed: f64,
        output: f64,
    ) -> Self {
        Self {
            home_id,
            appliance_id,
            recorded_at,
            energy_consumed,
            output,
        }
    }
}

/// Output reading to simulate from when an appliance has no history yet.
pub const INITIAL_OUTPUT: f64 = 0.0;

/// Output of the latest observation, or [`INITIAL_OUTPUT`] for a new appliance.
#[must_use]
pub fn last_output(last: Option<&Observation>) -> f64 {
    last.map_or(INITIAL_OUTPUT, |obs| obs.output)
}
