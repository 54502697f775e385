//! Simulation step: hysteresis control plus the per-class energy/output model.
//!
//! [`step`] is a pure function of the appliance configuration, the last
//! observed output and a source of uniform randomness:
//!
//! 1. **Threshold check.** An idle appliance whose output dropped strictly
//!    below `stop_value`, or a running one whose output rose strictly above
//!    `start_value`, flips condition. Values inside the deadband (bounds
//!    included) never flip, and at most one flip happens per step.
//! 2. **Model.** Energy and output drift are drawn from the appliance class
//!    using the condition the appliance had *before* the flip: a running
//!    appliance consumes energy and its output rises, an idle one consumes
//!    nothing and its output falls. The flip only affects later steps.

use rand::Rng;
use serde::Serialize;

use crate::appliance::{ApplianceConfig, Condition};
use crate::error::ConfigError;

/// Result of simulating one appliance for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StepOutcome {
    /// Condition to persist for the next tick.
    pub condition: Condition,
    /// Energy consumed during this tick, in kWh.
    pub energy_consumed: f64,
    /// New output reading.
    pub output: f64,
    /// Whether `condition` differs from the configured one.
    pub transitioned: bool,
}

/// Whether `last_output` lies outside the deadband on the side that flips
/// an appliance currently in `config.condition`.
#[must_use]
pub fn crosses_threshold(config: &ApplianceConfig, last_output: f64) -> bool {
    match config.condition {
        Condition::Off => last_output < config.stop_value,
        Condition::On => last_output > config.start_value,
    }
}

/// Simulate one tick for one appliance.
///
/// # Errors
///
/// Returns [`ConfigError::UnknownApplianceClass`] when the appliance id is
/// not in the catalog.
pub fn step<R: Rng>(
    config: &ApplianceConfig,
    last_output: f64,
    rng: &mut R,
) -> Result<StepOutcome, ConfigError> {
    let class = config.class()?;

    let transitioned = crosses_threshold(config, last_output);
    let condition = if transitioned {
        config.condition.toggled()
    } else {
        config.condition
    };

    let (energy_consumed, delta) = match config.condition {
        Condition::On => (
            class.energy_kwh.sample(rng),
            class.output_delta.sample(rng),
        ),
        Condition::Off => (0.0, -class.output_delta.sample(rng)),
    };

    Ok(StepOutcome {
        condition,
        energy_consumed,
        output: last_output + delta,
        transitioned,
    })
}
