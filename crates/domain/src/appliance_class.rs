//! Appliance-class catalog: the numeric model of every supported device kind.
//!
//! An appliance's [`ApplianceId`] selects one row of [`CATALOG`]. Each row
//! carries the energy drawn per tick while running and the magnitude of the
//! output drift per tick (upwards while running, downwards while idle).
//! Supporting a new kind of appliance means adding a row here.

use rand::Rng;
use serde::Serialize;

use crate::error::ConfigError;
use crate::id::ApplianceId;

/// Closed interval `[low, high]` sampled uniformly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Band {
    pub low: f64,
    pub high: f64,
}

impl Band {
    #[must_use]
    pub const fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    /// Draw a uniform sample from the band.
    pub fn sample<R: Rng>(&self, rng: &mut R) -> f64 {
        rng.gen_range(self.low..=self.high)
    }

    /// Whether `value` lies inside the band (bounds included).
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        value >= self.low && value <= self.high
    }
}

/// Numeric model for one kind of appliance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ApplianceClass {
    pub id: u16,
    pub name: &'static str,
    /// Energy drawn per tick while on, in kWh. Zero while off.
    pub energy_kwh: Band,
    /// Magnitude of the output change per tick.
    pub output_delta: Band,
}

/// Every appliance class the simulation knows about.
pub static CATALOG: &[ApplianceClass] = &[
    ApplianceClass {
        id: 1,
        name: "Freezer",
        energy_kwh: Band::new(0.6, 0.8),
        output_delta: Band::new(2.0, 4.7),
    },
    ApplianceClass {
        id: 2,
        name: "Refrigerator",
        energy_kwh: Band::new(0.02, 0.04),
        output_delta: Band::new(5.0, 6.0),
    },
    ApplianceClass {
        id: 3,
        name: "Air conditioner",
        energy_kwh: Band::new(0.0007, 0.001),
        output_delta: Band::new(4.0, 5.7),
    },
];

impl ApplianceClass {
    /// Find the catalog row for an appliance identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownApplianceClass`] when no row matches.
    pub fn lookup(id: ApplianceId) -> Result<&'static Self, ConfigError> {
        CATALOG
            .iter()
            .find(|class| class.id == id.get())
            .ok_or(ConfigError::UnknownApplianceClass(id.get()))
    }
}
