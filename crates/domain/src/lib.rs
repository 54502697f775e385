//! # shems-domain
//!
//! Pure domain model for the shems home energy-monitoring system.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define **Homes** (owners of appliances and of a notification address)
//! - Define **Appliances** (one controllable device of a known class per home)
//! - Define the **appliance-class catalog** (energy and output models as data)
//! - Define **Observations** (immutable time-series samples)
//! - Define **Transitions** (on/off flips raised by the control loop)
//! - Compute one **simulation step** for an appliance (hysteresis control)
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod appliance;
pub mod appliance_class;
pub mod home;
pub mod observation;
pub mod simulation;
pub mod transition;
