//! # shems-app
//!
//! Application layer: the control loop, use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `ApplianceStore`: what one tick reads and writes
//!   - `HomeRepository` / `ApplianceRepository` / `ObservationRepository`: management CRUD
//!   - `Notifier`: delivery of condition changes
//! - Run the control loop:
//!   - `TickOrchestrator`: one pass over every appliance
//!   - `Scheduler`: periodic and on-demand ticks, never overlapping
//! - Define **driving/inbound ports** as use-case structs:
//!   - `HomeService`: register, list, get
//!   - `ApplianceService`: add, override, re-threshold, remove, history
//! - Provide **in-process infrastructure** (transition broadcaster) that doesn't need IO
//!
//! ## Dependency rule
//! Depends on `shems-domain` only (plus `tokio` for timers, channels and tasks).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod broadcaster;
pub mod ports;
pub mod scheduler;
pub mod services;
pub mod tick;

#[cfg(test)]
pub(crate) mod fakes;
