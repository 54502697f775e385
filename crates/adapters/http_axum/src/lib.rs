//! # shems-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Serve a **JSON API** for programmatic access
//!   (`/api/simulate`, `/api/homes`, `/api/homes/{home_id}/appliances`, …)
//! - Trigger a tick on demand through the shared scheduler, so an HTTP
//!   trigger never overlaps a scheduled tick
//! - Stream appliance transitions as Server-Sent Events
//! - Map HTTP requests into application service calls (driving adapter)
//! - Map application results into HTTP responses
//!
//! ## Dependency rule
//! Depends on `shems-app` (for port traits, services and the scheduler) and
//! `shems-domain` (for domain types used in request/response mapping). Never
//! leaks axum types into the domain.

pub mod api;
pub mod error;
pub mod router;
pub mod state;

#[cfg(test)]
pub(crate) mod test_support;
