//! # shems-adapter-storage-sqlite-sqlx
//!
//! `SQLite` persistence adapter using [sqlx](https://docs.rs/sqlx).
//!
//! ## Responsibilities
//! - Implement the storage port traits defined in `shems-app::ports::store`
//!   (`ApplianceStore`, `HomeRepository`, `ApplianceRepository`,
//!   `ObservationRepository`) on a single [`SqliteStore`]
//! - Manage `SQLite` connection pool lifecycle
//! - Run database migrations (using sqlx embedded migrations)
//! - Map between domain types and database rows
//!
//! ## Dependency rule
//! Depends on `shems-app` (for port traits) and `shems-domain` (for domain types).
//! The `app` and `domain` crates must never reference this adapter.

mod appliance_repo;
mod codec;
pub mod error;
mod home_repo;
mod observation_repo;
pub mod pool;
mod store;

pub use pool::{Config, Database};
pub use store::SqliteStore;
