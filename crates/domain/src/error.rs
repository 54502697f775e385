//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into [`ShemsError`]
//! via `#[from]`. Adapters box their concrete errors into the
//! [`ShemsError::StoreUnavailable`], [`ShemsError::Storage`] or
//! [`ShemsError::Notify`] variants.

/// Boxed error coming from an adapter.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Top-level error type shared by the domain, application and adapter layers.
#[derive(Debug, thiserror::Error)]
pub enum ShemsError {
    /// A domain invariant was violated.
    #[error("validation error")]
    Validation(#[from] ValidationError),

    /// A requested record does not exist.
    #[error("not found")]
    NotFound(#[from] NotFoundError),

    /// A conditional write found the record changed since it was read.
    #[error("write conflict")]
    Conflict(#[from] ConflictError),

    /// The appliance configuration cannot be simulated.
    #[error("configuration error")]
    Config(#[from] ConfigError),

    /// The store could not be reached at all (connection-level failure).
    #[error("store unavailable")]
    StoreUnavailable(#[source] BoxError),

    /// A single read or write against the store failed.
    #[error("storage error")]
    Storage(#[source] BoxError),

    /// A notification could not be delivered.
    #[error("notification failed")]
    Notify(#[source] BoxError),

    /// A bounded operation did not complete in time.
    #[error("{operation} timed out")]
    Timeout {
        /// Name of the operation that timed out.
        operation: &'static str,
    },
}

impl ShemsError {
    /// Whether the error means the store as a whole is unreachable.
    #[must_use]
    pub fn is_store_unavailable(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_))
    }
}

/// Violations of domain invariants.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// A name field was empty.
    #[error("name must not be empty")]
    EmptyName,

    /// A notification address was empty.
    #[error("notification address must not be empty")]
    EmptyNotifyAddress,

    /// A threshold is NaN or infinite.
    #[error("thresholds must be finite numbers")]
    NonFiniteThreshold,

    /// The stop threshold is not below the start threshold.
    #[error("stop value {stop} must be lower than start value {start}")]
    InvertedThresholds {
        /// Configured start threshold.
        start: f64,
        /// Configured stop threshold.
        stop: f64,
    },

    /// A home with this identifier is already registered.
    #[error("home {0} already exists")]
    DuplicateHome(String),

    /// The home already owns an appliance of this class.
    #[error("home {home_id} already has appliance {appliance_id}")]
    DuplicateAppliance {
        /// Owning home.
        home_id: String,
        /// Appliance class identifier.
        appliance_id: String,
    },

    /// An identifier could not be parsed.
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A condition other than `on` / `off` was supplied.
    #[error("invalid condition: {0:?}")]
    InvalidCondition(String),
}

/// A lookup did not find the requested record.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{entity} {id} not found")]
pub struct NotFoundError {
    /// Kind of record (e.g. `"Home"`).
    pub entity: &'static str,
    /// Display form of the missing identifier.
    pub id: String,
}

/// A record no longer matched the state a conditional write expected.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{entity} {id} changed concurrently")]
pub struct ConflictError {
    /// Kind of record (e.g. `"Appliance"`).
    pub entity: &'static str,
    /// Display form of the record identifier.
    pub id: String,
}

/// Configuration problems that make an appliance impossible to simulate.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// No class in the catalog matches the appliance identifier.
    #[error("unknown appliance class {0}")]
    UnknownApplianceClass(u16),
}
