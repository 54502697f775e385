//! Time and timestamp helpers.

use chrono::{DateTime, Utc};

/// UTC timestamp used for observations and transition events.
pub type Timestamp = DateTime<Utc>;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

/// Return `now`, unless `previous` lies ahead of it.
///
/// Keeps a per-appliance series non-decreasing when the wall clock steps
/// backwards between two samples.
#[must_use]
pub fn not_before(now: Timestamp, previous: Option<Timestamp>) -> Timestamp {
    match previous {
        Some(prev) if prev > now => prev,
        _ => now,
    }
}
