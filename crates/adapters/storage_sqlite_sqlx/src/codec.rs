//! Conversions between column values and domain types.

use chrono::SecondsFormat;

use shems_domain::appliance::Condition;
use shems_domain::id::{ApplianceId, HomeId};
use shems_domain::time::Timestamp;

fn decode_error(err: impl std::error::Error + Send + Sync + 'static) -> sqlx::Error {
    sqlx::Error::Decode(Box::new(err))
}

pub(crate) fn home_id(raw: i64) -> Result<HomeId, sqlx::Error> {
    let raw = u32::try_from(raw).map_err(decode_error)?;
    HomeId::new(raw).map_err(decode_error)
}

pub(crate) fn appliance_id(raw: i64) -> Result<ApplianceId, sqlx::Error> {
    let raw = u16::try_from(raw).map_err(decode_error)?;
    ApplianceId::new(raw).map_err(decode_error)
}

pub(crate) fn condition(raw: &str) -> Result<Condition, sqlx::Error> {
    raw.parse().map_err(decode_error)
}

pub(crate) fn timestamp(raw: &str) -> Result<Timestamp, sqlx::Error> {
    Ok(chrono::DateTime::parse_from_rfc3339(raw)
        .map_err(decode_error)?
        .to_utc())
}

/// Fixed-width RFC 3339 so that stored values keep full precision.
pub(crate) fn format_timestamp(value: Timestamp) -> String {
    value.to_rfc3339_opts(SecondsFormat::Nanos, true)
}
