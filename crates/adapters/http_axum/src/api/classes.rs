//! Catalog of supported appliance classes.

use axum::Json;

use shems_domain::appliance_class::{ApplianceClass, CATALOG};

/// `GET /api/appliance-classes`
pub async fn list() -> Json<&'static [ApplianceClass]> {
    Json(CATALOG)
}
