//! JSON API handler modules.

#[allow(clippy::missing_errors_doc)]
pub mod appliances;
pub mod classes;
#[allow(clippy::missing_errors_doc)]
pub mod homes;
pub mod simulate;
pub mod sse;

use axum::Router;
use axum::routing::{get, put};

use shems_app::ports::{Notifier, Store};
use shems_domain::id::{ApplianceId, HomeId};

use crate::error::ApiError;
use crate::state::AppState;

/// Routes mounted under `/api`.
pub fn routes<S, N>() -> Router<AppState<S, N>>
where
    S: Store + 'static,
    N: Notifier + 'static,
{
    Router::new()
        // Control loop
        .route(
            "/simulate",
            get(simulate::run::<S, N>).post(simulate::run::<S, N>),
        )
        .route("/simulate/stats", get(simulate::stats::<S, N>))
        .route("/transitions/stream", get(sse::stream::<S, N>))
        .route("/appliance-classes", get(classes::list))
        // Homes
        .route(
            "/homes",
            get(homes::list::<S, N>).post(homes::create::<S, N>),
        )
        .route("/homes/{home_id}", get(homes::get::<S, N>))
        .route("/homes/{home_id}/energy", get(homes::energy::<S, N>))
        // Appliances
        .route(
            "/homes/{home_id}/appliances",
            get(appliances::list::<S, N>).post(appliances::create::<S, N>),
        )
        .route(
            "/homes/{home_id}/appliances/{appliance_id}",
            get(appliances::get::<S, N>).delete(appliances::delete::<S, N>),
        )
        .route(
            "/homes/{home_id}/appliances/{appliance_id}/condition",
            put(appliances::set_condition::<S, N>),
        )
        .route(
            "/homes/{home_id}/appliances/{appliance_id}/thresholds",
            put(appliances::update_thresholds::<S, N>),
        )
        .route(
            "/homes/{home_id}/appliances/{appliance_id}/observations",
            get(appliances::observations::<S, N>),
        )
}

fn parse_home_id(raw: &str) -> Result<HomeId, ApiError> {
    Ok(raw.parse()?)
}

fn parse_appliance_key(
    home_id: &str,
    appliance_id: &str,
) -> Result<(HomeId, ApplianceId), ApiError> {
    Ok((parse_home_id(home_id)?, appliance_id.parse()?))
}
