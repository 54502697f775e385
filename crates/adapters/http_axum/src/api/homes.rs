//! JSON REST handlers for homes.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use shems_app::ports::{Notifier, Store};
use shems_domain::home::Home;
use shems_domain::id::HomeId;

use crate::api::parse_home_id;
use crate::error::ApiError;
use crate::state::AppState;

/// Request body for registering a home.
#[derive(Deserialize)]
pub struct CreateHomeRequest {
    pub id: u32,
    pub name: String,
    pub notify_address: String,
}

/// Possible responses from the create endpoint.
pub enum CreateResponse {
    Created(Json<Home>),
}

impl IntoResponse for CreateResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Created(json) => (StatusCode::CREATED, json).into_response(),
        }
    }
}

/// Derived energy total of one home.
#[derive(Serialize)]
pub struct EnergyBody {
    pub home_id: HomeId,
    pub energy_consumed_kwh: f64,
}

/// `GET /api/homes`
pub async fn list<S, N>(State(state): State<AppState<S, N>>) -> Result<Json<Vec<Home>>, ApiError>
where
    S: Store + 'static,
    N: Notifier + 'static,
{
    let homes = state.home_service.list_homes().await?;
    Ok(Json(homes))
}

/// `GET /api/homes/{home_id}`
pub async fn get<S, N>(
    State(state): State<AppState<S, N>>,
    Path(home_id): Path<String>,
) -> Result<Json<Home>, ApiError>
where
    S: Store + 'static,
    N: Notifier + 'static,
{
    let home = state.home_service.get_home(parse_home_id(&home_id)?).await?;
    Ok(Json(home))
}

/// `POST /api/homes`
pub async fn create<S, N>(
    State(state): State<AppState<S, N>>,
    Json(req): Json<CreateHomeRequest>,
) -> Result<CreateResponse, ApiError>
where
    S: Store + 'static,
    N: Notifier + 'static,
{
    let home = Home::builder()
        .id(HomeId::new(req.id)?)
        .name(req.name)
        .notify_address(req.notify_address)
        .build()?;
    let created = state.home_service.register_home(home).await?;
    Ok(CreateResponse::Created(Json(created)))
}

/// `GET /api/homes/{home_id}/energy`
pub async fn energy<S, N>(
    State(state): State<AppState<S, N>>,
    Path(home_id): Path<String>,
) -> Result<Json<EnergyBody>, ApiError>
where
    S: Store + 'static,
    N: Notifier + 'static,
{
    let home_id = parse_home_id(&home_id)?;
    let total = state.appliance_service.home_energy_total(home_id).await?;
    Ok(Json(EnergyBody {
        home_id,
        energy_consumed_kwh: total,
    }))
}
