//! JSON REST handlers for the appliances of a home.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use shems_app::ports::{Notifier, Store};
use shems_domain::appliance::{ApplianceConfig, Condition};
use shems_domain::id::ApplianceId;
use shems_domain::observation::Observation;

use crate::api::{parse_appliance_key, parse_home_id};
use crate::error::ApiError;
use crate::state::AppState;

/// Number of observations returned when the query does not say.
const DEFAULT_HISTORY_LIMIT: usize = 100;

/// Request body for adding an appliance to a home.
#[derive(Deserialize)]
pub struct CreateApplianceRequest {
    pub appliance_id: u16,
    pub name: String,
    #[serde(default)]
    pub condition: Condition,
    pub start_value: f64,
    pub stop_value: f64,
}

#[derive(Deserialize)]
pub struct SetConditionRequest {
    pub condition: Condition,
}

#[derive(Deserialize)]
pub struct UpdateThresholdsRequest {
    pub start_value: f64,
    pub stop_value: f64,
}

#[derive(Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
}

/// Possible responses from the create endpoint.
pub enum CreateResponse {
    Created(Json<ApplianceConfig>),
}

impl IntoResponse for CreateResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Created(json) => (StatusCode::CREATED, json).into_response(),
        }
    }
}

/// Possible responses from the delete endpoint.
pub enum DeleteResponse {
    NoContent,
}

impl IntoResponse for DeleteResponse {
    fn into_response(self) -> Response {
        match self {
            Self::NoContent => StatusCode::NO_CONTENT.into_response(),
        }
    }
}

/// `GET /api/homes/{home_id}/appliances`
pub async fn list<S, N>(
    State(state): State<AppState<S, N>>,
    Path(home_id): Path<String>,
) -> Result<Json<Vec<ApplianceConfig>>, ApiError>
where
    S: Store + 'static,
    N: Notifier + 'static,
{
    let home_id = parse_home_id(&home_id)?;
    let appliances = state.appliance_service.list_appliances(home_id).await?;
    Ok(Json(appliances))
}

/// `GET /api/homes/{home_id}/appliances/{appliance_id}`
pub async fn get<S, N>(
    State(state): State<AppState<S, N>>,
    Path((home_id, appliance_id)): Path<(String, String)>,
) -> Result<Json<ApplianceConfig>, ApiError>
where
    S: Store + 'static,
    N: Notifier + 'static,
{
    let (home_id, appliance_id) = parse_appliance_key(&home_id, &appliance_id)?;
    let config = state
        .appliance_service
        .get_appliance(home_id, appliance_id)
        .await?;
    Ok(Json(config))
}

/// `POST /api/homes/{home_id}/appliances`
pub async fn create<S, N>(
    State(state): State<AppState<S, N>>,
    Path(home_id): Path<String>,
    Json(req): Json<CreateApplianceRequest>,
) -> Result<CreateResponse, ApiError>
where
    S: Store + 'static,
    N: Notifier + 'static,
{
    let config = ApplianceConfig::builder()
        .home_id(parse_home_id(&home_id)?)
        .appliance_id(ApplianceId::new(req.appliance_id)?)
        .name(req.name)
        .condition(req.condition)
        .thresholds(req.start_value, req.stop_value)
        .build()?;
    let created = state.appliance_service.add_appliance(config).await?;
    Ok(CreateResponse::Created(Json(created)))
}

/// `DELETE /api/homes/{home_id}/appliances/{appliance_id}`
pub async fn delete<S, N>(
    State(state): State<AppState<S, N>>,
    Path((home_id, appliance_id)): Path<(String, String)>,
) -> Result<DeleteResponse, ApiError>
where
    S: Store + 'static,
    N: Notifier + 'static,
{
    let (home_id, appliance_id) = parse_appliance_key(&home_id, &appliance_id)?;
    state
        .appliance_service
        .remove_appliance(home_id, appliance_id)
        .await?;
    Ok(DeleteResponse::NoContent)
}

/// `PUT /api/homes/{home_id}/appliances/{appliance_id}/condition`
pub async fn set_condition<S, N>(
    State(state): State<AppState<S, N>>,
    Path((home_id, appliance_id)): Path<(String, String)>,
    Json(req): Json<SetConditionRequest>,
) -> Result<Json<ApplianceConfig>, ApiError>
where
    S: Store + 'static,
    N: Notifier + 'static,
{
    let (home_id, appliance_id) = parse_appliance_key(&home_id, &appliance_id)?;
    let config = state
        .appliance_service
        .set_condition(home_id, appliance_id, req.condition)
        .await?;
    Ok(Json(config))
}

/// `PUT /api/homes/{home_id}/appliances/{appliance_id}/thresholds`
pub async fn update_thresholds<S, N>(
    State(state): State<AppState<S, N>>,
    Path((home_id, appliance_id)): Path<(String, String)>,
    Json(req): Json<UpdateThresholdsRequest>,
) -> Result<Json<ApplianceConfig>, ApiError>
where
    S: Store + 'static,
    N: Notifier + 'static,
{
    let (home_id, appliance_id) = parse_appliance_key(&home_id, &appliance_id)?;
    let config = state
        .appliance_service
        .update_thresholds(home_id, appliance_id, req.start_value, req.stop_value)
        .await?;
    Ok(Json(config))
}

/// `GET /api/homes/{home_id}/appliances/{appliance_id}/observations?limit=N`
///
/// Newest first.
pub async fn observations<S, N>(
    State(state): State<AppState<S, N>>,
    Path((home_id, appliance_id)): Path<(String, String)>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<Observation>>, ApiError>
where
    S: Store + 'static,
    N: Notifier + 'static,
{
    let (home_id, appliance_id) = parse_appliance_key(&home_id, &appliance_id)?;
    let history = state
        .appliance_service
        .observations(
            home_id,
            appliance_id,
            query.limit.unwrap_or(DEFAULT_HISTORY_LIMIT),
        )
        .await?;
    Ok(Json(history))
}
