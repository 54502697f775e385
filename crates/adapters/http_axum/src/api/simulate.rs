//! On-demand simulation trigger.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use shems_app::ports::{Notifier, Store};
use shems_app::scheduler::TickStatsSnapshot;
use shems_app::tick::{TickError, TickReport};

use crate::error::ErrorBody;
use crate::state::AppState;

/// Body of a successful trigger.
#[derive(Serialize)]
pub struct SimulateBody {
    pub message: &'static str,
    pub report: TickReport,
}

/// Possible responses from the trigger endpoint.
pub enum SimulateResponse {
    Ok(Json<SimulateBody>),
    /// Another tick is in flight.
    Conflict,
    /// The tick aborted.
    Failed(TickError),
}

impl IntoResponse for SimulateResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
            Self::Conflict => (
                StatusCode::CONFLICT,
                Json(ErrorBody {
                    error: TickError::AlreadyRunning.to_string(),
                }),
            )
                .into_response(),
            Self::Failed(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody {
                    error: err.to_string(),
                }),
            )
                .into_response(),
        }
    }
}

/// `GET|POST /api/simulate`: run one tick now.
pub async fn run<S, N>(State(state): State<AppState<S, N>>) -> SimulateResponse
where
    S: Store + 'static,
    N: Notifier + 'static,
{
    match state.scheduler.trigger().await {
        Ok(report) => SimulateResponse::Ok(Json(SimulateBody {
            message: "Simulation ran successfully",
            report,
        })),
        Err(TickError::AlreadyRunning) => SimulateResponse::Conflict,
        Err(err) => {
            tracing::error!(error = ?err, "on-demand tick failed");
            SimulateResponse::Failed(err)
        }
    }
}

/// Tick counters plus the configured period.
#[derive(Serialize)]
pub struct StatsBody {
    pub period_secs: u64,
    #[serde(flatten)]
    pub stats: TickStatsSnapshot,
}

/// `GET /api/simulate/stats`
pub async fn stats<S, N>(State(state): State<AppState<S, N>>) -> Json<StatsBody>
where
    S: Store + 'static,
    N: Notifier + 'static,
{
    Json(StatsBody {
        period_secs: state.scheduler.period().as_secs(),
        stats: state.scheduler.stats(),
    })
}
