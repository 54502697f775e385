//! Helpers shared by the handler tests.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use shems_adapter_storage_sqlite_sqlx::{Config, SqliteStore};
use shems_app::broadcaster::TransitionBroadcaster;
use shems_app::scheduler::Scheduler;
use shems_app::tick::{TickOrchestrator, TickSettings};

use crate::state::AppState;

pub(crate) type TestState = AppState<SqliteStore, TransitionBroadcaster>;

pub(crate) async fn test_state() -> TestState {
    let store = Config::new("sqlite::memory:").build().await.unwrap().store();
    let transitions = TransitionBroadcaster::new(16);
    let orchestrator =
        TickOrchestrator::new(store.clone(), transitions.clone(), TickSettings::default())
            .with_seed(11);
    let scheduler = Arc::new(Scheduler::new(orchestrator, Duration::from_secs(3600)));
    AppState::new(store, scheduler, transitions)
}

/// Send one request and decode the JSON body (`Null` when empty or not JSON).
pub(crate) async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => request
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}

/// Register home 1 with a freezer (class 1) and a refrigerator (class 2).
pub(crate) async fn seed(app: &Router) {
    let (status, _) = send(
        app,
        "POST",
        "/api/homes",
        Some(serde_json::json!({
            "id": 1,
            "name": "Lakeside",
            "notify_address": "owner@example.com"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    for (class, name, condition) in [(1, "Garage freezer", "on"), (2, "Kitchen fridge", "off")] {
        let (status, _) = send(
            app,
            "POST",
            "/api/homes/1/appliances",
            Some(serde_json::json!({
                "appliance_id": class,
                "name": name,
                "condition": condition,
                "start_value": 15.0,
                "stop_value": -15.0
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }
}
