//! Axum router assembly.

use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use shems_app::ports::{Notifier, Store};

use crate::state::AppState;

/// Build the top-level axum [`Router`].
///
/// Nests API routes under `/api` and includes a [`TraceLayer`] that logs each
/// HTTP request/response at the `DEBUG` level using the `tracing` ecosystem.
pub fn build<S, N>(state: AppState<S, N>) -> Router
where
    S: Store + 'static,
    N: Notifier + 'static,
{
    Router::new()
        .route("/health", get(health_check))
        .nest("/api", crate::api::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{send, test_state};
    use axum::http::StatusCode;

    #[tokio::test]
    async fn should_return_ok_when_health_check_called() {
        let app = build(test_state().await);
        let (status, _) = send(&app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn should_return_not_found_for_unknown_route() {
        let app = build(test_state().await);
        let (status, _) = send(&app, "GET", "/api/nothing-here", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
