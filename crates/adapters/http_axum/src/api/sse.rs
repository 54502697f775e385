//! Server-Sent Events (SSE) stream of appliance transitions.

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;

use shems_app::ports::{Notifier, Store};

use crate::state::AppState;

/// `GET /api/transitions/stream`: SSE stream of condition changes.
///
/// Subscribes to the transition broadcaster and sends JSON-encoded
/// [`TransitionEvent`](shems_domain::transition::TransitionEvent)s as
/// `transition` frames. The stream continues until the client disconnects.
pub async fn stream<S, N>(
    State(state): State<AppState<S, N>>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, std::convert::Infallible>>>
where
    S: Store + 'static,
    N: Notifier + 'static,
{
    let rx = state.transitions.subscribe();
    let events = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(transition) => match serde_json::to_string(&transition) {
            Ok(json) => Some(Ok(Event::default().event("transition").data(json))),
            Err(err) => {
                tracing::warn!(%err, "failed to serialize transition for SSE stream");
                None
            }
        },
        Err(BroadcastStreamRecvError::Lagged(n)) => {
            tracing::warn!(skipped = n, "SSE subscriber lagged, some transitions were dropped");
            None
        }
    });

    Sse::new(events).keep_alive(KeepAlive::default())
}
