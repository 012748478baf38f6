use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
    Router,
};
use futures::stream::{self, Stream};
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};

use super::AppState;
use crate::types::DashboardEvent;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/events", get(events))
}

/// GET /api/events — server-sent dashboard events.
async fn events(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let rx = state.poller.store().subscribe();
    Sse::new(event_stream(rx)).keep_alive(KeepAlive::default())
}

/// Turns a broadcast receiver into an SSE stream named by event type.
///
/// Lagging clients skip what they missed; the stream ends when the store goes away.
fn event_stream(
    rx: broadcast::Receiver<DashboardEvent>,
) -> impl Stream<Item = Result<Event, axum::Error>> {
    stream::unfold(rx, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    let sse = Event::default()
                        .id(event.id().to_string())
                        .event(event.event_type())
                        .json_data(&event);
                    return Some((sse, rx));
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "Event subscriber lagged");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    })
}
