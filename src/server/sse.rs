// server/sse.rs — Per-user change feed.
//
// GET /tasks/{email}/events
//
// Emits one `revision` event immediately so late subscribers learn the
// current counter, then forwards every bump for that user from the
// store's broadcast channel. Lagged receivers just skip ahead; the next
// bump carries the latest revision anyway.

use axum::{
    extract::{Path, State},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse,
    },
};
use futures_util::stream;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

use super::ServerState;

pub async fn task_events_sse(
    State(state): State<Arc<ServerState>>,
    Path(email): Path<String>,
) -> impl IntoResponse {
    let rx = state.store.subscribe_changes();
    let current = state.store.revision(&email).await;

    let initial = stream::once(async move {
        Ok::<Event, std::convert::Infallible>(revision_event(current))
    });

    let bumps = stream::unfold((rx, email), move |(mut rx, email)| async move {
        loop {
            match rx.recv().await {
                Ok(bump) if bump.email == email => {
                    return Some((
                        Ok::<Event, std::convert::Infallible>(revision_event(bump.revision)),
                        (rx, email),
                    ));
                }
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    });

    let s = futures_util::StreamExt::chain(initial, bumps);

    Sse::new(s).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

fn revision_event(revision: u64) -> Event {
    Event::default()
        .event("revision")
        .data(json!({ "revision": revision }).to_string())
}
