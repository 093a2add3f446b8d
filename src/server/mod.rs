// server/mod.rs — Development backend.
//
// Axum HTTP server speaking the same REST dialect as the hosted backend,
// with an in-memory store and a per-user SSE change feed. Exists so the
// client library, CLI, and tests have something real to talk to.
//
// Endpoints:
//   POST   /tasks
//   GET    /tasks/{email}
//   PATCH  /tasks/{email}          (positional: a task id, not an email)
//   DELETE /tasks/{email}          (positional: a task id, not an email)
//   GET    /tasks/{email}/events   (SSE)
//   POST   /users
//   GET    /users/{email}
//   PATCH  /users/{email}
//   GET    /health

pub mod routes;
pub mod seed;
pub mod sse;
pub mod store;

use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

use store::MemoryStore;

pub const DEFAULT_PORT: u16 = 5000;

pub struct ServerState {
    pub store: MemoryStore,
}

impl ServerState {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            store: MemoryStore::new(),
        })
    }
}

/// Run the backend on `127.0.0.1:{port}` until the process exits.
pub async fn start_server(port: u16, seed: bool) -> Result<()> {
    let state = ServerState::new();
    if seed {
        state
            .store
            .load_seed(seed::demo_tasks()?, seed::demo_users())
            .await;
        info!("seeded demo tasks and users");
    }

    let bind = format!("127.0.0.1:{port}");
    let addr: SocketAddr = bind.parse()?;
    let router = build_router(state);

    info!("backend listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;
    Ok(())
}

pub fn build_router(state: Arc<ServerState>) -> Router {
    // The `{email}` segment doubles as the task id for PATCH and DELETE;
    // the router only cares about the shape of the path.
    Router::new()
        .route("/tasks", post(routes::create_task))
        .route(
            "/tasks/{email}",
            get(routes::get_tasks)
                .patch(routes::update_task)
                .delete(routes::delete_task),
        )
        .route("/tasks/{email}/events", get(sse::task_events_sse))
        .route("/users", post(routes::create_user))
        .route(
            "/users/{email}",
            get(routes::get_user).patch(routes::update_user),
        )
        .route("/health", get(routes::health))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
