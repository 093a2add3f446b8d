// server/routes.rs — REST handlers for the development backend.
//
// Response shapes follow the hosted backend byte for byte, success
// banners included, so the client library cannot tell the two apart.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use super::store::TaskUpdate;
use super::ServerState;
use crate::model::{ProfilePatch, Task, TaskStatus, UserProfile};

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

// ─── Tasks ───────────────────────────────────────────────────────────────────

pub async fn get_tasks(
    State(state): State<Arc<ServerState>>,
    Path(email): Path<String>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    match state.store.tasks_for(&email).await {
        Some(tasks) => Ok(Json(json!(tasks))),
        None => Err((
            StatusCode::NOT_FOUND,
            Json(json!({ "error": format!("No user found with email {email}") })),
        )),
    }
}

/// Create payload. Every field is optional on the wire; whatever the
/// client sends for `status` or `volunteerID` is ignored, new tasks
/// always start pending and unclaimed.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub category: String,
    #[serde(rename = "elderID", default)]
    pub elder_id: String,
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub longitude: f64,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub start_time: String,
    #[serde(default)]
    pub end_time: String,
}

pub async fn create_task(
    State(state): State<Arc<ServerState>>,
    Json(body): Json<NewTask>,
) -> (StatusCode, Json<Value>) {
    let task = Task {
        title: body.title,
        body: body.body,
        status: TaskStatus::Pending,
        date: body.date,
        category: body.category,
        elder_id: body.elder_id,
        latitude: body.latitude,
        longitude: body.longitude,
        address: body.address,
        start_time: body.start_time,
        end_time: body.end_time,
        ..Task::default()
    };
    let stored = state.store.add_task(task).await;
    (
        StatusCode::CREATED,
        Json(json!({ "id": stored.id, "message": "Task added successfully!" })),
    )
}

pub async fn update_task(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
    Json(update): Json<TaskUpdate>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    match state.store.update_task(&id, &update).await {
        Some(_) => Ok(Json(json!({ "message": "Task updated successfully!" }))),
        None => Err((
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Task not found" })),
        )),
    }
}

pub async fn delete_task(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    match state.store.delete_task(&id).await {
        Some(_) => Ok(Json(json!({ "message": "Task deleted successfully!" }))),
        None => Err((
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Task not found" })),
        )),
    }
}

// ─── Users ───────────────────────────────────────────────────────────────────

pub async fn get_user(
    State(state): State<Arc<ServerState>>,
    Path(email): Path<String>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    match state.store.user(&email).await {
        Some(user) => Ok(Json(json!(user))),
        None => Err((
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "User not found" })),
        )),
    }
}

pub async fn create_user(
    State(state): State<Arc<ServerState>>,
    Json(user): Json<UserProfile>,
) -> (StatusCode, Json<Value>) {
    let id = user.email.clone();
    state.store.upsert_user(user).await;
    (
        StatusCode::CREATED,
        Json(json!({ "id": id, "message": "User added successfully!" })),
    )
}

pub async fn update_user(
    State(state): State<Arc<ServerState>>,
    Path(email): Path<String>,
    Json(patch): Json<ProfilePatch>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    match state.store.update_user(&email, &patch).await {
        Some(_) => Ok(Json(json!({ "message": "User updated successfully!" }))),
        None => Err((
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "User not found" })),
        )),
    }
}
