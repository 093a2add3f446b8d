// api/mod.rs — Typed client for the coordination backend.
//
// Endpoints:
//   GET    /tasks/{email}     role-dependent task list
//   POST   /tasks             create (server forces status=pending)
//   PATCH  /tasks/{id}        partial update
//   DELETE /tasks/{id}        remove
//   GET    /users/{email}     profile lookup
//   POST   /users             profile creation
//   PATCH  /users/{email}     profile update

use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::model::{ProfilePatch, Task, TaskDraft, TaskPatch, UserProfile};

/// Response envelope for task creation.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedTask {
    pub id: String,
    #[serde(default)]
    pub message: String,
}

/// HTTP client for the coordination backend. Cheap to clone.
///
/// Deliberately configured without a request timeout: task mutations
/// block until the server answers, matching how the mobile clients
/// behave on a dead connection.
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET /tasks/{email} — the signed-in user's view of the task list.
    ///
    /// Elders get their own requests; volunteers get the subset matching
    /// their skills and travel radius. The server decides which.
    pub async fn fetch_tasks(&self, email: &str) -> Result<Vec<Task>> {
        let resp = self
            .http
            .get(self.url(&format!("/tasks/{email}")))
            .send()
            .await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Err(Error::UserNotFound(email.to_string()));
        }
        let resp = check(resp).await?;
        Ok(resp.json().await?)
    }

    /// POST /tasks — create a task; the response carries the new id.
    pub async fn create_task(&self, draft: &TaskDraft) -> Result<CreatedTask> {
        let resp = self
            .http
            .post(self.url("/tasks"))
            .json(draft)
            .send()
            .await?;
        let resp = check(resp).await?;
        Ok(resp.json().await?)
    }

    /// PATCH /tasks/{id} — partial update; only set patch fields are sent.
    pub async fn update_task(&self, id: &str, patch: &TaskPatch) -> Result<()> {
        let resp = self
            .http
            .patch(self.url(&format!("/tasks/{id}")))
            .json(patch)
            .send()
            .await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Err(Error::TaskNotFound(id.to_string()));
        }
        check(resp).await?;
        Ok(())
    }

    /// DELETE /tasks/{id}.
    pub async fn delete_task(&self, id: &str) -> Result<()> {
        let resp = self
            .http
            .delete(self.url(&format!("/tasks/{id}")))
            .send()
            .await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Err(Error::TaskNotFound(id.to_string()));
        }
        check(resp).await?;
        Ok(())
    }

    /// GET /users/{email}.
    pub async fn fetch_user(&self, email: &str) -> Result<UserProfile> {
        let resp = self
            .http
            .get(self.url(&format!("/users/{email}")))
            .send()
            .await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Err(Error::UserNotFound(email.to_string()));
        }
        let resp = check(resp).await?;
        Ok(resp.json().await?)
    }

    /// POST /users — register a profile.
    pub async fn create_user(&self, profile: &UserProfile) -> Result<()> {
        let resp = self
            .http
            .post(self.url("/users"))
            .json(profile)
            .send()
            .await?;
        check(resp).await?;
        Ok(())
    }

    /// PATCH /users/{email}.
    pub async fn update_user(&self, email: &str, patch: &ProfilePatch) -> Result<()> {
        let resp = self
            .http
            .patch(self.url(&format!("/users/{email}")))
            .json(patch)
            .send()
            .await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Err(Error::UserNotFound(email.to_string()));
        }
        check(resp).await?;
        Ok(())
    }
}

/// Map a non-2xx response to `Error::Api`, extracting the backend's
/// `error`/`message` text when the body carries one.
async fn check(resp: reqwest::Response) -> Result<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .or_else(|| v.get("message"))
                .and_then(Value::as_str)
                .map(String::from)
        })
        .unwrap_or(body);
    Err(Error::Api {
        status: status.as_u16(),
        message,
    })
}
