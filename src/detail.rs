// detail.rs — Data behind the task-detail popup.

use tracing::debug;

use crate::api::BackendClient;
use crate::board::TaskBoard;
use crate::error::Result;
use crate::model::{Task, TaskStatus, UserProfile};

/// Everything the detail popup renders for one task.
#[derive(Debug, Clone)]
pub struct TaskDetail {
    pub task: Task,
    /// Contact card of the volunteer who claimed the task, when the
    /// lookup succeeded. `None` renders as "volunteer info not found".
    pub volunteer: Option<UserProfile>,
}

impl TaskDetail {
    /// Assemble the popup data.
    ///
    /// The volunteer lookup is best-effort: a missing or unreachable
    /// profile never fails the popup.
    pub async fn load(client: &BackendClient, task: Task) -> Self {
        let volunteer = if task.status != TaskStatus::Pending && !task.volunteer_id.is_empty() {
            match client.fetch_user(&task.volunteer_id).await {
                Ok(profile) => Some(profile),
                Err(err) => {
                    debug!(volunteer = %task.volunteer_id, error = %err, "volunteer lookup failed");
                    None
                }
            }
        } else {
            None
        };
        Self { task, volunteer }
    }

    /// Whether the popup offers editing. Only unclaimed tasks change.
    pub fn editable(&self) -> bool {
        self.task.editable()
    }

    /// Persist an edit made in the popup. Closing without calling this
    /// discards the draft; nothing is mutated until here.
    pub async fn save(&self, board: &TaskBoard, edited: Task) -> Result<()> {
        board.edit_task(edited).await
    }

    /// Remove the task from the popup's delete action.
    pub async fn delete(&self, board: &TaskBoard) -> Result<()> {
        board.delete_task(&self.task.id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_pending_task_is_editable_and_skips_lookup() {
        // Unroutable client: if the lookup ran, load would error out.
        let client = BackendClient::new("http://127.0.0.1:9");
        let task = Task {
            id: "t1".into(),
            status: TaskStatus::Pending,
            ..Task::default()
        };
        let detail = TaskDetail::load(&client, task).await;
        assert!(detail.editable());
        assert!(detail.volunteer.is_none());
    }

    #[tokio::test]
    async fn test_failed_volunteer_lookup_still_loads() {
        let client = BackendClient::new("http://127.0.0.1:9");
        let task = Task {
            id: "t1".into(),
            status: TaskStatus::Accepted,
            volunteer_id: "sam@example.com".into(),
            ..Task::default()
        };
        let detail = TaskDetail::load(&client, task).await;
        assert!(!detail.editable());
        assert!(detail.volunteer.is_none());
    }
}
