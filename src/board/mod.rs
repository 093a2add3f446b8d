// SPDX-License-Identifier: MIT
//
// board/mod.rs — Per-user task list with optimistic mutations.
//
// Every mutation follows the same two-phase protocol: apply the change
// locally first so the UI reacts instantly, then run the REST call, then
// reload the full list from the server. The server list always wins; no
// incremental merging is attempted. A failed REST call undoes the local
// change before the error is returned.

use tokio::sync::{broadcast, Mutex, RwLock};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::api::{BackendClient, CreatedTask};
use crate::error::{Error, Result};
use crate::events::{BoardEvent, EventBus};
use crate::model::{self, Task, TaskDraft, TaskPatch, TaskStatus};

/// In-memory task list for one signed-in user.
pub struct TaskBoard {
    client: BackendClient,
    user_id: String,
    tasks: RwLock<Vec<Task>>,
    events: EventBus,
    /// Serializes the two-phase mutations so a double-tapped action
    /// cannot interleave with another mutation.
    mutation_lock: Mutex<()>,
}

impl TaskBoard {
    pub fn new(client: BackendClient, user_id: impl Into<String>) -> Self {
        Self {
            client,
            user_id: user_id.into(),
            tasks: RwLock::new(Vec::new()),
            events: EventBus::new(),
            mutation_lock: Mutex::new(()),
        }
    }

    /// Email of the user this board belongs to.
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<BoardEvent> {
        self.events.subscribe()
    }

    // ─── Reads ───────────────────────────────────────────────────────────────

    /// Snapshot of the full list.
    pub async fn tasks(&self) -> Vec<Task> {
        self.tasks.read().await.clone()
    }

    pub async fn task(&self, id: &str) -> Option<Task> {
        self.tasks.read().await.iter().find(|t| t.id == id).cloned()
    }

    /// Tasks on the Active tab: pending or accepted, in list order.
    pub async fn active_tasks(&self) -> Vec<Task> {
        self.partition().await.0
    }

    /// Tasks on the History tab: completed, in list order.
    pub async fn history_tasks(&self) -> Vec<Task> {
        self.partition().await.1
    }

    /// (active, history) split of the current snapshot.
    pub async fn partition(&self) -> (Vec<Task>, Vec<Task>) {
        model::partition(&self.tasks.read().await)
    }

    // ─── Reload ──────────────────────────────────────────────────────────────

    /// Replace the local list with the server's. On failure the local
    /// list is left untouched; nothing is partially merged.
    pub async fn refresh(&self) -> Result<()> {
        let fetched = self.client.fetch_tasks(&self.user_id).await?;
        let count = fetched.len();
        *self.tasks.write().await = fetched;
        self.events.publish(BoardEvent::TasksReloaded { count });
        debug!(user = %self.user_id, count, "task list reloaded");
        Ok(())
    }

    /// Post-mutation reload. The REST call already succeeded, so a
    /// reload failure keeps the optimistic state; the next reload
    /// converges to the server list.
    async fn reconcile(&self) {
        if let Err(err) = self.refresh().await {
            warn!(user = %self.user_id, error = %err, "reload after mutation failed, local state stays optimistic");
        }
    }

    // ─── Mutations ───────────────────────────────────────────────────────────

    /// Create a task. The optimistic entry carries a placeholder id
    /// until the reload replaces it with the server record.
    pub async fn add_task(&self, draft: TaskDraft) -> Result<CreatedTask> {
        let _guard = self.mutation_lock.lock().await;

        let placeholder = format!("local-{}", Uuid::new_v4());
        self.tasks
            .write()
            .await
            .push(draft.to_provisional_task(&placeholder));
        self.events.publish(BoardEvent::TaskAdded {
            id: placeholder.clone(),
        });

        match self.client.create_task(&draft).await {
            Ok(created) => {
                debug!(user = %self.user_id, id = %created.id, "task created");
                self.reconcile().await;
                Ok(created)
            }
            Err(err) => {
                self.tasks.write().await.retain(|t| t.id != placeholder);
                self.events
                    .publish(BoardEvent::MutationRolledBack { id: placeholder });
                Err(err)
            }
        }
    }

    /// Update title, body, date, and category of a pending task. The
    /// status, volunteer, and requester fields never change here.
    pub async fn edit_task(&self, updated: Task) -> Result<()> {
        let _guard = self.mutation_lock.lock().await;

        let snapshot = self
            .task(&updated.id)
            .await
            .ok_or_else(|| Error::TaskNotFound(updated.id.clone()))?;
        if !snapshot.editable() {
            return Err(Error::validation(
                "status",
                format!("only pending tasks can be edited, this one is {}", snapshot.status),
            ));
        }

        let optimistic = Task {
            title: updated.title.clone(),
            body: updated.body.clone(),
            date: updated.date.clone(),
            category: updated.category.clone(),
            ..snapshot.clone()
        };
        self.replace_by_id(optimistic).await;
        self.events.publish(BoardEvent::TaskEdited {
            id: updated.id.clone(),
        });

        let patch = TaskPatch {
            title: Some(updated.title),
            body: Some(updated.body),
            date: Some(updated.date),
            category: Some(updated.category),
            ..TaskPatch::default()
        };
        match self.client.update_task(&snapshot.id, &patch).await {
            Ok(()) => {
                self.reconcile().await;
                Ok(())
            }
            Err(err) => {
                self.rollback(snapshot).await;
                Err(err)
            }
        }
    }

    /// Remove a task.
    pub async fn delete_task(&self, id: &str) -> Result<()> {
        let _guard = self.mutation_lock.lock().await;

        let (index, snapshot) = {
            let tasks = self.tasks.read().await;
            let index = tasks
                .iter()
                .position(|t| t.id == id)
                .ok_or_else(|| Error::TaskNotFound(id.to_string()))?;
            (index, tasks[index].clone())
        };

        self.tasks.write().await.retain(|t| t.id != id);
        self.events.publish(BoardEvent::TaskDeleted { id: id.to_string() });

        match self.client.delete_task(id).await {
            Ok(()) => {
                self.reconcile().await;
                Ok(())
            }
            Err(err) => {
                let mut tasks = self.tasks.write().await;
                let at = index.min(tasks.len());
                tasks.insert(at, snapshot);
                drop(tasks);
                self.events
                    .publish(BoardEvent::MutationRolledBack { id: id.to_string() });
                Err(err)
            }
        }
    }

    /// Volunteer claims a pending task.
    pub async fn accept_task(&self, id: &str, volunteer_email: &str) -> Result<()> {
        let _guard = self.mutation_lock.lock().await;

        let snapshot = self
            .task(id)
            .await
            .ok_or_else(|| Error::TaskNotFound(id.to_string()))?;
        if !snapshot.status.can_advance_to(TaskStatus::Accepted) {
            return Err(Error::Transition {
                from: snapshot.status,
                to: TaskStatus::Accepted,
            });
        }

        let optimistic = Task {
            status: TaskStatus::Accepted,
            volunteer_id: volunteer_email.to_string(),
            ..snapshot.clone()
        };
        self.replace_by_id(optimistic).await;
        self.events.publish(BoardEvent::StatusChanged {
            id: id.to_string(),
            from: snapshot.status,
            to: TaskStatus::Accepted,
        });

        let patch = TaskPatch {
            status: Some(TaskStatus::Accepted),
            volunteer_id: Some(volunteer_email.to_string()),
            ..TaskPatch::default()
        };
        match self.client.update_task(id, &patch).await {
            Ok(()) => {
                self.reconcile().await;
                Ok(())
            }
            Err(err) => {
                self.rollback(snapshot).await;
                Err(err)
            }
        }
    }

    /// Volunteer finishes an accepted task.
    pub async fn complete_task(&self, id: &str) -> Result<()> {
        let _guard = self.mutation_lock.lock().await;

        let snapshot = self
            .task(id)
            .await
            .ok_or_else(|| Error::TaskNotFound(id.to_string()))?;
        if !snapshot.status.can_advance_to(TaskStatus::Completed) {
            return Err(Error::Transition {
                from: snapshot.status,
                to: TaskStatus::Completed,
            });
        }

        let optimistic = Task {
            status: TaskStatus::Completed,
            ..snapshot.clone()
        };
        self.replace_by_id(optimistic).await;
        self.events.publish(BoardEvent::StatusChanged {
            id: id.to_string(),
            from: snapshot.status,
            to: TaskStatus::Completed,
        });

        let patch = TaskPatch {
            status: Some(TaskStatus::Completed),
            ..TaskPatch::default()
        };
        match self.client.update_task(id, &patch).await {
            Ok(()) => {
                self.reconcile().await;
                Ok(())
            }
            Err(err) => {
                self.rollback(snapshot).await;
                Err(err)
            }
        }
    }

    // ─── Rollback helpers ────────────────────────────────────────────────────

    async fn replace_by_id(&self, task: Task) {
        let mut tasks = self.tasks.write().await;
        if let Some(slot) = tasks.iter_mut().find(|t| t.id == task.id) {
            *slot = task;
        } else {
            // A concurrent reload dropped the entry; bring it back.
            tasks.push(task);
        }
    }

    async fn rollback(&self, snapshot: Task) {
        let id = snapshot.id.clone();
        self.replace_by_id(snapshot).await;
        self.events.publish(BoardEvent::MutationRolledBack { id });
    }
}
