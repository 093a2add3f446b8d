// SPDX-License-Identifier: MIT
//
// server/store.rs — In-memory state behind the development backend.
//
// Tasks keep insertion order so list responses are stable across reloads.
// Every mutation bumps a per-user revision counter and announces the bump
// on a broadcast channel; the SSE route turns those into change events.

use crate::matching;
use crate::model::{ProfilePatch, Role, Task, TaskStatus, UserProfile};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{broadcast, RwLock};

/// One revision-counter increment for one user.
#[derive(Debug, Clone)]
pub struct RevisionBump {
    pub email: String,
    pub revision: u64,
}

/// Partial task update as it arrives on `PATCH /tasks/{id}`.
///
/// Status comes in as a raw string and goes through the lenient
/// normalizer, so hand-written requests with legacy capitalization merge
/// the same way seeded records parse.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub body: Option<String>,
    pub status: Option<String>,
    pub date: Option<String>,
    pub category: Option<String>,
    #[serde(rename = "volunteerID")]
    pub volunteer_id: Option<String>,
    pub address: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

// ─── Store ───────────────────────────────────────────────────────────────────

pub struct MemoryStore {
    tasks: RwLock<Vec<Task>>,
    /// Profiles keyed by email, which is also the task owner key.
    users: RwLock<HashMap<String, UserProfile>>,
    revisions: RwLock<HashMap<String, u64>>,
    next_id: AtomicU64,
    changes: broadcast::Sender<RevisionBump>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(256);
        Self {
            tasks: RwLock::new(Vec::new()),
            users: RwLock::new(HashMap::new()),
            revisions: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(0),
            changes,
        }
    }

    pub fn subscribe_changes(&self) -> broadcast::Receiver<RevisionBump> {
        self.changes.subscribe()
    }

    /// Load fixture data without bumping any revision counters, so a
    /// freshly seeded server starts every feed at revision zero.
    pub async fn load_seed(&self, tasks: Vec<Task>, users: Vec<UserProfile>) {
        let mut stored = self.tasks.write().await;
        for mut task in tasks {
            if task.id.is_empty() {
                task.id = self.assign_id();
            }
            stored.push(task);
        }
        drop(stored);
        let mut profiles = self.users.write().await;
        for user in users {
            profiles.insert(user.email.clone(), user);
        }
    }

    // ─── Tasks ───────────────────────────────────────────────────────────────

    pub async fn add_task(&self, mut task: Task) -> Task {
        if task.id.is_empty() {
            task.id = self.assign_id();
        }
        let elder = task.elder_id.clone();
        self.tasks.write().await.push(task.clone());
        self.bump([elder]).await;
        task
    }

    pub async fn task(&self, id: &str) -> Option<Task> {
        self.tasks.read().await.iter().find(|t| t.id == id).cloned()
    }

    pub async fn all_tasks(&self) -> Vec<Task> {
        self.tasks.read().await.clone()
    }

    /// Merge `update` into the stored task, returning the merged record.
    pub async fn update_task(&self, id: &str, update: &TaskUpdate) -> Option<Task> {
        let mut tasks = self.tasks.write().await;
        let task = tasks.iter_mut().find(|t| t.id == id)?;

        let mut touched = vec![task.elder_id.clone()];
        if !task.volunteer_id.is_empty() {
            touched.push(task.volunteer_id.clone());
        }

        if let Some(title) = &update.title {
            task.title = title.clone();
        }
        if let Some(body) = &update.body {
            task.body = body.clone();
        }
        if let Some(status) = &update.status {
            task.status = TaskStatus::normalize(status);
        }
        if let Some(date) = &update.date {
            task.date = date.clone();
        }
        if let Some(category) = &update.category {
            task.category = category.clone();
        }
        if let Some(volunteer) = &update.volunteer_id {
            task.volunteer_id = volunteer.clone();
        }
        if let Some(address) = &update.address {
            task.address = address.clone();
        }
        if let Some(start) = &update.start_time {
            task.start_time = start.clone();
        }
        if let Some(end) = &update.end_time {
            task.end_time = end.clone();
        }
        if !task.volunteer_id.is_empty() {
            touched.push(task.volunteer_id.clone());
        }

        let merged = task.clone();
        drop(tasks);
        self.bump(touched).await;
        Some(merged)
    }

    pub async fn delete_task(&self, id: &str) -> Option<Task> {
        let mut tasks = self.tasks.write().await;
        let pos = tasks.iter().position(|t| t.id == id)?;
        let removed = tasks.remove(pos);
        drop(tasks);

        let mut touched = vec![removed.elder_id.clone()];
        if !removed.volunteer_id.is_empty() {
            touched.push(removed.volunteer_id.clone());
        }
        self.bump(touched).await;
        Some(removed)
    }

    /// Tasks visible to `email`: elders see their own, volunteers see
    /// whatever the matcher picks from the whole board. `None` means the
    /// user does not exist.
    pub async fn tasks_for(&self, email: &str) -> Option<Vec<Task>> {
        let user = self.users.read().await.get(email).cloned()?;
        let tasks = self.tasks.read().await.clone();
        Some(match user.role {
            Role::Volunteer => matching::find_best_tasks(&tasks, &user),
            Role::Elder => tasks.into_iter().filter(|t| t.elder_id == email).collect(),
        })
    }

    // ─── Users ───────────────────────────────────────────────────────────────

    pub async fn upsert_user(&self, user: UserProfile) {
        let email = user.email.clone();
        self.users.write().await.insert(email.clone(), user);
        self.bump([email]).await;
    }

    pub async fn user(&self, email: &str) -> Option<UserProfile> {
        self.users.read().await.get(email).cloned()
    }

    pub async fn update_user(&self, email: &str, patch: &ProfilePatch) -> Option<UserProfile> {
        let mut users = self.users.write().await;
        let user = users.get_mut(email)?;
        if let Some(first) = &patch.first_name {
            user.first_name = first.clone();
        }
        if let Some(last) = &patch.last_name {
            user.last_name = last.clone();
        }
        if let Some(phone) = &patch.phone_number {
            user.phone_number = phone.clone();
        }
        if let Some(lat) = patch.latitude {
            user.latitude = lat;
        }
        if let Some(lon) = patch.longitude {
            user.longitude = lon;
        }
        if let Some(skills) = &patch.skills {
            user.skills = skills.clone();
        }
        if let Some(distance) = patch.distance {
            user.distance = distance;
        }
        let updated = user.clone();
        drop(users);
        self.bump([email.to_string()]).await;
        Some(updated)
    }

    // ─── Revisions ───────────────────────────────────────────────────────────

    pub async fn revision(&self, email: &str) -> u64 {
        self.revisions.read().await.get(email).copied().unwrap_or(0)
    }

    async fn bump(&self, emails: impl IntoIterator<Item = String>) {
        let mut revs = self.revisions.write().await;
        let mut seen = HashSet::new();
        for email in emails {
            if !seen.insert(email.clone()) {
                continue;
            }
            let rev = revs.entry(email.clone()).or_insert(0);
            *rev += 1;
            let _ = self.changes.send(RevisionBump {
                email,
                revision: *rev,
            });
        }
    }

    fn assign_id(&self) -> String {
        format!("task-{}", self.next_id.fetch_add(1, Ordering::Relaxed) + 1)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn elder(email: &str) -> UserProfile {
        UserProfile {
            email: email.to_string(),
            role: Role::Elder,
            latitude: 30.2672,
            longitude: -97.7431,
            ..Default::default()
        }
    }

    fn volunteer(email: &str, skills: &[&str]) -> UserProfile {
        UserProfile {
            email: email.to_string(),
            role: Role::Volunteer,
            latitude: 30.2672,
            longitude: -97.7431,
            skills: skills.iter().map(|s| s.to_string()).collect(),
            distance: 50.0,
            ..Default::default()
        }
    }

    fn task(elder: &str, category: &str) -> Task {
        Task {
            title: format!("{category} run"),
            category: category.to_string(),
            elder_id: elder.to_string(),
            latitude: 30.2672,
            longitude: -97.7431,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_add_task_assigns_id_and_bumps_owner() {
        let store = MemoryStore::new();
        store.upsert_user(elder("a@x.com")).await;
        let before = store.revision("a@x.com").await;

        let added = store.add_task(task("a@x.com", "Shopping")).await;
        assert!(added.id.starts_with("task-"));
        assert_eq!(store.revision("a@x.com").await, before + 1);
    }

    #[tokio::test]
    async fn test_update_bumps_both_sides_of_an_accepted_task() {
        let store = MemoryStore::new();
        let added = store.add_task(task("a@x.com", "Shopping")).await;

        let update = TaskUpdate {
            status: Some("accepted".to_string()),
            volunteer_id: Some("v@x.com".to_string()),
            ..Default::default()
        };
        let merged = store.update_task(&added.id, &update).await;
        assert_eq!(merged.as_ref().map(|t| t.status), Some(TaskStatus::Accepted));
        assert_eq!(store.revision("a@x.com").await, 2);
        assert_eq!(store.revision("v@x.com").await, 1);
    }

    #[tokio::test]
    async fn test_elder_and_volunteer_see_different_lists() {
        let store = MemoryStore::new();
        store
            .load_seed(
                vec![task("a@x.com", "Shopping"), task("b@x.com", "Transportation")],
                vec![elder("a@x.com"), volunteer("v@x.com", &["Shopping"])],
            )
            .await;

        let own = store.tasks_for("a@x.com").await.into_iter().flatten().count();
        assert_eq!(own, 1);

        let matched: Vec<_> = store.tasks_for("v@x.com").await.into_iter().flatten().collect();
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].category, "Shopping");

        assert!(store.tasks_for("nobody@x.com").await.is_none());
    }

    #[tokio::test]
    async fn test_seeding_does_not_bump_revisions() {
        let store = MemoryStore::new();
        store
            .load_seed(vec![task("a@x.com", "Shopping")], vec![elder("a@x.com")])
            .await;
        assert_eq!(store.revision("a@x.com").await, 0);
    }

    #[tokio::test]
    async fn test_delete_of_unknown_task_is_none() {
        let store = MemoryStore::new();
        assert!(store.delete_task("task-404").await.is_none());
    }
}
