// model/mod.rs — Task and user data model.
//
// Wire-format notes: the backend speaks camelCase JSON with two all-caps
// ID fields (`elderID`, `volunteerID`). Old records are sparse and
// sloppily cased, so every field defaults and status parsing is lenient.

pub mod category;
pub mod status;

pub use status::{valid_transition, TaskStatus};

use serde::{Deserialize, Deserializer, Serialize};

/// A help request, as stored by the backend.
///
/// Superset of every shape the mobile clients ever rendered. Records
/// written by older app versions miss most of the optional fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Server-assigned, unique, immutable. Empty only on records that
    /// have not completed their round-trip yet.
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default, deserialize_with = "status::de_lenient")]
    pub status: TaskStatus,
    /// When the help is needed. Kept as the string the client sent.
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub category: String,
    /// Empty until a volunteer accepts. Never cleared afterwards except
    /// by deleting the task.
    #[serde(rename = "volunteerID", default, deserialize_with = "de_null_string")]
    pub volunteer_id: String,
    /// Requester's email. Set at creation, immutable.
    #[serde(rename = "elderID", default)]
    pub elder_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub address: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub start_time: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub end_time: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub elder_name: String,
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub longitude: f64,
}

impl Task {
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    pub fn is_history(&self) -> bool {
        self.status.is_history()
    }

    /// Editing is only offered while the task is still unclaimed.
    pub fn editable(&self) -> bool {
        self.status == TaskStatus::Pending
    }
}

/// Split a snapshot into (active, history) by status.
///
/// Every task lands in exactly one of the two lists; input order is
/// preserved.
pub fn partition(tasks: &[Task]) -> (Vec<Task>, Vec<Task>) {
    tasks.iter().cloned().partition(Task::is_active)
}

/// Client-side payload for creating a task. The server assigns the id,
/// keeps `status` at pending, and leaves the volunteer slot empty.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskDraft {
    pub title: String,
    pub body: String,
    pub date: String,
    pub category: String,
    #[serde(rename = "elderID")]
    pub elder_id: String,
    pub status: TaskStatus,
    pub latitude: f64,
    pub longitude: f64,
}

impl Default for TaskDraft {
    fn default() -> Self {
        Self {
            title: String::new(),
            body: String::new(),
            date: String::new(),
            category: String::new(),
            elder_id: String::new(),
            status: TaskStatus::Pending,
            latitude: 0.0,
            longitude: 0.0,
        }
    }
}

impl TaskDraft {
    /// Local stand-in shown on the board while the create round-trip is
    /// in flight. The placeholder id is replaced by the server's on the
    /// reload that follows.
    pub fn to_provisional_task(&self, placeholder_id: &str) -> Task {
        Task {
            id: placeholder_id.to_string(),
            title: self.title.clone(),
            body: self.body.clone(),
            status: TaskStatus::Pending,
            date: self.date.clone(),
            category: self.category.clone(),
            elder_id: self.elder_id.clone(),
            latitude: self.latitude,
            longitude: self.longitude,
            ..Task::default()
        }
    }
}

/// Partial update for `PATCH /tasks/{id}`. Only set fields go on the wire.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(rename = "volunteerID", skip_serializing_if = "Option::is_none")]
    pub volunteer_id: Option<String>,
}

/// Which side of the marketplace an account is on.
///
/// The backend treats every role it does not recognize as elder, so
/// legacy values like "senior" deserialize that way too.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Elder,
    Volunteer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Elder => "elder",
            Self::Volunteer => "volunteer",
        }
    }

    pub fn normalize(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("volunteer") {
            Self::Volunteer
        } else {
            Self::Elder
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D>(de: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(de)?.unwrap_or_default();
        Ok(Role::normalize(&raw))
    }
}

/// A user record.
///
/// Historical POST bodies used kebab-case name keys and `type` for the
/// role; both spellings are accepted on input and the camelCase form is
/// written back.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default)]
    pub email: String,
    #[serde(default, alias = "first-name")]
    pub first_name: String,
    #[serde(default, alias = "last-name")]
    pub last_name: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default, alias = "type")]
    pub role: Role,
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub longitude: f64,
    /// Categories a volunteer is willing to take on.
    #[serde(default)]
    pub skills: Vec<String>,
    /// Maximum distance, in kilometres, a volunteer will travel.
    #[serde(default)]
    pub distance: f64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub address: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub city: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub state: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub zip_code: String,
}

impl UserProfile {
    /// "First Last" with whatever parts are present.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
            .trim()
            .to_string()
    }
}

/// Partial update for `PATCH /users/{email}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skills: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
}

/// Firestore-backed records serialize a claimed-by-nobody volunteer slot
/// as `null`; treat that the same as the empty string.
fn de_null_string<'de, D>(de: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(de)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn task(id: &str, status: TaskStatus) -> Task {
        Task {
            id: id.to_string(),
            title: format!("task {id}"),
            status,
            ..Task::default()
        }
    }

    #[test]
    fn test_partition_is_total_and_disjoint() {
        let tasks = vec![
            task("a", TaskStatus::Pending),
            task("b", TaskStatus::Completed),
            task("c", TaskStatus::Accepted),
            task("d", TaskStatus::Completed),
        ];
        let (active, history) = partition(&tasks);
        assert_eq!(
            active.iter().map(|t| t.id.as_str()).collect::<Vec<_>>(),
            vec!["a", "c"]
        );
        assert_eq!(
            history.iter().map(|t| t.id.as_str()).collect::<Vec<_>>(),
            vec!["b", "d"]
        );
        assert_eq!(active.len() + history.len(), tasks.len());
    }

    #[test]
    fn test_task_parses_sloppy_wire_record() {
        let raw = r#"{
            "id": "abc",
            "title": "Weekly grocery delivery",
            "status": "Pending",
            "volunteerID": null,
            "elderID": "martha@example.com",
            "date": "2025-10-28"
        }"#;
        let t: Task = serde_json::from_str(raw).unwrap();
        assert_eq!(t.status, TaskStatus::Pending);
        assert_eq!(t.volunteer_id, "");
        assert_eq!(t.elder_id, "martha@example.com");
        assert_eq!(t.body, "");
        assert!(t.editable());
    }

    #[test]
    fn test_task_round_trips_id_fields_verbatim() {
        let t = Task {
            id: "t1".into(),
            volunteer_id: "vol@example.com".into(),
            elder_id: "elder@example.com".into(),
            ..Task::default()
        };
        let v = serde_json::to_value(&t).unwrap();
        assert_eq!(v["volunteerID"], "vol@example.com");
        assert_eq!(v["elderID"], "elder@example.com");
        assert_eq!(v["status"], "pending");
    }

    #[test]
    fn test_draft_serializes_creation_body() {
        let draft = TaskDraft {
            title: "Pick up groceries".into(),
            body: "Milk and bread".into(),
            date: "2025-11-01T09:00:00Z".into(),
            category: "Shopping".into(),
            elder_id: "martha@example.com".into(),
            latitude: 30.2672,
            longitude: -97.7431,
            ..TaskDraft::default()
        };
        let v = serde_json::to_value(&draft).unwrap();
        assert_eq!(v["status"], "pending");
        assert_eq!(v["elderID"], "martha@example.com");
        assert!(v.get("id").is_none());
    }

    #[test]
    fn test_patch_only_sends_set_fields() {
        let patch = TaskPatch {
            status: Some(TaskStatus::Accepted),
            volunteer_id: Some("vol@example.com".into()),
            ..TaskPatch::default()
        };
        let v = serde_json::to_value(&patch).unwrap();
        assert_eq!(
            v.as_object().unwrap().keys().collect::<Vec<_>>(),
            vec!["status", "volunteerID"]
        );
    }

    #[test]
    fn test_profile_accepts_legacy_keys() {
        let raw = r#"{
            "email": "sam@example.com",
            "first-name": "Sam",
            "last-name": "Reyes",
            "type": "volunteer",
            "skills": ["Groceries"],
            "distance": 25
        }"#;
        let p: UserProfile = serde_json::from_str(raw).unwrap();
        assert_eq!(p.first_name, "Sam");
        assert_eq!(p.role, Role::Volunteer);
        assert_eq!(p.full_name(), "Sam Reyes");
        assert_eq!(p.distance, 25.0);
    }

    #[test]
    fn test_unknown_role_defaults_to_elder() {
        let raw = r#"{ "email": "c@example.com", "role": "senior" }"#;
        let p: UserProfile = serde_json::from_str(raw).unwrap();
        assert_eq!(p.role, Role::Elder);
    }

    proptest! {
        #[test]
        fn prop_normalize_never_panics_and_is_idempotent(s in ".{0,40}") {
            let once = TaskStatus::normalize(&s);
            let twice = TaskStatus::normalize(once.as_str());
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn prop_partition_is_total_and_disjoint(statuses in proptest::collection::vec(0u8..3, 0..32)) {
            let tasks: Vec<Task> = statuses
                .iter()
                .enumerate()
                .map(|(i, s)| {
                    let status = match s {
                        0 => TaskStatus::Pending,
                        1 => TaskStatus::Accepted,
                        _ => TaskStatus::Completed,
                    };
                    task(&format!("t{i}"), status)
                })
                .collect();
            let (active, history) = partition(&tasks);
            prop_assert_eq!(active.len() + history.len(), tasks.len());
            prop_assert!(active.iter().all(Task::is_active));
            prop_assert!(history.iter().all(Task::is_history));
        }
    }
}
