use serde::{Deserialize, Serialize};

/// The finite set of states a task moves through.
///
/// Wire form is a lowercase string. The hosted backend stores whatever
/// the writing client sent ("Pending" seeds next to "pending" records),
/// so parsing is case-insensitive and trims whitespace.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    #[default]
    Pending,
    Accepted,
    Completed,
}

impl TaskStatus {
    /// Parse a wire status string. Returns `None` for anything outside the
    /// lifecycle vocabulary.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "accepted" => Some(Self::Accepted),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }

    /// Normalize a wire status, falling back to `Pending` for unknown or
    /// empty strings so a sloppy record stays visible on the board.
    pub fn normalize(s: &str) -> Self {
        match Self::parse(s) {
            Some(status) => status,
            None => {
                if !s.trim().is_empty() {
                    tracing::warn!(status = %s, "unknown task status, treating as pending");
                }
                Self::Pending
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Completed => "completed",
        }
    }

    /// Whether the task belongs on the Active tab.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Pending | Self::Accepted)
    }

    /// Whether the task belongs on the History tab.
    pub fn is_history(&self) -> bool {
        matches!(self, Self::Completed)
    }

    /// Whether `self → to` is a legal step in the lifecycle.
    pub fn can_advance_to(&self, to: TaskStatus) -> bool {
        valid_transition(*self, to)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transition table for the task lifecycle.
///
/// The lifecycle only moves forward: pending → accepted → completed.
/// Everything else, including self-transitions, is rejected.
pub fn valid_transition(from: TaskStatus, to: TaskStatus) -> bool {
    use TaskStatus::*;
    matches!((from, to), (Pending, Accepted) | (Accepted, Completed))
}

/// Field-level deserializer for status strings coming off the wire.
/// Missing fields and `null` both normalize to pending.
pub(crate) fn de_lenient<'de, D>(de: D) -> Result<TaskStatus, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(de)?.unwrap_or_default();
    Ok(TaskStatus::normalize(&raw))
}
