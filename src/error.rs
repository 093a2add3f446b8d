// SPDX-License-Identifier: MIT

use crate::model::TaskStatus;

/// Failures surfaced by board, wizard, and backend-client operations.
///
/// Mutations validate locally before touching the network, so
/// `Validation`, `Transition`, and `WizardStep` are always raised with
/// zero requests sent.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Transport-level failure reaching the backend.
    #[error("backend unreachable: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("backend returned {status}: {message}")]
    Api { status: u16, message: String },

    /// A field failed validation before any network call was made.
    #[error("invalid {field}: {reason}")]
    Validation {
        field: &'static str,
        reason: String,
    },

    /// The requested lifecycle step is not a forward transition.
    #[error("cannot move task from {from} to {to}")]
    Transition { from: TaskStatus, to: TaskStatus },

    /// The wizard was asked for something its current step does not allow.
    #[error("wizard step {step} cannot {action}")]
    WizardStep { step: u8, action: &'static str },

    #[error("task {0} not found")]
    TaskNotFound(String),

    #[error("user {0} not found")]
    UserNotFound(String),
}

impl Error {
    pub(crate) fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
