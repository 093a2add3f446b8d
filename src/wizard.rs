// SPDX-License-Identifier: MIT
//
// wizard.rs — Six-step task creation flow.
//
// The steps run strictly in order; `next` validates only the fields the
// current step owns and `back` never loses entered data. A failed
// submission resets the whole flow to the first step, data included,
// which is exactly how the app behaves.

use chrono::Utc;

use crate::api::CreatedTask;
use crate::board::TaskBoard;
use crate::error::{Error, Result};
use crate::model::{TaskDraft, TaskStatus, UserProfile};

/// The six screens of the creation flow, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardStep {
    Intro,
    Category,
    Details,
    Timing,
    Payment,
    Submitting,
}

impl WizardStep {
    pub fn number(self) -> u8 {
        match self {
            Self::Intro => 1,
            Self::Category => 2,
            Self::Details => 3,
            Self::Timing => 4,
            Self::Payment => 5,
            Self::Submitting => 6,
        }
    }

    fn previous(self) -> Self {
        match self {
            Self::Intro | Self::Category => Self::Intro,
            Self::Details => Self::Category,
            Self::Timing => Self::Details,
            Self::Payment => Self::Timing,
            Self::Submitting => Self::Payment,
        }
    }
}

/// When the help is needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Urgency {
    /// Right away; the current timestamp becomes the task date.
    Now,
    /// At a date the user picks.
    Later,
}

/// Everything entered so far. Retained across forward and backward
/// navigation until submission.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WizardData {
    pub category: String,
    pub title: String,
    pub body: String,
    pub urgency: Option<Urgency>,
    pub date: String,
    pub payment_offered: Option<bool>,
}

pub struct AddTaskWizard {
    step: WizardStep,
    data: WizardData,
}

impl Default for AddTaskWizard {
    fn default() -> Self {
        Self::new()
    }
}

impl AddTaskWizard {
    pub fn new() -> Self {
        Self {
            step: WizardStep::Intro,
            data: WizardData::default(),
        }
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn data(&self) -> &WizardData {
        &self.data
    }

    // ─── Field entry ─────────────────────────────────────────────────────────

    pub fn set_category(&mut self, category: impl Into<String>) {
        self.data.category = category.into();
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.data.title = title.into();
    }

    pub fn set_body(&mut self, body: impl Into<String>) {
        self.data.body = body.into();
    }

    /// Help is needed right away. Stamps the task date with the current
    /// time.
    pub fn choose_now(&mut self) {
        self.data.urgency = Some(Urgency::Now);
        self.data.date = Utc::now().to_rfc3339();
    }

    /// Help is needed at a chosen date.
    pub fn choose_later(&mut self, date: impl Into<String>) {
        self.data.urgency = Some(Urgency::Later);
        self.data.date = date.into();
    }

    pub fn set_payment(&mut self, offered: bool) {
        self.data.payment_offered = Some(offered);
    }

    // ─── Navigation ──────────────────────────────────────────────────────────

    /// Advance to the next step. Validates only the fields the current
    /// step owns; on failure the step does not change.
    pub fn next(&mut self) -> Result<WizardStep> {
        let next = match self.step {
            WizardStep::Intro => WizardStep::Category,
            WizardStep::Category => {
                if self.data.category.trim().is_empty() {
                    return Err(Error::validation(
                        "category",
                        "choose a category before continuing",
                    ));
                }
                WizardStep::Details
            }
            WizardStep::Details => {
                if self.data.title.trim().is_empty() {
                    return Err(Error::validation("title", "title must not be empty"));
                }
                if self.data.body.trim().is_empty() {
                    return Err(Error::validation("body", "description must not be empty"));
                }
                WizardStep::Timing
            }
            WizardStep::Timing => match self.data.urgency {
                None => return Err(Error::validation("urgency", "choose Now or Later")),
                Some(Urgency::Later) if self.data.date.trim().is_empty() => {
                    return Err(Error::validation("date", "pick a date for a scheduled task"))
                }
                Some(_) => WizardStep::Payment,
            },
            WizardStep::Payment => {
                if self.data.payment_offered.is_none() {
                    return Err(Error::validation(
                        "payment",
                        "answer whether payment is offered",
                    ));
                }
                WizardStep::Submitting
            }
            WizardStep::Submitting => {
                return Err(Error::WizardStep {
                    step: self.step.number(),
                    action: "advance",
                })
            }
        };
        self.step = next;
        Ok(self.step)
    }

    /// Go back one step, keeping everything entered. Saturates at the
    /// intro screen; a submission in flight cannot be backed out of.
    pub fn back(&mut self) -> Result<WizardStep> {
        if self.step == WizardStep::Submitting {
            return Err(Error::WizardStep {
                step: self.step.number(),
                action: "go back",
            });
        }
        self.step = self.step.previous();
        Ok(self.step)
    }

    // ─── Submission ──────────────────────────────────────────────────────────

    /// Send the composed draft through the board.
    ///
    /// Success or failure, the flow starts over at the intro step; a
    /// failed submission loses the entered data.
    pub async fn submit(
        &mut self,
        board: &TaskBoard,
        elder: &UserProfile,
    ) -> Result<CreatedTask> {
        if self.step != WizardStep::Submitting {
            return Err(Error::WizardStep {
                step: self.step.number(),
                action: "submit",
            });
        }

        let draft = TaskDraft {
            title: self.data.title.trim().to_string(),
            body: self.data.body.trim().to_string(),
            date: self.data.date.clone(),
            category: self.data.category.clone(),
            elder_id: elder.email.clone(),
            status: TaskStatus::Pending,
            latitude: elder.latitude,
            longitude: elder.longitude,
        };

        let result = board.add_task(draft).await;
        *self = Self::new();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::BackendClient;

    fn wizard_at_payment() -> AddTaskWizard {
        let mut w = AddTaskWizard::new();
        w.next().unwrap();
        w.set_category("Shopping");
        w.next().unwrap();
        w.set_title("Pick up groceries");
        w.set_body("Milk and bread from the corner store");
        w.next().unwrap();
        w.choose_now();
        w.next().unwrap();
        w
    }

    #[test]
    fn test_happy_path_reaches_submitting() {
        let mut w = wizard_at_payment();
        w.set_payment(false);
        assert_eq!(w.next().unwrap(), WizardStep::Submitting);
        assert_eq!(w.step().number(), 6);
    }

    #[test]
    fn test_category_is_required() {
        let mut w = AddTaskWizard::new();
        w.next().unwrap();

        let err = w.next().unwrap_err();
        assert!(matches!(err, Error::Validation { field: "category", .. }));
        assert_eq!(w.step(), WizardStep::Category);
    }

    #[test]
    fn test_details_require_title_and_body() {
        let mut w = AddTaskWizard::new();
        w.next().unwrap();
        w.set_category("Shopping");
        w.next().unwrap();

        let err = w.next().unwrap_err();
        assert!(matches!(err, Error::Validation { field: "title", .. }));

        w.set_title("Pick up groceries");
        let err = w.next().unwrap_err();
        assert!(matches!(err, Error::Validation { field: "body", .. }));

        w.set_body("Milk and bread");
        assert_eq!(w.next().unwrap(), WizardStep::Timing);
    }

    #[test]
    fn test_timing_requires_choice_and_later_requires_date() {
        let mut w = AddTaskWizard::new();
        w.next().unwrap();
        w.set_category("Shopping");
        w.next().unwrap();
        w.set_title("t");
        w.set_body("b");
        w.next().unwrap();

        let err = w.next().unwrap_err();
        assert!(matches!(err, Error::Validation { field: "urgency", .. }));

        w.choose_later("");
        let err = w.next().unwrap_err();
        assert!(matches!(err, Error::Validation { field: "date", .. }));

        w.choose_later("2025-11-01T09:00:00Z");
        assert_eq!(w.next().unwrap(), WizardStep::Payment);
    }

    #[test]
    fn test_payment_answer_is_required() {
        let mut w = wizard_at_payment();
        let err = w.next().unwrap_err();
        assert!(matches!(err, Error::Validation { field: "payment", .. }));
        assert_eq!(w.step(), WizardStep::Payment);
    }

    #[test]
    fn test_back_retains_entered_data() {
        let mut w = AddTaskWizard::new();
        w.next().unwrap();
        w.set_category("Technology");
        w.next().unwrap();
        w.set_title("Fix the tablet");

        w.back().unwrap();
        assert_eq!(w.step(), WizardStep::Category);
        assert_eq!(w.data().category, "Technology");
        assert_eq!(w.data().title, "Fix the tablet");

        // Forward again without re-entering anything.
        assert_eq!(w.next().unwrap(), WizardStep::Details);
    }

    #[test]
    fn test_back_saturates_at_intro() {
        let mut w = AddTaskWizard::new();
        assert_eq!(w.back().unwrap(), WizardStep::Intro);
        assert_eq!(w.back().unwrap(), WizardStep::Intro);
    }

    #[test]
    fn test_choose_now_stamps_current_time() {
        let mut w = AddTaskWizard::new();
        let before = Utc::now();
        w.choose_now();
        let stamped = chrono::DateTime::parse_from_rfc3339(&w.data().date).unwrap();
        let delta = stamped.signed_duration_since(before).num_seconds().abs();
        assert!(delta <= 5, "stamp was {delta}s off");
    }

    #[tokio::test]
    async fn test_submit_requires_submitting_step() {
        let board = TaskBoard::new(BackendClient::new("http://127.0.0.1:9"), "m@example.com");
        let mut w = AddTaskWizard::new();
        let err = w.submit(&board, &UserProfile::default()).await.unwrap_err();
        assert!(matches!(err, Error::WizardStep { step: 1, action: "submit" }));
    }

    #[tokio::test]
    async fn test_failed_submit_resets_flow_and_loses_data() {
        let board = TaskBoard::new(BackendClient::new("http://127.0.0.1:9"), "m@example.com");
        let elder = UserProfile {
            email: "m@example.com".into(),
            latitude: 30.2672,
            longitude: -97.7431,
            ..UserProfile::default()
        };

        let mut w = wizard_at_payment();
        w.set_payment(true);
        w.next().unwrap();

        let err = w.submit(&board, &elder).await.unwrap_err();
        assert!(matches!(err, Error::Http(_)));

        assert_eq!(w.step(), WizardStep::Intro);
        assert_eq!(*w.data(), WizardData::default());
        // The optimistic entry was rolled back too.
        assert!(board.tasks().await.is_empty());
    }
}
