//! Command payloads accepted by the lifecycle service.

use crate::task::domain::{DepartmentId, TaskStatus, Urgency, UserId};
use chrono::NaiveDate;

/// Request payload for creating a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTaskRequest {
    pub(crate) title: String,
    pub(crate) notes: String,
    pub(crate) deadline: NaiveDate,
    pub(crate) urgency: Urgency,
    pub(crate) department: Option<DepartmentId>,
    pub(crate) responsibles: Vec<UserId>,
}

impl CreateTaskRequest {
    /// Creates a request with the required fields.
    ///
    /// The deadline is a business-calendar date; it is stored as the last
    /// millisecond of that day.
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        deadline: NaiveDate,
        responsibles: impl IntoIterator<Item = UserId>,
    ) -> Self {
        Self {
            title: title.into(),
            notes: String::new(),
            deadline,
            urgency: Urgency::default(),
            department: None,
            responsibles: responsibles.into_iter().collect(),
        }
    }

    /// Sets free-text notes.
    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    /// Sets the urgency.
    #[must_use]
    pub const fn with_urgency(mut self, urgency: Urgency) -> Self {
        self.urgency = urgency;
        self
    }

    /// Targets a department other than the creator's own.
    ///
    /// Required for SUPER_ADMIN, who has no department.
    #[must_use]
    pub const fn in_department(mut self, department: DepartmentId) -> Self {
        self.department = Some(department);
        self
    }
}

/// Request payload for delivering evidence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliverTaskRequest {
    pub(crate) comment: Option<String>,
    pub(crate) evidence: Vec<String>,
}

impl DeliverTaskRequest {
    /// Creates an empty delivery.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the delivery comment. Blank comments are dropped.
    #[must_use]
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = non_blank(&comment.into());
        self
    }

    /// Adds evidence image URLs already uploaded to object storage.
    #[must_use]
    pub fn with_evidence(mut self, urls: impl IntoIterator<Item = String>) -> Self {
        self.evidence.extend(urls);
        self
    }
}

/// Outcome chosen by the reviewer of a delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewDecision {
    /// Accept the delivery and close the task.
    Approve {
        /// Optional reviewer feedback.
        feedback: Option<String>,
    },
    /// Send the task back to its responsibles.
    Reject {
        /// Reviewer feedback forwarded to the responsibles.
        feedback: Option<String>,
        /// Optional extended deadline date.
        new_deadline: Option<NaiveDate>,
    },
}

impl ReviewDecision {
    /// Approval with optional feedback.
    #[must_use]
    pub fn approve(feedback: Option<&str>) -> Self {
        Self::Approve {
            feedback: feedback.and_then(non_blank),
        }
    }

    /// Rejection with optional feedback and deadline extension.
    #[must_use]
    pub fn reject(feedback: Option<&str>, new_deadline: Option<NaiveDate>) -> Self {
        Self::Reject {
            feedback: feedback.and_then(non_blank),
            new_deadline,
        }
    }
}

/// Partial edit of a task. Unset fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateTaskRequest {
    pub(crate) title: Option<String>,
    pub(crate) notes: Option<String>,
    pub(crate) urgency: Option<Urgency>,
    pub(crate) deadline: Option<NaiveDate>,
    pub(crate) status: Option<TaskStatus>,
    pub(crate) responsibles: Option<Vec<UserId>>,
    pub(crate) department: Option<DepartmentId>,
}

impl UpdateTaskRequest {
    /// Creates an edit that changes nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Replaces the notes.
    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Replaces the urgency.
    #[must_use]
    pub const fn with_urgency(mut self, urgency: Urgency) -> Self {
        self.urgency = Some(urgency);
        self
    }

    /// Moves the deadline to the end of `date`.
    #[must_use]
    pub const fn with_deadline(mut self, date: NaiveDate) -> Self {
        self.deadline = Some(date);
        self
    }

    /// Sets the status directly.
    #[must_use]
    pub const fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Replaces the responsible set wholesale.
    #[must_use]
    pub fn with_responsibles(mut self, responsibles: impl IntoIterator<Item = UserId>) -> Self {
        self.responsibles = Some(responsibles.into_iter().collect());
        self
    }

    /// Moves the task to another department.
    #[must_use]
    pub const fn with_department(mut self, department: DepartmentId) -> Self {
        self.department = Some(department);
        self
    }
}

/// Request payload for recording a deadline change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordDeadlineRequest {
    pub(crate) new_deadline: NaiveDate,
    pub(crate) reason: Option<String>,
}

impl RecordDeadlineRequest {
    /// Creates a request moving the deadline to the end of `new_deadline`.
    #[must_use]
    pub const fn new(new_deadline: NaiveDate) -> Self {
        Self {
            new_deadline,
            reason: None,
        }
    }

    /// Sets the reason. Blank reasons are dropped.
    #[must_use]
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = non_blank(&reason.into());
        self
    }
}

fn non_blank(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_owned())
    }
}
