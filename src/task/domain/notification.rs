//! Notification intents and push payloads.

use super::{RegistrationId, TaskId, UserId};
use serde::{Deserialize, Serialize};

/// Which notification template applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// A task was assigned on creation.
    NewTask,
    /// Users were added to an existing task.
    Reassigned,
    /// A responsible delivered evidence.
    Delivered,
    /// A delivery was approved.
    Approved,
    /// A delivery was rejected.
    Rejected,
    /// A task was closed directly.
    Completed,
    /// A task was cancelled.
    Cancelled,
    /// The deadline changed.
    DeadlineChanged,
    /// The deadline is today.
    DueToday,
    /// The deadline has passed.
    Overdue,
}

impl NotificationKind {
    /// Returns the template name used for rendering.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NewTask => "new_task",
            Self::Reassigned => "reassigned",
            Self::Delivered => "delivered",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::DeadlineChanged => "deadline_changed",
            Self::DueToday => "due_today",
            Self::Overdue => "overdue",
        }
    }
}

/// Who to notify, with what text, linking where.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationIntent {
    /// Template kind that produced the text.
    pub kind: NotificationKind,
    /// Task the notification is about.
    pub task_id: TaskId,
    /// Deduplicated recipients.
    pub audience: Vec<UserId>,
    /// Notification title.
    pub title: String,
    /// Notification body.
    pub body: String,
    /// Deep link opened by the client.
    pub url: String,
}

/// Link data carried by a push payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushData {
    /// Deep link.
    pub url: String,
}

/// Payload handed to the push transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushPayload {
    /// Title line.
    pub title: String,
    /// Body text.
    pub body: String,
    /// Icon URL or path.
    pub icon: String,
    /// Link data.
    pub data: PushData,
}

impl PushPayload {
    /// Builds the payload for an intent.
    #[must_use]
    pub fn from_intent(intent: &NotificationIntent, icon: &str) -> Self {
        Self {
            title: intent.title.clone(),
            body: intent.body.clone(),
            icon: icon.to_owned(),
            data: PushData {
                url: intent.url.clone(),
            },
        }
    }
}

/// A stored push subscription for one device of one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushRegistration {
    /// Registration identifier.
    pub id: RegistrationId,
    /// Owning user.
    pub user: UserId,
    /// Push service endpoint.
    pub endpoint: String,
    /// Client public key.
    pub p256dh: String,
    /// Client auth secret.
    pub auth: String,
}
