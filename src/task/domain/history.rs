//! Append-only deadline history.

use super::{DeadlineChangeId, ParseValueError, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What caused a deadline change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeadlineChangeKind {
    /// Recorded explicitly through the history operation.
    Manual,
    /// Extension granted while rejecting a delivery.
    RejectionExtension,
    /// Side effect of a general task edit.
    Edit,
}

impl DeadlineChangeKind {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Manual => "MANUAL",
            Self::RejectionExtension => "REJECTION_EXTENSION",
            Self::Edit => "EDIT",
        }
    }
}

impl TryFrom<&str> for DeadlineChangeKind {
    type Error = ParseValueError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_uppercase().as_str() {
            "MANUAL" => Ok(Self::Manual),
            "REJECTION_EXTENSION" => Ok(Self::RejectionExtension),
            "EDIT" => Ok(Self::Edit),
            _ => Err(ParseValueError::new("deadline change kind", value)),
        }
    }
}

/// A deadline change that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDeadlineChange {
    /// Deadline before the change.
    pub previous: DateTime<Utc>,
    /// Deadline after the change.
    pub new: DateTime<Utc>,
    /// Optional free-text reason.
    pub reason: Option<String>,
    /// Cause of the change.
    pub kind: DeadlineChangeKind,
    /// User who made the change.
    pub actor: UserId,
    /// When the change was recorded.
    pub changed_at: DateTime<Utc>,
}

/// A persisted deadline change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeadlineChange {
    /// History entry identifier.
    pub id: DeadlineChangeId,
    /// Deadline before the change.
    pub previous: DateTime<Utc>,
    /// Deadline after the change.
    pub new: DateTime<Utc>,
    /// Optional free-text reason.
    pub reason: Option<String>,
    /// Cause of the change.
    pub kind: DeadlineChangeKind,
    /// User who made the change.
    pub actor: UserId,
    /// When the change was recorded.
    pub changed_at: DateTime<Utc>,
}

impl DeadlineChange {
    /// Attaches a store identifier to a pending change.
    #[must_use]
    pub fn persisted(id: DeadlineChangeId, change: NewDeadlineChange) -> Self {
        Self {
            id,
            previous: change.previous,
            new: change.new,
            reason: change.reason,
            kind: change.kind,
            actor: change.actor,
            changed_at: change.changed_at,
        }
    }
}

/// Orders history newest first, breaking ties by identifier.
pub fn sort_newest_first(history: &mut [DeadlineChange]) {
    history.sort_by(|a, b| b.changed_at.cmp(&a.changed_at).then(b.id.cmp(&a.id)));
}
