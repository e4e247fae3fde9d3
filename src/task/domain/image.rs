//! Images attached to tasks as evidence or reference material.

use super::{ImageId, TaskDomainError, TaskId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// URL of an object held by the external object store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageUrl(String);

impl ImageUrl {
    /// Creates a validated image URL.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyImageUrl`] when the value is blank.
    pub fn new(value: impl Into<String>) -> Result<Self, TaskDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(TaskDomainError::EmptyImageUrl);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the URL as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImageUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A persisted task image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskImage {
    /// Image identifier.
    pub id: ImageId,
    /// Owning task.
    pub task_id: TaskId,
    /// Object store URL.
    pub url: ImageUrl,
    /// Upload timestamp.
    pub created_at: DateTime<Utc>,
}

/// An image awaiting its identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTaskImage {
    /// Object store URL.
    pub url: ImageUrl,
    /// Upload timestamp, taken from the service clock.
    pub uploaded_at: DateTime<Utc>,
}
