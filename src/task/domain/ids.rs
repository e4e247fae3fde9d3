//! Identifier types for the task domain.
//!
//! Tasks, users, departments, images, and deadline changes are keyed by
//! positive integers assigned by the relational store. Audit entries and push
//! registrations use UUIDs because they are minted outside the store.

use super::TaskDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! store_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Creates a validated identifier.
            ///
            /// # Errors
            ///
            /// Returns [`TaskDomainError::InvalidIdentifier`] when the value is
            /// zero or negative.
            pub const fn new(value: i64) -> Result<Self, TaskDomainError> {
                if value <= 0 {
                    return Err(TaskDomainError::InvalidIdentifier {
                        kind: $label,
                        value,
                    });
                }
                Ok(Self(value))
            }

            /// Returns the underlying numeric value.
            #[must_use]
            pub const fn value(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

store_id!(
    /// Store-assigned identifier of a task.
    TaskId,
    "task"
);
store_id!(
    /// Store-assigned identifier of a user.
    UserId,
    "user"
);
store_id!(
    /// Store-assigned identifier of a department.
    DepartmentId,
    "department"
);
store_id!(
    /// Store-assigned identifier of a task image.
    ImageId,
    "image"
);
store_id!(
    /// Store-assigned identifier of a deadline history entry.
    DeadlineChangeId,
    "deadline change"
);

/// Identifier of an audit entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuditEntryId(Uuid);

impl AuditEntryId {
    /// Creates a new random audit entry identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an identifier from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the wrapped UUID.
    #[must_use]
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for AuditEntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AuditEntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a push-notification registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegistrationId(Uuid);

impl RegistrationId {
    /// Creates a new random registration identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an identifier from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the wrapped UUID.
    #[must_use]
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for RegistrationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RegistrationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
