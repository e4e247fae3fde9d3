//! Error types for task domain validation and parsing.

use super::{Role, TaskId, TaskStatus};
use thiserror::Error;

/// Errors returned while constructing or mutating domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskDomainError {
    /// A store identifier was zero or negative.
    #[error("invalid {kind} identifier {value}, expected a positive integer")]
    InvalidIdentifier {
        /// Which identifier was being built.
        kind: &'static str,
        /// Rejected raw value.
        value: i64,
    },

    /// The task title is empty after trimming.
    #[error("task title must not be empty")]
    EmptyTitle,

    /// A task was built without any responsible user.
    #[error("a task needs at least one responsible user")]
    NoResponsibles,

    /// An image URL is empty after trimming.
    #[error("image URL must not be empty")]
    EmptyImageUrl,

    /// A user's role requires a department but none was supplied.
    #[error("role {role} requires a department")]
    DepartmentRequired {
        /// Role of the offending user.
        role: Role,
    },

    /// A user's role forbids a department but one was supplied.
    #[error("role {role} must not belong to a department")]
    DepartmentForbidden {
        /// Role of the offending user.
        role: Role,
    },

    /// The requested lifecycle transition is not permitted.
    #[error("task {task_id} cannot move from {from} to {to}")]
    InvalidStateTransition {
        /// Task being transitioned.
        task_id: TaskId,
        /// Current status.
        from: TaskStatus,
        /// Requested status.
        to: TaskStatus,
    },
}

/// Error returned while parsing an enumerated value from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown {field} value: {value}")]
pub struct ParseValueError {
    /// Name of the enumerated field.
    pub field: &'static str,
    /// The raw value that failed to parse.
    pub value: String,
}

impl ParseValueError {
    pub(crate) fn new(field: &'static str, value: &str) -> Self {
        Self {
            field,
            value: value.to_owned(),
        }
    }
}
