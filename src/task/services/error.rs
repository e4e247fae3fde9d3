//! Service-boundary error taxonomy.
//!
//! Every failure leaving a service maps to one [`ErrorKind`] with a stable
//! code and HTTP status. Storage and internal details are logged here and
//! replaced by a generic message for the caller.

use crate::task::{
    domain::{ImageId, TaskDomainError, TaskId},
    policy::{DenialReason, ResponsibleRejection, VisibilityError},
    ports::{DirectoryError, TaskRepositoryError},
};
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

/// Per-field validation messages.
pub type FieldErrors = BTreeMap<String, String>;

/// Stable, machine-checkable error categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Malformed or missing input.
    ValidationError,
    /// Missing or invalid credential.
    AuthenticationError,
    /// A role, department, or hierarchy rule failed.
    PermissionDenied,
    /// The entity does not exist or is not visible.
    NotFound,
    /// A uniqueness violation at the store.
    Conflict,
    /// A lifecycle guard failed.
    InvalidState,
    /// Unexpected failure.
    InternalError,
}

impl ErrorKind {
    /// Returns the stable error code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ValidationError => "VALIDATION_ERROR",
            Self::AuthenticationError => "AUTHENTICATION_ERROR",
            Self::PermissionDenied => "PERMISSION_DENIED",
            Self::NotFound => "NOT_FOUND",
            Self::Conflict => "CONFLICT",
            Self::InvalidState => "INVALID_STATE",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Returns the HTTP status an outer layer should answer with.
    #[must_use]
    pub const fn http_status(self) -> u16 {
        match self {
            Self::ValidationError | Self::InvalidState => 400,
            Self::AuthenticationError => 401,
            Self::PermissionDenied => 403,
            Self::NotFound => 404,
            Self::Conflict => 409,
            Self::InternalError => 500,
        }
    }
}

/// Why a permission check failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PermissionError {
    /// The permission table refused the operation.
    #[error("{operation}: {reason}")]
    Denied {
        /// Operation attempted.
        operation: String,
        /// Table verdict.
        reason: DenialReason,
    },
    /// A department-scoped role has no department.
    #[error("a department is required for this operation")]
    NoDepartment,
    /// Assignment outside the actor's department.
    #[error("cannot assign work outside your own department")]
    DepartmentMismatch,
    /// A candidate or target sits above what the actor may touch.
    #[error("hierarchy violation: {0}")]
    HierarchyViolation(String),
    /// Only SUPER_ADMIN may move tasks between departments.
    #[error("only SUPER_ADMIN may change a task's department")]
    DepartmentChange,
}

impl PermissionError {
    /// Returns `true` for hierarchy violations, whichever rule raised them.
    #[must_use]
    pub const fn is_hierarchy_violation(&self) -> bool {
        matches!(
            self,
            Self::HierarchyViolation(_)
                | Self::Denied {
                    reason: DenialReason::HierarchyViolation,
                    ..
                }
        )
    }
}

/// Service-level errors for task operations.
#[derive(Debug, Error)]
pub enum TaskServiceError {
    /// Input failed validation.
    #[error("{message}")]
    Validation {
        /// Summary message.
        message: String,
        /// Per-field detail.
        fields: FieldErrors,
    },

    /// The credential layer rejected the caller.
    #[error("authentication required")]
    Authentication,

    /// An authorization rule failed.
    #[error("permission denied: {0}")]
    PermissionDenied(#[from] PermissionError),

    /// The target does not exist or is not visible to the caller.
    #[error("{0} not found")]
    NotFound(String),

    /// The store rejected a write as a duplicate.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A lifecycle guard failed.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Unexpected failure; detail was logged.
    #[error("internal error")]
    Internal,
}

impl TaskServiceError {
    /// Returns the stable kind for this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::ValidationError,
            Self::Authentication => ErrorKind::AuthenticationError,
            Self::PermissionDenied(_) => ErrorKind::PermissionDenied,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::InvalidState(_) => ErrorKind::InvalidState,
            Self::Internal => ErrorKind::InternalError,
        }
    }

    /// Builds a single-field validation error.
    #[must_use]
    pub fn invalid_field(field: &str, message: impl Into<String>) -> Self {
        let text = message.into();
        let mut fields = FieldErrors::new();
        fields.insert(field.to_owned(), text.clone());
        Self::Validation {
            message: text,
            fields,
        }
    }

    /// Builds a not-found error for a task.
    #[must_use]
    pub fn task_not_found(id: TaskId) -> Self {
        Self::NotFound(format!("task {id}"))
    }

    /// Builds a not-found error for an image.
    #[must_use]
    pub fn image_not_found(id: ImageId) -> Self {
        Self::NotFound(format!("image {id}"))
    }

    /// Returns the serialisable response body.
    #[must_use]
    pub fn body(&self) -> ErrorBody {
        let fields = match self {
            Self::Validation { fields, .. } => Some(fields.clone()),
            _ => None,
        };
        ErrorBody {
            kind: self.kind(),
            message: self.to_string(),
            fields,
        }
    }
}

/// Error payload returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    /// Stable error kind.
    pub kind: ErrorKind,
    /// Human-readable message.
    pub message: String,
    /// Per-field detail for validation errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<FieldErrors>,
}

/// Result type for task service operations.
pub type TaskServiceResult<T> = Result<T, TaskServiceError>;

impl From<TaskDomainError> for TaskServiceError {
    fn from(err: TaskDomainError) -> Self {
        match err {
            TaskDomainError::InvalidStateTransition { .. } => Self::InvalidState(err.to_string()),
            TaskDomainError::EmptyTitle => Self::invalid_field("titulo", err.to_string()),
            TaskDomainError::NoResponsibles => Self::invalid_field("responsables", err.to_string()),
            TaskDomainError::EmptyImageUrl => Self::invalid_field("imagenes", err.to_string()),
            TaskDomainError::InvalidIdentifier { .. }
            | TaskDomainError::DepartmentRequired { .. }
            | TaskDomainError::DepartmentForbidden { .. } => Self::Validation {
                message: err.to_string(),
                fields: FieldErrors::new(),
            },
        }
    }
}

impl From<ResponsibleRejection> for TaskServiceError {
    fn from(rejection: ResponsibleRejection) -> Self {
        match rejection {
            ResponsibleRejection::Empty | ResponsibleRejection::InvalidResponsibles(_) => {
                Self::invalid_field("responsables", rejection.to_string())
            }
            ResponsibleRejection::DepartmentMismatch { .. } => {
                Self::PermissionDenied(PermissionError::DepartmentMismatch)
            }
            ResponsibleRejection::HierarchyViolation { .. } => {
                Self::PermissionDenied(PermissionError::HierarchyViolation(rejection.to_string()))
            }
        }
    }
}

impl From<VisibilityError> for TaskServiceError {
    fn from(err: VisibilityError) -> Self {
        match err {
            VisibilityError::NoDepartment(_) => Self::PermissionDenied(PermissionError::NoDepartment),
        }
    }
}

impl From<TaskRepositoryError> for TaskServiceError {
    fn from(err: TaskRepositoryError) -> Self {
        match err {
            TaskRepositoryError::NotFound(id) => Self::task_not_found(id),
            TaskRepositoryError::ImageNotFound(id) => Self::image_not_found(id),
            TaskRepositoryError::Conflict(detail) => Self::Conflict(detail),
            TaskRepositoryError::StatusChanged { id, expected } => {
                tracing::warn!(task_id = %id, expected = %expected, "concurrent status change");
                Self::InvalidState(format!("task {id} is no longer {expected}"))
            }
            TaskRepositoryError::Persistence(source) => {
                tracing::error!(error = %source, "task repository failure");
                Self::Internal
            }
        }
    }
}

impl From<DirectoryError> for TaskServiceError {
    fn from(err: DirectoryError) -> Self {
        tracing::error!(error = %err, "user directory failure");
        Self::Internal
    }
}
