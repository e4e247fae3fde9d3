//! Read-only port onto users and departments.

use crate::task::domain::{Department, DepartmentId, User, UserId};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for directory lookups.
pub type DirectoryResult<T> = Result<T, DirectoryError>;

/// User and department lookup contract.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Finds a user by identifier, active or not.
    async fn find_user(&self, id: UserId) -> DirectoryResult<Option<User>>;

    /// Finds every user among `ids` that exists, active or not.
    async fn find_users(&self, ids: &[UserId]) -> DirectoryResult<Vec<User>>;

    /// Finds a department by identifier.
    async fn find_department(&self, id: DepartmentId) -> DirectoryResult<Option<Department>>;
}

/// Errors returned by directory implementations.
#[derive(Debug, Clone, Error)]
pub enum DirectoryError {
    /// Persistence-layer failure.
    #[error("directory lookup failed: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl DirectoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
