//! Append-only audit log port.

use crate::task::domain::AuditEntry;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Audit trail contract.
///
/// Every call appends a new entry; identical inputs are never merged.
#[async_trait]
pub trait AuditLog: Send + Sync {
    /// Appends one entry.
    async fn append(&self, entry: &AuditEntry) -> Result<(), AuditLogError>;
}

/// Errors returned by audit log implementations.
#[derive(Debug, Clone, Error)]
pub enum AuditLogError {
    /// The entry could not be written.
    #[error("audit write failed: {0}")]
    Write(Arc<dyn std::error::Error + Send + Sync>),
}

impl AuditLogError {
    /// Wraps a write error.
    pub fn write(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Write(Arc::new(err))
    }
}
