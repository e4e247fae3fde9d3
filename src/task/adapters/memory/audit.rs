//! In-memory audit trail.

use super::poisoned;
use crate::task::{
    domain::AuditEntry,
    ports::{AuditLog, AuditLogError},
};
use async_trait::async_trait;
use std::sync::{Arc, RwLock};

/// Append-only audit log held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAuditLog {
    entries: Arc<RwLock<Vec<AuditEntry>>>,
}

impl InMemoryAuditLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every entry in append order.
    ///
    /// # Errors
    ///
    /// Returns [`AuditLogError::Write`] if the lock is poisoned.
    pub fn entries(&self) -> Result<Vec<AuditEntry>, AuditLogError> {
        self.entries
            .read()
            .map(|entries| entries.clone())
            .map_err(|err| AuditLogError::write(poisoned(&err)))
    }
}

#[async_trait]
impl AuditLog for InMemoryAuditLog {
    async fn append(&self, entry: &AuditEntry) -> Result<(), AuditLogError> {
        self.entries
            .write()
            .map_err(|err| AuditLogError::write(poisoned(&err)))?
            .push(entry.clone());
        Ok(())
    }
}
