//! `PostgreSQL` audit trail.

use super::{models::NewAuditRow, run_blocking, schema::audit_entries};
use crate::config::PgPool;
use crate::task::{
    domain::AuditEntry,
    ports::{AuditLog, AuditLogError},
};
use async_trait::async_trait;
use diesel::prelude::*;

/// Audit log appending to the `audit_entries` table.
#[derive(Debug, Clone)]
pub struct PostgresAuditLog {
    pool: PgPool,
}

impl PostgresAuditLog {
    /// Creates an audit log over `pool`.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditLog for PostgresAuditLog {
    async fn append(&self, entry: &AuditEntry) -> Result<(), AuditLogError> {
        let row = NewAuditRow {
            id: entry.id.into_inner(),
            action: entry.action.as_str().to_owned(),
            description: entry.description.clone(),
            actor_id: entry.actor.map(|actor| actor.value()),
            details: entry.details.clone(),
            created_at: entry.timestamp,
        };
        run_blocking(&self.pool, move |connection| {
            diesel::insert_into(audit_entries::table)
                .values(&row)
                .execute(connection)
                .map(drop)
                .map_err(AuditLogError::write)
        })
        .await
    }
}
