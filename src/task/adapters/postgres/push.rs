//! `PostgreSQL` push registration store.

use super::{models::PushRegistrationRow, run_blocking, schema::push_registrations};
use crate::config::PgPool;
use crate::task::{
    domain::{PushRegistration, RegistrationId, UserId},
    ports::{PushRegistry, PushRegistryError},
};
use async_trait::async_trait;
use diesel::prelude::*;
use diesel::upsert::excluded;

/// Push registry over the `push_registrations` table.
#[derive(Debug, Clone)]
pub struct PostgresPushRegistry {
    pool: PgPool,
}

impl PostgresPushRegistry {
    /// Creates a registry over `pool`.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Stores a registration. An existing endpoint is handed to the new
    /// owner with fresh keys.
    ///
    /// # Errors
    ///
    /// Returns [`PushRegistryError::Persistence`] on storage failure.
    pub async fn register(&self, registration: &PushRegistration) -> Result<(), PushRegistryError> {
        let row = PushRegistrationRow {
            id: registration.id.into_inner(),
            user_id: registration.user.value(),
            endpoint: registration.endpoint.clone(),
            p256dh: registration.p256dh.clone(),
            auth: registration.auth.clone(),
        };
        run_blocking(&self.pool, move |connection| {
            diesel::insert_into(push_registrations::table)
                .values(&row)
                .on_conflict(push_registrations::endpoint)
                .do_update()
                .set((
                    push_registrations::user_id.eq(excluded(push_registrations::user_id)),
                    push_registrations::p256dh.eq(excluded(push_registrations::p256dh)),
                    push_registrations::auth.eq(excluded(push_registrations::auth)),
                ))
                .execute(connection)
                .map(drop)
                .map_err(PushRegistryError::persistence)
        })
        .await
    }
}

#[async_trait]
impl PushRegistry for PostgresPushRegistry {
    async fn registrations_for(
        &self,
        users: &[UserId],
    ) -> Result<Vec<PushRegistration>, PushRegistryError> {
        if users.is_empty() {
            return Ok(Vec::new());
        }
        let owners: Vec<i64> = users.iter().map(|user| user.value()).collect();
        let rows = run_blocking(&self.pool, move |connection| {
            push_registrations::table
                .filter(push_registrations::user_id.eq_any(owners))
                .select(PushRegistrationRow::as_select())
                .load(connection)
                .map_err(PushRegistryError::persistence)
        })
        .await?;
        rows.into_iter().map(row_to_registration).collect()
    }

    async fn remove(&self, id: RegistrationId) -> Result<(), PushRegistryError> {
        let raw = id.into_inner();
        run_blocking(&self.pool, move |connection| {
            diesel::delete(push_registrations::table.find(raw))
                .execute(connection)
                .map(drop)
                .map_err(PushRegistryError::persistence)
        })
        .await
    }
}

fn row_to_registration(row: PushRegistrationRow) -> Result<PushRegistration, PushRegistryError> {
    Ok(PushRegistration {
        id: RegistrationId::from_uuid(row.id),
        user: UserId::new(row.user_id).map_err(PushRegistryError::persistence)?,
        endpoint: row.endpoint,
        p256dh: row.p256dh,
        auth: row.auth,
    })
}
