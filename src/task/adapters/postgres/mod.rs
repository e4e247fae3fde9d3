//! `PostgreSQL` adapters for task persistence, the user directory, the
//! audit trail, and push registrations.
//!
//! Diesel is synchronous, so every adapter runs its work on the blocking
//! pool through [`run_blocking`].

mod audit;
mod directory;
mod models;
mod push;
mod repository;
mod schema;

pub use audit::PostgresAuditLog;
pub use directory::PostgresUserDirectory;
pub use push::PostgresPushRegistry;
pub use repository::PostgresTaskRepository;

use crate::config::PgPool;
use crate::task::ports::{AuditLogError, DirectoryError, PushRegistryError, TaskRepositoryError};
use diesel::pg::PgConnection;

/// Port errors able to carry an infrastructure failure.
trait StoreFailure: Sized {
    fn store_failure(err: impl std::error::Error + Send + Sync + 'static) -> Self;
}

impl StoreFailure for TaskRepositoryError {
    fn store_failure(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::persistence(err)
    }
}

impl StoreFailure for DirectoryError {
    fn store_failure(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::persistence(err)
    }
}

impl StoreFailure for AuditLogError {
    fn store_failure(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::write(err)
    }
}

impl StoreFailure for PushRegistryError {
    fn store_failure(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::persistence(err)
    }
}

/// Checks out a pooled connection and runs `f` on the blocking pool.
async fn run_blocking<F, T, E>(pool: &PgPool, f: F) -> Result<T, E>
where
    F: FnOnce(&mut PgConnection) -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: StoreFailure + Send + 'static,
{
    let checkout = pool.clone();
    tokio::task::spawn_blocking(move || {
        let mut connection = checkout.get().map_err(E::store_failure)?;
        f(&mut connection)
    })
    .await
    .map_err(E::store_failure)?
}
