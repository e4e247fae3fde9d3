//! `PostgreSQL` user directory.

use super::{
    models::{DepartmentRow, UserRow},
    run_blocking,
    schema::{departments, users},
};
use crate::config::{PgPool, PolicyConfig};
use crate::task::{
    domain::{Department, DepartmentId, DepartmentKind, Role, User, UserData, UserId, UserStatus},
    ports::{DirectoryError, DirectoryResult, UserDirectory},
};
use async_trait::async_trait;
use diesel::prelude::*;

/// Directory reading the `users` and `departments` tables.
///
/// Departments have no quality column; the flag comes from
/// [`PolicyConfig::looks_like_quality_department`].
#[derive(Debug, Clone)]
pub struct PostgresUserDirectory {
    pool: PgPool,
    policy: PolicyConfig,
}

impl PostgresUserDirectory {
    /// Creates a directory over `pool`.
    #[must_use]
    pub const fn new(pool: PgPool, policy: PolicyConfig) -> Self {
        Self { pool, policy }
    }
}

#[async_trait]
impl UserDirectory for PostgresUserDirectory {
    async fn find_user(&self, id: UserId) -> DirectoryResult<Option<User>> {
        let raw = id.value();
        let row = run_blocking(&self.pool, move |connection| {
            users::table
                .find(raw)
                .select(UserRow::as_select())
                .first(connection)
                .optional()
                .map_err(DirectoryError::persistence)
        })
        .await?;
        row.map(row_to_user).transpose()
    }

    async fn find_users(&self, ids: &[UserId]) -> DirectoryResult<Vec<User>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let raw: Vec<i64> = ids.iter().map(|id| id.value()).collect();
        let rows = run_blocking(&self.pool, move |connection| {
            users::table
                .filter(users::id.eq_any(raw))
                .order(users::id.asc())
                .select(UserRow::as_select())
                .load(connection)
                .map_err(DirectoryError::persistence)
        })
        .await?;
        rows.into_iter().map(row_to_user).collect()
    }

    async fn find_department(&self, id: DepartmentId) -> DirectoryResult<Option<Department>> {
        let raw = id.value();
        let row = run_blocking(&self.pool, move |connection| {
            departments::table
                .find(raw)
                .select(DepartmentRow::as_select())
                .first(connection)
                .optional()
                .map_err(DirectoryError::persistence)
        })
        .await?;
        row.map(|found| row_to_department(found, &self.policy))
            .transpose()
    }
}

fn row_to_user(row: UserRow) -> DirectoryResult<User> {
    let department = row
        .department_id
        .map(DepartmentId::new)
        .transpose()
        .map_err(DirectoryError::persistence)?;
    User::new(UserData {
        id: UserId::new(row.id).map_err(DirectoryError::persistence)?,
        display_name: row.display_name,
        login: row.login,
        password_hash: row.password_hash,
        role: Role::try_from(row.role.as_str()).map_err(DirectoryError::persistence)?,
        department,
        status: UserStatus::try_from(row.status.as_str()).map_err(DirectoryError::persistence)?,
    })
    .map_err(DirectoryError::persistence)
}

fn row_to_department(row: DepartmentRow, policy: &PolicyConfig) -> DirectoryResult<Department> {
    let quality = policy.looks_like_quality_department(&row.name);
    let kind = DepartmentKind::try_from(row.kind.as_str()).map_err(DirectoryError::persistence)?;
    let id = DepartmentId::new(row.id).map_err(DirectoryError::persistence)?;
    Ok(Department::new(id, row.name, kind).with_quality(quality))
}
