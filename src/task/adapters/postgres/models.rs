//! Diesel row models for task persistence.

use super::schema::{
    audit_entries, deadline_changes, departments, push_registrations, task_images,
    task_responsibles, tasks, users,
};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;

/// Query result row for task records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TaskRow {
    /// Task identifier.
    pub id: i64,
    /// Title.
    pub title: String,
    /// Notes.
    pub notes: String,
    /// Lifecycle status.
    pub status: String,
    /// Urgency.
    pub urgency: String,
    /// Owning department.
    pub department_id: i64,
    /// Creating user.
    pub creator_id: i64,
    /// Deadline instant.
    pub deadline: DateTime<Utc>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Approval or completion timestamp.
    pub completed_at: Option<DateTime<Utc>>,
    /// Delivery timestamp.
    pub delivered_at: Option<DateTime<Utc>>,
    /// Delivery comment.
    pub delivery_comment: Option<String>,
    /// Review timestamp.
    pub reviewed_at: Option<DateTime<Utc>>,
    /// Review feedback.
    pub review_feedback: Option<String>,
}

/// Insert model for task records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = tasks)]
pub struct NewTaskRow {
    /// Title.
    pub title: String,
    /// Notes.
    pub notes: String,
    /// Lifecycle status.
    pub status: String,
    /// Urgency.
    pub urgency: String,
    /// Owning department.
    pub department_id: i64,
    /// Creating user.
    pub creator_id: i64,
    /// Deadline instant.
    pub deadline: DateTime<Utc>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Scalar task columns written by an update. `None` clears a column.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = tasks)]
#[diesel(treat_none_as_null = true)]
pub struct TaskChangeset {
    /// Title.
    pub title: String,
    /// Notes.
    pub notes: String,
    /// Lifecycle status.
    pub status: String,
    /// Urgency.
    pub urgency: String,
    /// Owning department.
    pub department_id: i64,
    /// Deadline instant.
    pub deadline: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Approval or completion timestamp.
    pub completed_at: Option<DateTime<Utc>>,
    /// Delivery timestamp.
    pub delivered_at: Option<DateTime<Utc>>,
    /// Delivery comment.
    pub delivery_comment: Option<String>,
    /// Review timestamp.
    pub reviewed_at: Option<DateTime<Utc>>,
    /// Review feedback.
    pub review_feedback: Option<String>,
}

/// Responsible link row.
#[derive(Debug, Clone, Copy, Queryable, Selectable, Insertable)]
#[diesel(table_name = task_responsibles)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ResponsibleRow {
    /// Task identifier.
    pub task_id: i64,
    /// Responsible user.
    pub user_id: i64,
}

/// Query result row for deadline history.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = deadline_changes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct DeadlineChangeRow {
    /// Change identifier.
    pub id: i64,
    /// Task identifier.
    pub task_id: i64,
    /// Deadline before the change.
    pub previous_deadline: DateTime<Utc>,
    /// Deadline after the change.
    pub new_deadline: DateTime<Utc>,
    /// Optional reason.
    pub reason: Option<String>,
    /// Change kind.
    pub kind: String,
    /// Acting user.
    pub changed_by: i64,
    /// Change timestamp.
    pub changed_at: DateTime<Utc>,
}

/// Insert model for deadline history.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = deadline_changes)]
pub struct NewDeadlineChangeRow {
    /// Task identifier.
    pub task_id: i64,
    /// Deadline before the change.
    pub previous_deadline: DateTime<Utc>,
    /// Deadline after the change.
    pub new_deadline: DateTime<Utc>,
    /// Optional reason.
    pub reason: Option<String>,
    /// Change kind.
    pub kind: String,
    /// Acting user.
    pub changed_by: i64,
    /// Change timestamp.
    pub changed_at: DateTime<Utc>,
}

/// Query result row for task images.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = task_images)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ImageRow {
    /// Image identifier.
    pub id: i64,
    /// Task identifier.
    pub task_id: i64,
    /// Storage URL.
    pub url: String,
    /// Upload timestamp.
    pub created_at: DateTime<Utc>,
}

/// Insert model for task images.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = task_images)]
pub struct NewImageRow {
    /// Task identifier.
    pub task_id: i64,
    /// Storage URL.
    pub url: String,
    /// Upload timestamp.
    pub created_at: DateTime<Utc>,
}

/// Query result row for users.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserRow {
    /// User identifier.
    pub id: i64,
    /// Display name.
    pub display_name: String,
    /// Login.
    pub login: String,
    /// Credential hash.
    pub password_hash: String,
    /// Role name.
    pub role: String,
    /// Department, when any.
    pub department_id: Option<i64>,
    /// Account status.
    pub status: String,
}

/// Query result row for departments.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = departments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct DepartmentRow {
    /// Department identifier.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Department kind.
    pub kind: String,
}

/// Insert model for audit entries.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = audit_entries)]
pub struct NewAuditRow {
    /// Entry identifier.
    pub id: uuid::Uuid,
    /// Action code.
    pub action: String,
    /// Description.
    pub description: String,
    /// Acting user.
    pub actor_id: Option<i64>,
    /// Structured details.
    pub details: Value,
    /// Entry timestamp.
    pub created_at: DateTime<Utc>,
}

/// Query result and insert row for push registrations.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = push_registrations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PushRegistrationRow {
    /// Registration identifier.
    pub id: uuid::Uuid,
    /// Owning user.
    pub user_id: i64,
    /// Push service endpoint.
    pub endpoint: String,
    /// Client public key.
    pub p256dh: String,
    /// Client auth secret.
    pub auth: String,
}
