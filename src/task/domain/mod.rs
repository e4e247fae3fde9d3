//! Domain model for departmental task assignment.
//!
//! The domain covers users and departments, the task aggregate with its
//! review lifecycle, deadline history, images, audit entries, and
//! notification intents. Infrastructure concerns stay outside.

mod audit;
pub mod deadline;
mod error;
pub(crate) mod history;
mod ids;
mod image;
mod notification;
mod principal;
mod task;

pub use audit::{AuditAction, AuditEntry, StorageCleanup};
pub use deadline::{BusinessCalendar, DayWindow};
pub use error::{ParseValueError, TaskDomainError};
pub use history::{DeadlineChange, DeadlineChangeKind, NewDeadlineChange};
pub use ids::{
    AuditEntryId, DeadlineChangeId, DepartmentId, ImageId, RegistrationId, TaskId, UserId,
};
pub use image::{ImageUrl, NewTaskImage, TaskImage};
pub use notification::{
    NotificationIntent, NotificationKind, PushData, PushPayload, PushRegistration,
};
pub use principal::{
    Department, DepartmentKind, DepartmentMembership, Principal, Role, User, UserData, UserStatus,
};
pub use task::{NewTask, NewTaskData, PersistedTaskData, Task, TaskStatus, Urgency};
