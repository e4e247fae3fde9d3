//! Port contracts for the task core.
//!
//! Ports define infrastructure-agnostic interfaces used by task services.

pub mod audit;
pub mod directory;
pub mod notification;
pub mod repository;
pub mod storage;

pub use audit::{AuditLog, AuditLogError};
pub use directory::{DirectoryError, DirectoryResult, UserDirectory};
pub use notification::{
    NotificationSink, PushError, PushRegistry, PushRegistryError, PushTransport,
};
pub use repository::{
    PageRequest, TaskPage, TaskQuery, TaskRepository, TaskRepositoryError, TaskRepositoryResult,
    TaskUpdate,
};
pub use storage::{ObjectStorage, StorageError};
