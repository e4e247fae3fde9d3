//! Repository port for task persistence and predicate-driven lookup.

use crate::task::{
    domain::{
        ImageId, ImageUrl, NewDeadlineChange, NewTask, NewTaskImage, Task, TaskId, TaskImage,
        TaskStatus, UserId,
    },
    policy::{TaskPredicate, TaskSort},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use thiserror::Error;

/// Result type for task repository operations.
pub type TaskRepositoryResult<T> = Result<T, TaskRepositoryError>;

/// Page selection for list queries.
///
/// Deserialised values are clamped the same way as [`PageRequest::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawPageRequest")]
pub struct PageRequest {
    page: u32,
    per_page: u32,
}

#[derive(Deserialize)]
struct RawPageRequest {
    #[serde(default = "first_page")]
    page: u32,
    #[serde(default = "default_per_page")]
    per_page: u32,
}

const fn first_page() -> u32 {
    1
}

const fn default_per_page() -> u32 {
    PageRequest::DEFAULT_PER_PAGE
}

impl From<RawPageRequest> for PageRequest {
    fn from(raw: RawPageRequest) -> Self {
        Self::new(raw.page, raw.per_page)
    }
}

impl PageRequest {
    /// Largest accepted page size.
    pub const MAX_PER_PAGE: u32 = 100;
    /// Page size used when none is requested.
    pub const DEFAULT_PER_PAGE: u32 = 20;

    /// Creates a page request, clamping to `1..` pages and
    /// `1..=MAX_PER_PAGE` items.
    #[must_use]
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.clamp(1, Self::MAX_PER_PAGE),
        }
    }

    /// One-based page number.
    #[must_use]
    pub const fn page(self) -> u32 {
        self.page
    }

    /// Items per page.
    #[must_use]
    pub const fn per_page(self) -> u32 {
        self.per_page
    }

    /// Number of items skipped before this page.
    #[must_use]
    pub fn offset(self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.per_page)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1, Self::DEFAULT_PER_PAGE)
    }
}

/// A list query: visibility predicate, ordering, and page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskQuery {
    /// Rows outside this predicate are never read.
    pub predicate: TaskPredicate,
    /// Optional ordering; id-descending otherwise.
    pub sort: Option<TaskSort>,
    /// Page selection.
    pub page: PageRequest,
}

/// One page of tasks plus the total match count, read from one snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskPage {
    /// Tasks on this page.
    pub items: Vec<Task>,
    /// Total tasks matching the predicate.
    pub total: u64,
    /// One-based page number.
    pub page: u32,
    /// Items per page.
    pub per_page: u32,
}

/// An atomic change set for an existing task.
///
/// Adapters write the task's scalar fields, then the optional responsible
/// replacement, then the appended history and images, all in one
/// transaction. Nothing is written unless the stored status still equals
/// `expected_status`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskUpdate {
    /// Status the task had when it was loaded.
    pub expected_status: TaskStatus,
    /// The task with its new scalar state.
    pub task: Task,
    /// Replacement responsible set, when it changed.
    pub responsibles: Option<BTreeSet<UserId>>,
    /// History entries to append.
    pub history: Vec<NewDeadlineChange>,
    /// Images to attach.
    pub images: Vec<NewTaskImage>,
}

impl TaskUpdate {
    /// A change set writing only scalar fields, guarded by the status the
    /// task was loaded with.
    #[must_use]
    pub const fn scalar(expected_status: TaskStatus, task: Task) -> Self {
        Self {
            expected_status,
            task,
            responsibles: None,
            history: Vec::new(),
            images: Vec::new(),
        }
    }

    /// Replaces the responsible set.
    #[must_use]
    pub fn with_responsibles(mut self, responsibles: BTreeSet<UserId>) -> Self {
        self.responsibles = Some(responsibles);
        self
    }

    /// Appends a history entry.
    #[must_use]
    pub fn with_history(mut self, change: NewDeadlineChange) -> Self {
        self.history.push(change);
        self
    }

    /// Attaches images uploaded at `uploaded_at`.
    #[must_use]
    pub fn with_images(
        mut self,
        images: impl IntoIterator<Item = ImageUrl>,
        uploaded_at: DateTime<Utc>,
    ) -> Self {
        self.images
            .extend(images.into_iter().map(|url| NewTaskImage { url, uploaded_at }));
        self
    }
}

/// Task persistence contract.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Stores a new task and its responsible rows atomically, returning the
    /// aggregate with its assigned identifier.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::Conflict`] on a uniqueness violation
    /// and [`TaskRepositoryError::Persistence`] on storage failure.
    async fn create(&self, task: NewTask) -> TaskRepositoryResult<Task>;

    /// Applies a change set atomically and returns the reloaded task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] when the task does not exist
    /// and [`TaskRepositoryError::StatusChanged`] when its stored status no
    /// longer equals [`TaskUpdate::expected_status`].
    async fn apply(&self, update: TaskUpdate) -> TaskRepositoryResult<Task>;

    /// Finds a task by identifier, with responsibles, history, and images.
    ///
    /// Returns `None` when the task does not exist.
    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>>;

    /// Returns one page of tasks matching the query.
    async fn list(&self, query: &TaskQuery) -> TaskRepositoryResult<TaskPage>;

    /// Returns every task matching the predicate, id-descending.
    async fn find_matching(&self, predicate: &TaskPredicate) -> TaskRepositoryResult<Vec<Task>>;

    /// Finds an image by identifier.
    async fn find_image(&self, id: ImageId) -> TaskRepositoryResult<Option<TaskImage>>;

    /// Deletes an image row.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::ImageNotFound`] when it does not exist.
    async fn delete_image(&self, id: ImageId) -> TaskRepositoryResult<()>;
}

/// Errors returned by task repository implementations.
#[derive(Debug, Clone, Error)]
pub enum TaskRepositoryError {
    /// The task was not found.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// The image was not found.
    #[error("image not found: {0}")]
    ImageNotFound(ImageId),

    /// The task's status moved since it was loaded; nothing was written.
    #[error("task {id} is no longer {expected}")]
    StatusChanged {
        /// Task that was not written.
        id: TaskId,
        /// Status the writer expected.
        expected: TaskStatus,
    },

    /// A uniqueness or foreign-key constraint rejected the write.
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl TaskRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
