//! Task aggregate root and its lifecycle rules.

use super::{
    DeadlineChange, DeadlineChangeKind, DepartmentId, NewDeadlineChange, ParseValueError,
    TaskDomainError, TaskId, TaskImage, UserId, deadline::to_seconds, history::sort_newest_first,
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Task lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskStatus {
    /// Assigned and awaiting delivery.
    #[serde(rename = "PENDIENTE")]
    Pending,
    /// Delivered and awaiting review.
    #[serde(rename = "EN_REVISION")]
    InReview,
    /// Closed as done.
    #[serde(rename = "CONCLUIDA")]
    Done,
    /// Closed without completion.
    #[serde(rename = "CANCELADA")]
    Cancelled,
}

impl TaskStatus {
    /// All statuses in lifecycle order.
    pub const ALL: [Self; 4] = [Self::Pending, Self::InReview, Self::Done, Self::Cancelled];

    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDIENTE",
            Self::InReview => "EN_REVISION",
            Self::Done => "CONCLUIDA",
            Self::Cancelled => "CANCELADA",
        }
    }

    /// Returns `true` if no further transitions are allowed.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Cancelled)
    }

    /// Returns `true` if the lifecycle graph has an edge from `self` to `to`.
    #[must_use]
    pub const fn can_transition_to(self, to: Self) -> bool {
        matches!(
            (self, to),
            (Self::Pending, Self::InReview | Self::Done | Self::Cancelled)
                | (Self::InReview, Self::Pending | Self::Done | Self::Cancelled)
        )
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for TaskStatus {
    type Error = ParseValueError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_uppercase().as_str() {
            "PENDIENTE" => Ok(Self::Pending),
            "EN_REVISION" => Ok(Self::InReview),
            "CONCLUIDA" => Ok(Self::Done),
            "CANCELADA" => Ok(Self::Cancelled),
            _ => Err(ParseValueError::new("task status", value)),
        }
    }
}

/// Task urgency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Urgency {
    /// Low urgency.
    #[serde(rename = "BAJA")]
    Low,
    /// Medium urgency.
    #[serde(rename = "MEDIA")]
    #[default]
    Medium,
    /// High urgency.
    #[serde(rename = "ALTA")]
    High,
}

impl Urgency {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "BAJA",
            Self::Medium => "MEDIA",
            Self::High => "ALTA",
        }
    }

    /// Sort rank, lowest urgency first.
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::Low => 0,
            Self::Medium => 1,
            Self::High => 2,
        }
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Urgency {
    type Error = ParseValueError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_uppercase().as_str() {
            "BAJA" => Ok(Self::Low),
            "MEDIA" => Ok(Self::Medium),
            "ALTA" => Ok(Self::High),
            _ => Err(ParseValueError::new("urgency", value)),
        }
    }
}

/// Parameter object for a task that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTaskData {
    /// Task title.
    pub title: String,
    /// Free-text notes.
    pub notes: String,
    /// Normalised deadline.
    pub deadline: DateTime<Utc>,
    /// Urgency.
    pub urgency: Urgency,
    /// Owning department.
    pub department: DepartmentId,
    /// Creating user (asignador).
    pub creator: UserId,
    /// Approved responsible users.
    pub responsibles: BTreeSet<UserId>,
}

/// A validated task awaiting its store identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    title: String,
    notes: String,
    deadline: DateTime<Utc>,
    urgency: Urgency,
    department: DepartmentId,
    creator: UserId,
    responsibles: BTreeSet<UserId>,
    created_at: DateTime<Utc>,
}

impl NewTask {
    /// Validates a new task in the initial `PENDIENTE` state.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyTitle`] for a blank title and
    /// [`TaskDomainError::NoResponsibles`] when nobody is assigned.
    pub fn new(data: NewTaskData, clock: &impl Clock) -> Result<Self, TaskDomainError> {
        let title = normalise_title(&data.title)?;
        if data.responsibles.is_empty() {
            return Err(TaskDomainError::NoResponsibles);
        }
        Ok(Self {
            title,
            notes: data.notes,
            deadline: data.deadline,
            urgency: data.urgency,
            department: data.department,
            creator: data.creator,
            responsibles: data.responsibles,
            created_at: to_seconds(clock.utc()),
        })
    }

    /// Returns the title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the notes.
    #[must_use]
    pub fn notes(&self) -> &str {
        &self.notes
    }

    /// Returns the deadline.
    #[must_use]
    pub const fn deadline(&self) -> DateTime<Utc> {
        self.deadline
    }

    /// Returns the urgency.
    #[must_use]
    pub const fn urgency(&self) -> Urgency {
        self.urgency
    }

    /// Returns the owning department.
    #[must_use]
    pub const fn department(&self) -> DepartmentId {
        self.department
    }

    /// Returns the creator.
    #[must_use]
    pub const fn creator(&self) -> UserId {
        self.creator
    }

    /// Returns the responsible set.
    #[must_use]
    pub const fn responsibles(&self) -> &BTreeSet<UserId> {
        &self.responsibles
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Assigns the store identifier, producing the aggregate.
    #[must_use]
    pub fn into_task(self, id: TaskId) -> Task {
        Task {
            id,
            title: self.title,
            notes: self.notes,
            status: TaskStatus::Pending,
            urgency: self.urgency,
            department: self.department,
            creator: self.creator,
            responsibles: self.responsibles,
            deadline: self.deadline,
            created_at: self.created_at,
            updated_at: self.created_at,
            completed_at: None,
            delivered_at: None,
            delivery_comment: None,
            reviewed_at: None,
            review_feedback: None,
            history: Vec::new(),
            images: Vec::new(),
        }
    }
}

/// Parameter object for reconstructing a persisted task aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTaskData {
    /// Task identifier.
    pub id: TaskId,
    /// Title.
    pub title: String,
    /// Notes.
    pub notes: String,
    /// Lifecycle status.
    pub status: TaskStatus,
    /// Urgency.
    pub urgency: Urgency,
    /// Owning department.
    pub department: DepartmentId,
    /// Creator.
    pub creator: UserId,
    /// Responsible users.
    pub responsibles: BTreeSet<UserId>,
    /// Deadline.
    pub deadline: DateTime<Utc>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last mutation timestamp.
    pub updated_at: DateTime<Utc>,
    /// Completion timestamp.
    pub completed_at: Option<DateTime<Utc>>,
    /// Delivery timestamp.
    pub delivered_at: Option<DateTime<Utc>>,
    /// Delivery comment.
    pub delivery_comment: Option<String>,
    /// Review timestamp.
    pub reviewed_at: Option<DateTime<Utc>>,
    /// Review feedback.
    pub review_feedback: Option<String>,
    /// Deadline history.
    pub history: Vec<DeadlineChange>,
    /// Attached images.
    pub images: Vec<TaskImage>,
}

/// Task aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    title: String,
    notes: String,
    status: TaskStatus,
    urgency: Urgency,
    department: DepartmentId,
    creator: UserId,
    responsibles: BTreeSet<UserId>,
    deadline: DateTime<Utc>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    delivered_at: Option<DateTime<Utc>>,
    delivery_comment: Option<String>,
    reviewed_at: Option<DateTime<Utc>>,
    review_feedback: Option<String>,
    history: Vec<DeadlineChange>,
    images: Vec<TaskImage>,
}

impl Task {
    /// Reconstructs a task from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskData) -> Self {
        let mut history = data.history;
        sort_newest_first(&mut history);
        Self {
            id: data.id,
            title: data.title,
            notes: data.notes,
            status: data.status,
            urgency: data.urgency,
            department: data.department,
            creator: data.creator,
            responsibles: data.responsibles,
            deadline: data.deadline,
            created_at: data.created_at,
            updated_at: data.updated_at,
            completed_at: data.completed_at,
            delivered_at: data.delivered_at,
            delivery_comment: data.delivery_comment,
            reviewed_at: data.reviewed_at,
            review_feedback: data.review_feedback,
            history,
            images: data.images,
        }
    }

    /// Decomposes the aggregate into its persisted form.
    #[must_use]
    pub fn into_persisted(self) -> PersistedTaskData {
        PersistedTaskData {
            id: self.id,
            title: self.title,
            notes: self.notes,
            status: self.status,
            urgency: self.urgency,
            department: self.department,
            creator: self.creator,
            responsibles: self.responsibles,
            deadline: self.deadline,
            created_at: self.created_at,
            updated_at: self.updated_at,
            completed_at: self.completed_at,
            delivered_at: self.delivered_at,
            delivery_comment: self.delivery_comment,
            reviewed_at: self.reviewed_at,
            review_feedback: self.review_feedback,
            history: self.history,
            images: self.images,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the notes.
    #[must_use]
    pub fn notes(&self) -> &str {
        &self.notes
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns the urgency.
    #[must_use]
    pub const fn urgency(&self) -> Urgency {
        self.urgency
    }

    /// Returns the owning department.
    #[must_use]
    pub const fn department(&self) -> DepartmentId {
        self.department
    }

    /// Returns the creator (asignador).
    #[must_use]
    pub const fn creator(&self) -> UserId {
        self.creator
    }

    /// Returns the responsible set.
    #[must_use]
    pub const fn responsibles(&self) -> &BTreeSet<UserId> {
        &self.responsibles
    }

    /// Returns `true` if `user` is a listed responsible.
    #[must_use]
    pub fn is_responsible(&self, user: UserId) -> bool {
        self.responsibles.contains(&user)
    }

    /// Returns the deadline.
    #[must_use]
    pub const fn deadline(&self) -> DateTime<Utc> {
        self.deadline
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the last mutation timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns the completion timestamp.
    #[must_use]
    pub const fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Returns the delivery timestamp.
    #[must_use]
    pub const fn delivered_at(&self) -> Option<DateTime<Utc>> {
        self.delivered_at
    }

    /// Returns the delivery comment.
    #[must_use]
    pub fn delivery_comment(&self) -> Option<&str> {
        self.delivery_comment.as_deref()
    }

    /// Returns the review timestamp.
    #[must_use]
    pub const fn reviewed_at(&self) -> Option<DateTime<Utc>> {
        self.reviewed_at
    }

    /// Returns the review feedback.
    #[must_use]
    pub fn review_feedback(&self) -> Option<&str> {
        self.review_feedback.as_deref()
    }

    /// Returns the deadline history, newest first.
    #[must_use]
    pub fn history(&self) -> &[DeadlineChange] {
        &self.history
    }

    /// Returns the attached images.
    #[must_use]
    pub fn images(&self) -> &[TaskImage] {
        &self.images
    }

    /// Returns `true` if the title carries the sensitive marker.
    #[must_use]
    pub fn is_sensitive(&self, marker: &str) -> bool {
        !marker.is_empty() && self.title.starts_with(marker)
    }

    /// Marks the task as delivered by a responsible.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidStateTransition`] unless the task is
    /// `PENDIENTE`.
    pub fn deliver(
        &mut self,
        comment: Option<String>,
        clock: &impl Clock,
    ) -> Result<(), TaskDomainError> {
        self.require_status(TaskStatus::Pending, TaskStatus::InReview)?;
        let now = to_seconds(clock.utc());
        self.status = TaskStatus::InReview;
        self.delivered_at = Some(now);
        self.delivery_comment = comment;
        self.updated_at = now;
        Ok(())
    }

    /// Accepts the pending delivery and closes the task.
    ///
    /// The delivery timestamp is kept as the factual delivery time.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidStateTransition`] unless the task is
    /// `EN_REVISION`.
    pub fn approve(
        &mut self,
        feedback: Option<String>,
        clock: &impl Clock,
    ) -> Result<(), TaskDomainError> {
        self.require_status(TaskStatus::InReview, TaskStatus::Done)?;
        let now = to_seconds(clock.utc());
        self.status = TaskStatus::Done;
        self.completed_at = Some(now);
        self.reviewed_at = Some(now);
        self.review_feedback = feedback;
        self.updated_at = now;
        Ok(())
    }

    /// Rejects the pending delivery and reopens the task.
    ///
    /// Clears the delivery timestamp. When `extension` is supplied the
    /// deadline moves and the returned history entry must be persisted with
    /// the task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidStateTransition`] unless the task is
    /// `EN_REVISION`.
    pub fn reject(
        &mut self,
        feedback: Option<String>,
        extension: Option<(DateTime<Utc>, UserId)>,
        clock: &impl Clock,
    ) -> Result<Option<NewDeadlineChange>, TaskDomainError> {
        self.require_status(TaskStatus::InReview, TaskStatus::Pending)?;
        let now = to_seconds(clock.utc());
        self.status = TaskStatus::Pending;
        self.delivered_at = None;
        self.reviewed_at = Some(now);
        self.review_feedback.clone_from(&feedback);
        self.updated_at = now;
        Ok(extension.map(|(new_deadline, actor)| {
            self.move_deadline(
                new_deadline,
                feedback,
                DeadlineChangeKind::RejectionExtension,
                actor,
                now,
            )
        }))
    }

    /// Closes the task directly, bypassing review.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidStateTransition`] for terminal tasks.
    pub fn complete(&mut self, clock: &impl Clock) -> Result<(), TaskDomainError> {
        self.transition(TaskStatus::Done)?;
        let now = to_seconds(clock.utc());
        self.completed_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    /// Cancels the task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidStateTransition`] for terminal tasks.
    pub fn cancel(&mut self, clock: &impl Clock) -> Result<(), TaskDomainError> {
        self.transition(TaskStatus::Cancelled)?;
        self.completed_at = None;
        self.updated_at = to_seconds(clock.utc());
        Ok(())
    }

    /// Sets the status directly as part of an edit.
    ///
    /// Entering `CONCLUIDA` stamps the completion time; leaving it clears the
    /// stamp. Returning to `PENDIENTE` clears the delivery time, as a
    /// rejection does. `EN_REVISION` is entered only through
    /// [`Task::deliver`]. Returns `false` when the status is unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidStateTransition`] when the lifecycle
    /// graph has no such edge or the target is `EN_REVISION`.
    pub fn set_status(
        &mut self,
        status: TaskStatus,
        clock: &impl Clock,
    ) -> Result<bool, TaskDomainError> {
        if status == self.status {
            return Ok(false);
        }
        if status == TaskStatus::InReview {
            return Err(self.invalid_transition(status));
        }
        self.transition(status)?;
        let now = to_seconds(clock.utc());
        self.completed_at = (status == TaskStatus::Done).then_some(now);
        if status == TaskStatus::Pending {
            self.delivered_at = None;
        }
        self.updated_at = now;
        Ok(true)
    }

    /// Moves the deadline and returns the history entry to persist.
    ///
    /// The entry is produced even when the deadline does not change.
    pub fn reschedule(
        &mut self,
        new_deadline: DateTime<Utc>,
        reason: Option<String>,
        kind: DeadlineChangeKind,
        actor: UserId,
        clock: &impl Clock,
    ) -> NewDeadlineChange {
        let now = to_seconds(clock.utc());
        self.updated_at = now;
        self.move_deadline(new_deadline, reason, kind, actor, now)
    }

    /// Replaces the title.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyTitle`] for a blank title.
    pub fn rename(&mut self, title: &str, clock: &impl Clock) -> Result<(), TaskDomainError> {
        self.title = normalise_title(title)?;
        self.touch(clock);
        Ok(())
    }

    /// Replaces the notes.
    pub fn set_notes(&mut self, notes: String, clock: &impl Clock) {
        self.notes = notes;
        self.touch(clock);
    }

    /// Replaces the urgency.
    pub fn set_urgency(&mut self, urgency: Urgency, clock: &impl Clock) {
        self.urgency = urgency;
        self.touch(clock);
    }

    /// Moves the task to another department.
    pub fn move_to_department(&mut self, department: DepartmentId, clock: &impl Clock) {
        self.department = department;
        self.touch(clock);
    }

    /// Replaces the responsible set wholesale and returns newly added users.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::NoResponsibles`] for an empty set.
    pub fn replace_responsibles(
        &mut self,
        responsibles: BTreeSet<UserId>,
        clock: &impl Clock,
    ) -> Result<BTreeSet<UserId>, TaskDomainError> {
        if responsibles.is_empty() {
            return Err(TaskDomainError::NoResponsibles);
        }
        let added = responsibles
            .difference(&self.responsibles)
            .copied()
            .collect();
        self.responsibles = responsibles;
        self.touch(clock);
        Ok(added)
    }

    fn move_deadline(
        &mut self,
        new_deadline: DateTime<Utc>,
        reason: Option<String>,
        kind: DeadlineChangeKind,
        actor: UserId,
        now: DateTime<Utc>,
    ) -> NewDeadlineChange {
        let previous = self.deadline;
        self.deadline = new_deadline;
        NewDeadlineChange {
            previous,
            new: new_deadline,
            reason,
            kind,
            actor,
            changed_at: now,
        }
    }

    fn require_status(&self, expected: TaskStatus, to: TaskStatus) -> Result<(), TaskDomainError> {
        if self.status != expected {
            return Err(self.invalid_transition(to));
        }
        Ok(())
    }

    fn transition(&mut self, to: TaskStatus) -> Result<(), TaskDomainError> {
        if !self.status.can_transition_to(to) {
            return Err(self.invalid_transition(to));
        }
        self.status = to;
        Ok(())
    }

    const fn invalid_transition(&self, to: TaskStatus) -> TaskDomainError {
        TaskDomainError::InvalidStateTransition {
            task_id: self.id,
            from: self.status,
            to,
        }
    }

    fn touch(&mut self, clock: &impl Clock) {
        self.updated_at = to_seconds(clock.utc());
    }
}

fn normalise_title(title: &str) -> Result<String, TaskDomainError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(TaskDomainError::EmptyTitle);
    }
    Ok(trimmed.to_owned())
}
