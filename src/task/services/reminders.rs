//! Deadline reminder evaluation for an external timer.
//!
//! Nothing records that a reminder went out. Re-running an evaluation
//! re-sends every reminder that still applies.

use super::effects::{IntentBuilder, audience, submit};
use super::error::TaskServiceResult;
use super::templates::NotificationTemplates;
use crate::config::PolicyConfig;
use crate::task::{
    domain::{DayWindow, NotificationKind, Task, TaskStatus, UserId},
    policy::{Clause, TaskPredicate},
    ports::{NotificationSink, TaskRepository, UserDirectory},
};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Evaluates due-today and overdue reminders.
#[derive(Clone)]
pub struct ReminderService<R, D>
where
    R: TaskRepository,
    D: UserDirectory,
{
    repository: Arc<R>,
    directory: Arc<D>,
    notifications: Arc<dyn NotificationSink>,
    policy: PolicyConfig,
    templates: Arc<NotificationTemplates>,
}

impl<R, D> ReminderService<R, D>
where
    R: TaskRepository,
    D: UserDirectory,
{
    /// Creates a reminder service.
    #[must_use]
    pub fn new(
        repository: Arc<R>,
        directory: Arc<D>,
        notifications: Arc<dyn NotificationSink>,
        policy: PolicyConfig,
    ) -> Self {
        Self {
            repository,
            directory,
            notifications,
            policy,
            templates: Arc::new(NotificationTemplates::new()),
        }
    }

    /// Reminds responsibles of open tasks due during the business day
    /// containing `now`. Returns the number of intents submitted.
    ///
    /// # Errors
    ///
    /// Returns an error when the task query fails.
    pub async fn send_due_today(&self, now: DateTime<Utc>) -> TaskServiceResult<usize> {
        let today = self.policy.calendar().today(now);
        let predicate = TaskPredicate::all()
            .and(Clause::StatusIn(vec![TaskStatus::Pending, TaskStatus::InReview]))
            .and(Clause::DeadlineFrom(today.start))
            .and(Clause::DeadlineUntil(today.end));
        let due = self.matching(&predicate, |task| today.contains(task.deadline())).await?;
        Ok(self.remind(NotificationKind::DueToday, &due, today).await)
    }

    /// Reminds responsibles of `PENDIENTE` tasks whose deadline passed
    /// before the business day containing `now`. Returns the number of
    /// intents submitted.
    ///
    /// # Errors
    ///
    /// Returns an error when the task query fails.
    pub async fn send_overdue(&self, now: DateTime<Utc>) -> TaskServiceResult<usize> {
        let today = self.policy.calendar().today(now);
        let predicate = TaskPredicate::all()
            .and(Clause::StatusIn(vec![TaskStatus::Pending]))
            .and(Clause::DeadlineUntil(today.start));
        let overdue = self.matching(&predicate, |task| task.deadline() < today.start).await?;
        Ok(self.remind(NotificationKind::Overdue, &overdue, today).await)
    }

    async fn matching(
        &self,
        predicate: &TaskPredicate,
        keep: impl Fn(&Task) -> bool,
    ) -> TaskServiceResult<Vec<Task>> {
        let found = self.repository.find_matching(predicate).await?;
        Ok(found.into_iter().filter(|task| keep(task)).collect())
    }

    async fn remind(&self, kind: NotificationKind, tasks: &[Task], today: DayWindow) -> usize {
        let intents = IntentBuilder::new(&self.templates, &self.policy);
        let mut submitted = 0_usize;
        for task in tasks {
            let recipients: Vec<UserId> = task.responsibles().iter().copied().collect();
            let users = match self.directory.find_users(&recipients).await {
                Ok(found) => found,
                Err(err) => {
                    tracing::error!(task_id = %task.id(), error = %err, "reminder recipients lookup failed");
                    continue;
                }
            };
            let intent = intents.build(kind, task, audience(&users, None), &intents.context(task));
            if intent.is_some() {
                submitted = submitted.saturating_add(1);
            }
            submit(self.notifications.as_ref(), intent);
        }
        tracing::info!(
            kind = kind.as_str(),
            window_start = %today.start,
            candidates = tasks.len(),
            submitted,
            "reminders evaluated"
        );
        submitted
    }
}
