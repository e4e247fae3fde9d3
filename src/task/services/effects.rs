//! Post-mutation side effects: audit entries and notification intents.
//!
//! Both run only after the primary write is durable and neither can fail the
//! operation that triggered them.

use super::templates::{NotificationContext, NotificationTemplates};
use crate::config::PolicyConfig;
use crate::task::{
    domain::{AuditEntry, NotificationIntent, NotificationKind, Task, User, UserId},
    ports::{AuditLog, NotificationSink, ObjectStorage},
};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Secondary-effect ports shared by the services.
#[derive(Clone)]
pub struct EffectPorts {
    /// Audit trail.
    pub audit: Arc<dyn AuditLog>,
    /// Post-commit notification hook.
    pub notifications: Arc<dyn NotificationSink>,
    /// External image store.
    pub storage: Arc<dyn ObjectStorage>,
}

/// Returns the deduplicated active recipients among `users`, minus `actor`.
#[must_use]
pub fn audience(users: &[User], actor: Option<UserId>) -> Vec<UserId> {
    users
        .iter()
        .filter(|user| user.is_active() && Some(user.id()) != actor)
        .map(User::id)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Records an audit entry, logging and swallowing write failures.
pub(crate) async fn record_audit(log: &dyn AuditLog, entry: &AuditEntry) {
    if let Err(err) = log.append(entry).await {
        tracing::error!(
            action = %entry.action,
            error = %err,
            "audit write failed; mutation kept"
        );
    }
}

/// Builds notification intents from templates and the link policy.
pub(crate) struct IntentBuilder<'a> {
    templates: &'a NotificationTemplates,
    policy: &'a PolicyConfig,
}

impl<'a> IntentBuilder<'a> {
    pub(crate) const fn new(templates: &'a NotificationTemplates, policy: &'a PolicyConfig) -> Self {
        Self { templates, policy }
    }

    /// Returns the base template context for `task`.
    pub(crate) fn context(&self, task: &Task) -> NotificationContext {
        NotificationContext {
            task_id: task.id().value(),
            title: task.title().to_owned(),
            deadline: self
                .policy
                .calendar()
                .date_of(task.deadline())
                .format("%Y-%m-%d")
                .to_string(),
            ..NotificationContext::default()
        }
    }

    /// Renders an intent, or `None` when nobody is left to notify or the
    /// template fails.
    pub(crate) fn build(
        &self,
        kind: NotificationKind,
        task: &Task,
        audience: Vec<UserId>,
        context: &NotificationContext,
    ) -> Option<NotificationIntent> {
        if audience.is_empty() {
            tracing::debug!(task_id = %task.id(), kind = kind.as_str(), "no audience; skipped");
            return None;
        }
        let rendered = self
            .templates
            .render(kind, context)
            .map_err(|err| {
                tracing::error!(task_id = %task.id(), error = %err, "notification skipped");
            })
            .ok()?;
        Some(NotificationIntent {
            kind,
            task_id: task.id(),
            audience,
            title: rendered.title,
            body: rendered.body,
            url: self.policy.task_link(task.id()),
        })
    }
}

/// Submits an intent when there is one.
pub(crate) fn submit(sink: &dyn NotificationSink, intent: Option<NotificationIntent>) {
    if let Some(ready) = intent {
        tracing::debug!(
            task_id = %ready.task_id,
            kind = ready.kind.as_str(),
            recipients = ready.audience.len(),
            "notification submitted"
        );
        sink.submit(ready);
    }
}
