//! Notification text rendered from `minijinja` templates.

use crate::task::domain::NotificationKind;
use minijinja::Environment;
use serde::Serialize;
use thiserror::Error;

/// Values available to every notification template.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NotificationContext {
    /// Task identifier.
    pub task_id: i64,
    /// Task title.
    pub title: String,
    /// Deadline as a business-calendar date.
    pub deadline: String,
    /// Display name of the acting user, when known.
    pub actor: Option<String>,
    /// Delivery comment.
    pub comment: Option<String>,
    /// Reviewer feedback or change reason.
    pub feedback: Option<String>,
    /// Whether the deadline moved as part of this change.
    pub deadline_changed: bool,
}

/// Rendered title and body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedNotification {
    /// Title line.
    pub title: String,
    /// Body text.
    pub body: String,
}

/// Template rendering failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("failed to render {kind} notification: {reason}")]
pub struct TemplateError {
    /// Template that failed.
    pub kind: &'static str,
    /// Renderer message.
    pub reason: String,
}

const fn sources(kind: NotificationKind) -> (&'static str, &'static str) {
    match kind {
        NotificationKind::NewTask => (
            "Nueva tarea asignada",
            "{{ title }} (vence el {{ deadline }})",
        ),
        NotificationKind::Reassigned => (
            "Se te asignó una tarea",
            "{{ title }} (vence el {{ deadline }})",
        ),
        NotificationKind::Delivered => (
            "Tarea entregada para revisión",
            "{% if actor %}{{ actor }} entregó{% else %}Se entregó{% endif %} \"{{ title }}\"\
             {% if comment %}: {{ comment }}{% endif %}",
        ),
        NotificationKind::Approved => (
            "Tarea aprobada",
            "\"{{ title }}\" fue aprobada{% if feedback %}: {{ feedback }}{% endif %}",
        ),
        NotificationKind::Rejected => (
            "Tarea rechazada",
            "\"{{ title }}\" requiere correcciones{% if feedback %}: {{ feedback }}{% endif %}\
             {% if deadline_changed %}. Nueva fecha límite: {{ deadline }}{% endif %}",
        ),
        NotificationKind::Completed => ("Tarea concluida", "\"{{ title }}\" fue concluida"),
        NotificationKind::Cancelled => ("Tarea cancelada", "\"{{ title }}\" fue cancelada"),
        NotificationKind::DeadlineChanged => (
            "Fecha límite actualizada",
            "\"{{ title }}\" ahora vence el {{ deadline }}\
             {% if feedback %}. Motivo: {{ feedback }}{% endif %}",
        ),
        NotificationKind::DueToday => ("La tarea vence hoy", "\"{{ title }}\" vence hoy"),
        NotificationKind::Overdue => (
            "Tarea vencida",
            "\"{{ title }}\" venció el {{ deadline }}",
        ),
    }
}

/// Renders notification text per [`NotificationKind`].
#[derive(Debug)]
pub struct NotificationTemplates {
    environment: Environment<'static>,
}

impl NotificationTemplates {
    /// Creates the renderer with the built-in templates.
    #[must_use]
    pub fn new() -> Self {
        Self {
            environment: Environment::new(),
        }
    }

    /// Renders the title and body for `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError`] when a template fails to render.
    pub fn render(
        &self,
        kind: NotificationKind,
        context: &NotificationContext,
    ) -> Result<RenderedNotification, TemplateError> {
        let (title_source, body_source) = sources(kind);
        let failure = |error: minijinja::Error| TemplateError {
            kind: kind.as_str(),
            reason: error.to_string(),
        };
        let title = self
            .environment
            .render_str(title_source, context)
            .map_err(failure)?;
        let body = self
            .environment
            .render_str(body_source, context)
            .map_err(failure)?;
        Ok(RenderedNotification { title, body })
    }
}

impl Default for NotificationTemplates {
    fn default() -> Self {
        Self::new()
    }
}
