//! Application services for the task lifecycle.
//!
//! Services own orchestration only: they ask the policy layer for decisions,
//! the domain for state changes, the repository for one atomic write, and
//! then run the post-commit effects.

mod dispatch;
mod effects;
mod error;
mod lifecycle;
mod reminders;
mod requests;
mod templates;

pub use dispatch::{BackgroundNotificationSink, DispatchReport, NotificationDispatcher};
pub use effects::{EffectPorts, audience};
pub use error::{
    ErrorBody, ErrorKind, FieldErrors, PermissionError, TaskServiceError, TaskServiceResult,
};
pub use lifecycle::TaskLifecycleService;
pub use reminders::ReminderService;
pub use requests::{
    CreateTaskRequest, DeliverTaskRequest, RecordDeadlineRequest, ReviewDecision,
    UpdateTaskRequest,
};
pub use templates::{
    NotificationContext, NotificationTemplates, RenderedNotification, TemplateError,
};
