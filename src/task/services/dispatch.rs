//! Push fan-out for notification intents.
//!
//! [`NotificationDispatcher`] resolves the audience's registrations and sends
//! to each one concurrently. A failed send never aborts its siblings, and a
//! registration the transport reports as gone is deleted.

use crate::task::{
    domain::{NotificationIntent, PushPayload, RegistrationId},
    ports::{NotificationSink, PushError, PushRegistry, PushTransport},
};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinSet;

/// Outcome counts of one fan-out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Sends that succeeded.
    pub sent: usize,
    /// Sends that failed, including gone registrations.
    pub failed: usize,
    /// Registrations deleted after a gone response.
    pub pruned: usize,
}

/// Sends intents through the push transport.
#[derive(Clone)]
pub struct NotificationDispatcher {
    registry: Arc<dyn PushRegistry>,
    transport: Arc<dyn PushTransport>,
    icon: String,
}

impl NotificationDispatcher {
    /// Creates a dispatcher that stamps `icon` on every payload.
    #[must_use]
    pub const fn new(
        registry: Arc<dyn PushRegistry>,
        transport: Arc<dyn PushTransport>,
        icon: String,
    ) -> Self {
        Self {
            registry,
            transport,
            icon,
        }
    }

    /// Delivers `intent` to every registration of its audience.
    pub async fn dispatch(&self, intent: &NotificationIntent) -> DispatchReport {
        let mut report = DispatchReport::default();
        let registrations = match self.registry.registrations_for(&intent.audience).await {
            Ok(found) => found,
            Err(err) => {
                tracing::error!(task_id = %intent.task_id, error = %err, "registration lookup failed");
                return report;
            }
        };

        let payload = Arc::new(PushPayload::from_intent(intent, &self.icon));
        let mut sends = JoinSet::new();
        for registration in registrations {
            let transport = Arc::clone(&self.transport);
            let shared_payload = Arc::clone(&payload);
            sends.spawn(async move {
                let outcome = transport.send(&registration, &shared_payload).await;
                (registration.id, outcome)
            });
        }

        while let Some(joined) = sends.join_next().await {
            match joined {
                Ok((_, Ok(()))) => report.sent = report.sent.saturating_add(1),
                Ok((id, Err(PushError::Gone))) => {
                    report.failed = report.failed.saturating_add(1);
                    if self.prune(id).await {
                        report.pruned = report.pruned.saturating_add(1);
                    }
                }
                Ok((id, Err(err))) => {
                    report.failed = report.failed.saturating_add(1);
                    tracing::warn!(registration = %id, error = %err, "push send failed");
                }
                Err(err) => {
                    report.failed = report.failed.saturating_add(1);
                    tracing::error!(error = %err, "push send task aborted");
                }
            }
        }

        tracing::info!(
            task_id = %intent.task_id,
            kind = intent.kind.as_str(),
            sent = report.sent,
            failed = report.failed,
            pruned = report.pruned,
            "notification dispatched"
        );
        report
    }

    async fn prune(&self, id: RegistrationId) -> bool {
        self.registry.remove(id).await.map_or_else(
            |err| {
                tracing::warn!(registration = %id, error = %err, "failed to prune registration");
                false
            },
            |()| true,
        )
    }
}

/// Production [`NotificationSink`]: each intent is dispatched on its own
/// Tokio task.
///
/// Submitting outside a runtime drops the intent with a warning.
#[derive(Clone)]
pub struct BackgroundNotificationSink {
    dispatcher: Arc<NotificationDispatcher>,
}

impl BackgroundNotificationSink {
    /// Wraps a dispatcher.
    #[must_use]
    pub const fn new(dispatcher: Arc<NotificationDispatcher>) -> Self {
        Self { dispatcher }
    }
}

impl NotificationSink for BackgroundNotificationSink {
    fn submit(&self, intent: NotificationIntent) {
        let Ok(handle) = Handle::try_current() else {
            tracing::warn!(task_id = %intent.task_id, "no runtime; notification dropped");
            return;
        };
        let dispatcher = Arc::clone(&self.dispatcher);
        drop(handle.spawn(async move { dispatcher.dispatch(&intent).await }));
    }
}
