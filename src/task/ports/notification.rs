//! Notification ports: the post-commit sink and the push plumbing behind it.

use crate::task::domain::{
    NotificationIntent, PushPayload, PushRegistration, RegistrationId, UserId,
};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Post-commit hook receiving notification intents.
///
/// Services call [`NotificationSink::submit`] only after the primary
/// mutation is durable. Implementations must return promptly and never
/// report delivery outcome back to the caller.
pub trait NotificationSink: Send + Sync {
    /// Queues an intent for delivery.
    fn submit(&self, intent: NotificationIntent);
}

/// Store of push registrations.
#[async_trait]
pub trait PushRegistry: Send + Sync {
    /// Returns every registration owned by any of `users`.
    async fn registrations_for(
        &self,
        users: &[UserId],
    ) -> Result<Vec<PushRegistration>, PushRegistryError>;

    /// Deletes a registration.
    async fn remove(&self, id: RegistrationId) -> Result<(), PushRegistryError>;
}

/// Errors returned by push registry implementations.
#[derive(Debug, Clone, Error)]
pub enum PushRegistryError {
    /// Persistence-layer failure.
    #[error("push registry failure: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl PushRegistryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}

/// Delivery channel to one push registration.
#[async_trait]
pub trait PushTransport: Send + Sync {
    /// Sends one payload to one registration.
    async fn send(
        &self,
        registration: &PushRegistration,
        payload: &PushPayload,
    ) -> Result<(), PushError>;
}

/// Push delivery failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PushError {
    /// The registration is permanently invalid and should be deleted.
    #[error("push registration is gone")]
    Gone,
    /// Any other delivery failure.
    #[error("push delivery failed: {0}")]
    Transport(String),
}
