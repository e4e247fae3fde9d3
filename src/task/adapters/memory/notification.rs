//! In-memory notification adapters: a recording sink, a push registry, and
//! a push transport that reports configured endpoints as gone.

use super::poisoned;
use crate::task::{
    domain::{NotificationIntent, PushPayload, PushRegistration, RegistrationId, UserId},
    ports::{NotificationSink, PushError, PushRegistry, PushRegistryError, PushTransport},
};
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, RwLock};

/// Sink that keeps every submitted intent.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotificationSink {
    intents: Arc<Mutex<Vec<NotificationIntent>>>,
}

impl RecordingNotificationSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the intents submitted so far.
    #[must_use]
    pub fn intents(&self) -> Vec<NotificationIntent> {
        self.intents
            .lock()
            .map(|intents| intents.clone())
            .unwrap_or_default()
    }
}

impl NotificationSink for RecordingNotificationSink {
    fn submit(&self, intent: NotificationIntent) {
        if let Err(err) = self.intents.lock().map(|mut intents| intents.push(intent)) {
            tracing::warn!(error = %err, "recording sink poisoned");
        }
    }
}

/// Push registrations held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPushRegistry {
    registrations: Arc<RwLock<Vec<PushRegistration>>>,
}

impl InMemoryPushRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a registration.
    ///
    /// # Errors
    ///
    /// Returns [`PushRegistryError::Persistence`] if the lock is poisoned.
    pub fn register(&self, registration: PushRegistration) -> Result<(), PushRegistryError> {
        self.registrations
            .write()
            .map_err(|err| PushRegistryError::persistence(poisoned(&err)))?
            .push(registration);
        Ok(())
    }

    /// Returns the identifiers of the stored registrations.
    #[must_use]
    pub fn registered(&self) -> Vec<RegistrationId> {
        self.registrations
            .read()
            .map(|registrations| registrations.iter().map(|found| found.id).collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl PushRegistry for InMemoryPushRegistry {
    async fn registrations_for(
        &self,
        users: &[UserId],
    ) -> Result<Vec<PushRegistration>, PushRegistryError> {
        let registrations = self
            .registrations
            .read()
            .map_err(|err| PushRegistryError::persistence(poisoned(&err)))?;
        Ok(registrations
            .iter()
            .filter(|registration| users.contains(&registration.user))
            .cloned()
            .collect())
    }

    async fn remove(&self, id: RegistrationId) -> Result<(), PushRegistryError> {
        self.registrations
            .write()
            .map_err(|err| PushRegistryError::persistence(poisoned(&err)))?
            .retain(|registration| registration.id != id);
        Ok(())
    }
}

/// Transport that records payloads and answers [`PushError::Gone`] for
/// endpoints marked as expired.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPushTransport {
    delivered: Arc<Mutex<Vec<(RegistrationId, PushPayload)>>>,
    expired: Arc<RwLock<BTreeSet<String>>>,
}

impl InMemoryPushTransport {
    /// Creates a transport that accepts every endpoint.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks an endpoint as permanently gone.
    pub fn expire(&self, endpoint: &str) {
        if let Ok(mut expired) = self.expired.write() {
            expired.insert(endpoint.to_owned());
        }
    }

    /// Returns the payloads sent so far.
    #[must_use]
    pub fn delivered(&self) -> Vec<(RegistrationId, PushPayload)> {
        self.delivered
            .lock()
            .map(|delivered| delivered.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl PushTransport for InMemoryPushTransport {
    async fn send(
        &self,
        registration: &PushRegistration,
        payload: &PushPayload,
    ) -> Result<(), PushError> {
        let gone = self
            .expired
            .read()
            .map_err(|err| PushError::Transport(err.to_string()))?
            .contains(&registration.endpoint);
        if gone {
            return Err(PushError::Gone);
        }
        self.delivered
            .lock()
            .map_err(|err| PushError::Transport(err.to_string()))?
            .push((registration.id, payload.clone()));
        Ok(())
    }
}
