//! In-memory object storage.

use crate::task::{
    domain::ImageUrl,
    ports::{ObjectStorage, StorageError},
};
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Object store keyed by URL, with a switch that makes deletes fail.
#[derive(Debug, Clone, Default)]
pub struct InMemoryObjectStorage {
    objects: Arc<Mutex<BTreeSet<String>>>,
    failing: Arc<AtomicBool>,
}

impl InMemoryObjectStorage {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores an object under `url`.
    pub fn put(&self, url: &str) {
        if let Ok(mut objects) = self.objects.lock() {
            objects.insert(url.to_owned());
        }
    }

    /// Returns `true` while an object is stored under `url`.
    #[must_use]
    pub fn contains(&self, url: &str) -> bool {
        self.objects
            .lock()
            .is_ok_and(|objects| objects.contains(url))
    }

    /// Makes every subsequent delete fail (or succeed again).
    pub fn fail_deletes(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl ObjectStorage for InMemoryObjectStorage {
    async fn delete(&self, url: &ImageUrl) -> Result<(), StorageError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StorageError::Request("storage unavailable".to_owned()));
        }
        let mut objects = self
            .objects
            .lock()
            .map_err(|err| StorageError::Request(err.to_string()))?;
        if objects.remove(url.as_str()) {
            Ok(())
        } else {
            Err(StorageError::UnknownObject(url.to_string()))
        }
    }
}
