//! Object storage port for uploaded task images.

use crate::task::domain::ImageUrl;
use async_trait::async_trait;
use thiserror::Error;

/// External object store holding uploaded images.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Deletes the object behind `url`.
    async fn delete(&self, url: &ImageUrl) -> Result<(), StorageError>;
}

/// Object storage failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    /// The URL does not resolve to an object this store owns.
    #[error("unrecognised object URL: {0}")]
    UnknownObject(String),
    /// The store refused or failed the request.
    #[error("object storage request failed: {0}")]
    Request(String),
}
