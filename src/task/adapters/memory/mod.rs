//! In-memory adapters for every task port.

mod audit;
mod notification;
mod storage;
mod task;

pub use audit::InMemoryAuditLog;
pub use notification::{InMemoryPushRegistry, InMemoryPushTransport, RecordingNotificationSink};
pub use storage::InMemoryObjectStorage;
pub use task::InMemoryTaskStore;

fn poisoned(err: &impl std::fmt::Display) -> std::io::Error {
    std::io::Error::other(err.to_string())
}
