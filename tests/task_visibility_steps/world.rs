//! Shared world state for task visibility BDD scenarios.

use crate::test_helpers::{Office, principal, seeded_id};
use rstest::fixture;
use tareas::task::domain::Principal;

/// Scenario world for visibility behaviour tests.
pub struct VisibilityWorld {
    pub office: Office,
    pub listed: Option<Vec<String>>,
}

impl VisibilityWorld {
    /// Creates a world over a freshly seeded office.
    #[must_use]
    pub fn new() -> Self {
        Self {
            office: Office::new(),
            listed: None,
        }
    }
}

impl Default for VisibilityWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> VisibilityWorld {
    VisibilityWorld::default()
}

/// Resolves a seeded user's principal by first name.
pub fn actor(name: &str) -> Result<Principal, eyre::Report> {
    seeded_id(name)
        .map(principal)
        .ok_or_else(|| eyre::eyre!("unknown user {name}"))
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
