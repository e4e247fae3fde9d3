//! Shared world state for delivery review BDD scenarios.

use crate::test_helpers::{Office, principal, seeded_id};
use rstest::fixture;
use tareas::task::{
    domain::{Principal, Task},
    services::TaskServiceError,
};

/// Scenario world for delivery review behaviour tests.
pub struct ReviewWorld {
    pub office: Office,
    pub task: Option<Task>,
    pub last_result: Option<Result<Task, TaskServiceError>>,
}

impl ReviewWorld {
    /// Creates a world over a freshly seeded office.
    #[must_use]
    pub fn new() -> Self {
        Self {
            office: Office::new(),
            task: None,
            last_result: None,
        }
    }

    /// Returns the task under test.
    pub fn task(&self) -> Result<&Task, eyre::Report> {
        self.task
            .as_ref()
            .ok_or_else(|| eyre::eyre!("missing task in scenario world"))
    }

    /// Records an operation outcome, tracking the task when it succeeded.
    pub fn record(&mut self, result: Result<Task, TaskServiceError>) {
        if let Ok(ref updated) = result {
            self.task = Some(updated.clone());
        }
        self.last_result = Some(result);
    }
}

impl Default for ReviewWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> ReviewWorld {
    ReviewWorld::default()
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
