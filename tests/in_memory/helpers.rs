//! Shared fixtures for in-memory integration tests.

use crate::test_helpers::{Office, date, principal, user_id};
use rstest::fixture;
use tareas::task::{domain::Task, services::CreateTaskRequest};

/// Provides a freshly seeded office for each test.
#[fixture]
pub fn office() -> Office {
    Office::new()
}

/// Creates a task due on 2030-06-14 and returns it.
///
/// # Errors
///
/// Returns an error if the service refuses the creation.
pub async fn create_task(
    office: &Office,
    actor: i64,
    title: &str,
    responsibles: &[i64],
) -> Result<Task, eyre::Report> {
    let request = CreateTaskRequest::new(
        title,
        date(2030, 6, 14),
        responsibles.iter().copied().map(user_id),
    );
    Ok(office.service.create_task(&principal(actor), request).await?)
}
