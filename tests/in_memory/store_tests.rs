//! Referential checks of the in-memory store.

use super::helpers::{create_task, office};
use crate::test_helpers::{
    ENCARGADO_PRODUCCION, OPERARIA, Office, PRODUCCION, department_id, user_id,
};
use eyre::{bail, ensure};
use mockable::DefaultClock;
use rstest::rstest;
use tareas::task::{
    domain::{ImageId, ImageUrl, NewTask, NewTaskData, Task, TaskId, TaskStatus, Urgency},
    policy::TaskPredicate,
    ports::{TaskRepository, TaskRepositoryError, TaskUpdate, UserDirectory},
};

fn new_task(responsible: i64) -> Result<NewTask, eyre::Report> {
    Ok(NewTask::new(
        NewTaskData {
            title: "Directo al almacén".to_owned(),
            notes: String::new(),
            deadline: chrono::Utc::now(),
            urgency: Urgency::Low,
            department: department_id(PRODUCCION),
            creator: user_id(ENCARGADO_PRODUCCION),
            responsibles: [user_id(responsible)].into_iter().collect(),
        },
        &DefaultClock,
    )?)
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unknown_responsibles_are_a_conflict(office: Office) -> Result<(), eyre::Report> {
    let result = office.store.create(new_task(404)?).await;

    ensure!(
        matches!(result, Err(TaskRepositoryError::Conflict(_))),
        "expected a conflict, got {result:?}"
    );
    ensure!(office.store.find_matching(&TaskPredicate::all()).await?.is_empty());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn updates_to_missing_tasks_are_not_found(office: Office) -> Result<(), eyre::Report> {
    let stored = office.store.create(new_task(OPERARIA)?).await?;
    let mut data = stored.into_persisted();
    data.id = TaskId::new(77)?;
    let orphan = Task::from_persisted(data);

    let result = office
        .store
        .apply(TaskUpdate::scalar(TaskStatus::Pending, orphan))
        .await;
    ensure!(matches!(result, Err(TaskRepositoryError::NotFound(id)) if id.value() == 77));

    let image = office.store.delete_image(ImageId::new(5)?).await;
    ensure!(matches!(image, Err(TaskRepositoryError::ImageNotFound(_))));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn stale_status_writes_nothing(office: Office) -> Result<(), eyre::Report> {
    let stored = office.store.create(new_task(OPERARIA)?).await?;
    let id = stored.id();
    let mut cancelled = stored.clone();
    cancelled.cancel(&DefaultClock)?;
    office
        .store
        .apply(TaskUpdate::scalar(TaskStatus::Pending, cancelled))
        .await?;

    let mut delivered = stored;
    delivered.deliver(None, &DefaultClock)?;
    let stale = TaskUpdate::scalar(TaskStatus::Pending, delivered)
        .with_images([ImageUrl::new("https://cdn.local/tarde.jpg")?], chrono::Utc::now());
    let result = office.store.apply(stale).await;

    ensure!(
        matches!(
            result,
            Err(TaskRepositoryError::StatusChanged {
                expected: TaskStatus::Pending,
                ..
            })
        ),
        "expected a stale status, got {result:?}"
    );
    let Some(current) = office.store.find_by_id(id).await? else {
        bail!("task vanished");
    };
    ensure!(current.status() == TaskStatus::Cancelled);
    ensure!(current.images().is_empty());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn identifiers_increase_and_lists_run_newest_first(
    office: Office,
) -> Result<(), eyre::Report> {
    let first = create_task(&office, ENCARGADO_PRODUCCION, "Uno", &[OPERARIA]).await?;
    let second = create_task(&office, ENCARGADO_PRODUCCION, "Dos", &[OPERARIA]).await?;
    ensure!(first.id().value() == 1);
    ensure!(second.id().value() == 2);

    let ids: Vec<i64> = office
        .store
        .find_matching(&TaskPredicate::all())
        .await?
        .iter()
        .map(|task| task.id().value())
        .collect();
    ensure!(ids == vec![2, 1]);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn directory_returns_only_known_users(office: Office) -> Result<(), eyre::Report> {
    let found = office
        .store
        .find_users(&[user_id(OPERARIA), user_id(404)])
        .await?;
    let [operaria] = found.as_slice() else {
        bail!("expected exactly one user, got {found:?}");
    };
    ensure!(operaria.id() == user_id(OPERARIA));
    ensure!(office.store.find_department(department_id(9)).await?.is_none());
    Ok(())
}
