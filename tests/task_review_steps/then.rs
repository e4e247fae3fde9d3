//! Then steps for delivery review BDD scenarios.

use super::world::{ReviewWorld, actor, run_async};
use crate::test_helpers::{seeded_id, user_id};
use rstest_bdd_macros::then;
use tareas::task::{
    domain::{DeadlineChangeKind, NotificationKind, TaskStatus},
    services::ErrorKind,
};

#[then(r#"the task status is "{status}""#)]
fn task_status_is(world: &ReviewWorld, status: String) -> Result<(), eyre::Report> {
    let expected = TaskStatus::try_from(status.as_str())
        .map_err(|err| eyre::eyre!("invalid expected status in scenario: {err}"))?;
    let id = world.task()?.id();
    let stored = run_async(world.office.service.get_task(&actor("Rosa")?, id))?;
    eyre::ensure!(
        stored.status() == expected,
        "expected status {}, found {}",
        expected.as_str(),
        stored.status().as_str()
    );
    Ok(())
}

#[then(r#""{name}" was notified of the delivery"#)]
fn notified_of_delivery(world: &ReviewWorld, name: String) -> Result<(), eyre::Report> {
    let recipient = user_id(seeded_id(&name).ok_or_else(|| eyre::eyre!("unknown user {name}"))?);
    let notified = world.office.intents().iter().any(|intent| {
        intent.kind == NotificationKind::Delivered && intent.audience.contains(&recipient)
    });
    eyre::ensure!(notified, "{name} received no delivery notification");
    Ok(())
}

#[then(r#"the audit trail reads "{actions}""#)]
fn audit_trail_reads(world: &ReviewWorld, actions: String) -> Result<(), eyre::Report> {
    let recorded: Vec<&str> = world
        .office
        .audit_actions()
        .into_iter()
        .map(|action| action.as_str())
        .collect();
    let expected: Vec<&str> = actions.split(',').map(str::trim).collect();
    eyre::ensure!(recorded == expected, "audit trail was {recorded:?}");
    Ok(())
}

#[then(r#"the deadline history holds {count} "{kind}" entry"#)]
fn history_holds(world: &ReviewWorld, count: usize, kind: String) -> Result<(), eyre::Report> {
    let expected = DeadlineChangeKind::try_from(kind.as_str())
        .map_err(|err| eyre::eyre!("invalid history kind in scenario: {err}"))?;
    let matching = world
        .task()?
        .history()
        .iter()
        .filter(|entry| entry.kind == expected)
        .count();
    eyre::ensure!(matching == count, "found {matching} {kind} entries");
    Ok(())
}

#[then("the operation is denied")]
fn operation_denied(world: &ReviewWorld) -> Result<(), eyre::Report> {
    let result = world
        .last_result
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing operation result"))?;
    match result {
        Err(err) if err.kind() == ErrorKind::PermissionDenied => Ok(()),
        other => Err(eyre::eyre!("expected a permission denial, got {other:?}")),
    }
}
