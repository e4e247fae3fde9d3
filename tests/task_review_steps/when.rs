//! When steps for delivery review BDD scenarios.

use super::world::{ReviewWorld, actor, run_async};
use chrono::NaiveDate;
use rstest_bdd_macros::when;
use tareas::task::services::{DeliverTaskRequest, ReviewDecision};

#[when(r#""{responsible}" delivers the task with comment "{comment}""#)]
fn deliver(
    world: &mut ReviewWorld,
    responsible: String,
    comment: String,
) -> Result<(), eyre::Report> {
    let id = world.task()?.id();
    let result = run_async(world.office.service.deliver(
        &actor(&responsible)?,
        id,
        DeliverTaskRequest::new().with_comment(comment),
    ));
    world.record(result);
    Ok(())
}

#[when(r#""{reviewer}" approves the delivery"#)]
fn approve(world: &mut ReviewWorld, reviewer: String) -> Result<(), eyre::Report> {
    let id = world.task()?.id();
    let result = run_async(world.office.service.review(
        &actor(&reviewer)?,
        id,
        ReviewDecision::approve(None),
    ));
    world.record(result);
    Ok(())
}

#[when(r#""{reviewer}" rejects the delivery moving the deadline to "{deadline}""#)]
fn reject_with_extension(
    world: &mut ReviewWorld,
    reviewer: String,
    deadline: String,
) -> Result<(), eyre::Report> {
    let id = world.task()?.id();
    let new_deadline = NaiveDate::parse_from_str(&deadline, "%Y-%m-%d")?;
    let result = run_async(world.office.service.review(
        &actor(&reviewer)?,
        id,
        ReviewDecision::reject(Some("repetir medición"), Some(new_deadline)),
    ));
    world.record(result);
    Ok(())
}
