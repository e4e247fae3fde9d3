//! Given steps for delivery review BDD scenarios.

use super::world::{ReviewWorld, actor, run_async};
use crate::test_helpers::{date, seeded_id, user_id};
use eyre::WrapErr;
use rstest_bdd_macros::given;
use tareas::task::services::{CreateTaskRequest, DeliverTaskRequest};

#[given(r#""{creator}" created the task "{title}" for "{responsible}""#)]
fn task_created(
    world: &mut ReviewWorld,
    creator: String,
    title: String,
    responsible: String,
) -> Result<(), eyre::Report> {
    let responsible_id =
        seeded_id(&responsible).ok_or_else(|| eyre::eyre!("unknown user {responsible}"))?;
    let request = CreateTaskRequest::new(title, date(2030, 6, 14), [user_id(responsible_id)]);
    let created = run_async(world.office.service.create_task(&actor(&creator)?, request))
        .wrap_err("create task for review scenario")?;
    world.task = Some(created);
    Ok(())
}

#[given(r#""{responsible}" has delivered the task"#)]
fn task_delivered(world: &mut ReviewWorld, responsible: String) -> Result<(), eyre::Report> {
    let id = world.task()?.id();
    let delivered = run_async(world.office.service.deliver(
        &actor(&responsible)?,
        id,
        DeliverTaskRequest::new(),
    ))
    .wrap_err("deliver task in scenario setup")?;
    world.task = Some(delivered);
    Ok(())
}
