//! Given steps for task visibility BDD scenarios.

use super::world::{VisibilityWorld, actor, run_async};
use crate::test_helpers::{date, department_id, seeded_department, seeded_id, user_id};
use eyre::WrapErr;
use rstest_bdd_macros::given;
use tareas::task::{domain::UserId, services::CreateTaskRequest};

fn responsible(name: &str) -> Result<UserId, eyre::Report> {
    seeded_id(name)
        .map(user_id)
        .ok_or_else(|| eyre::eyre!("unknown user {name}"))
}

#[given(r#""{creator}" created the task "{title}" for "{assignee}""#)]
fn task_created(
    world: &mut VisibilityWorld,
    creator: String,
    title: String,
    assignee: String,
) -> Result<(), eyre::Report> {
    let request = CreateTaskRequest::new(title, date(2030, 6, 14), [responsible(&assignee)?]);
    run_async(world.office.service.create_task(&actor(&creator)?, request))
        .wrap_err("create task for visibility scenario")?;
    Ok(())
}

#[given(r#""{creator}" assigned "{assignee}" the task "{title}" in "{department}""#)]
fn task_assigned_in_department(
    world: &mut VisibilityWorld,
    creator: String,
    assignee: String,
    title: String,
    department: String,
) -> Result<(), eyre::Report> {
    let target = seeded_department(&department)
        .map(department_id)
        .ok_or_else(|| eyre::eyre!("unknown department {department}"))?;
    let request = CreateTaskRequest::new(title, date(2030, 6, 14), [responsible(&assignee)?])
        .in_department(target);
    run_async(world.office.service.create_task(&actor(&creator)?, request))
        .wrap_err("create task in a named department")?;
    Ok(())
}
