//! When steps for task visibility BDD scenarios.

use super::world::{VisibilityWorld, actor, run_async};
use eyre::WrapErr;
use rstest_bdd_macros::when;
use tareas::task::{policy::TaskFilters, ports::PageRequest};

#[when(r#""{viewer}" lists the tasks"#)]
fn list_tasks(world: &mut VisibilityWorld, viewer: String) -> Result<(), eyre::Report> {
    let page = run_async(world.office.service.list_tasks(
        &actor(&viewer)?,
        &TaskFilters::default(),
        None,
        PageRequest::default(),
    ))
    .wrap_err("list tasks in scenario")?;
    world.listed = Some(page.items.iter().map(|task| task.title().to_owned()).collect());
    Ok(())
}
