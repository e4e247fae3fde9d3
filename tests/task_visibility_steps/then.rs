//! Then steps for task visibility BDD scenarios.

use super::world::VisibilityWorld;
use rstest_bdd_macros::then;

fn listed(world: &VisibilityWorld) -> Result<&[String], eyre::Report> {
    world
        .listed
        .as_deref()
        .ok_or_else(|| eyre::eyre!("no list was requested"))
}

#[then("the list is empty")]
fn list_is_empty(world: &VisibilityWorld) -> Result<(), eyre::Report> {
    let titles = listed(world)?;
    eyre::ensure!(titles.is_empty(), "expected nothing, saw {titles:?}");
    Ok(())
}

#[then(r#"the list holds "{titles}""#)]
fn list_holds(world: &VisibilityWorld, titles: String) -> Result<(), eyre::Report> {
    let expected: Vec<&str> = titles.split(',').map(str::trim).collect();
    let seen = listed(world)?;
    eyre::ensure!(seen == expected.as_slice(), "saw {seen:?}");
    Ok(())
}
