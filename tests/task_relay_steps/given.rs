//! Given steps for task relay BDD scenarios.

use super::world::{RelayWorld, run_async, user};
use eyre::WrapErr;
use relai::task::domain::{NewTask, TaskId};
use rstest_bdd_macros::given;

#[given(r#"a task "{title}" assigned to "{owner}""#)]
fn task_assigned_to(
    world: &mut RelayWorld,
    title: String,
    owner: String,
) -> Result<(), eyre::Report> {
    let draft = NewTask::new(title).with_assignee(user(&owner)?);
    let task = run_async(world.records.create(draft)).wrap_err("seed task for relay scenario")?;
    world.task_id = Some(task.id());
    Ok(())
}

#[given("a task that was never stored")]
fn task_never_stored(world: &mut RelayWorld) {
    world.task_id = Some(TaskId::new());
}
