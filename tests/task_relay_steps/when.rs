//! When steps for task relay BDD scenarios.

use super::world::{RelayWorld, run_async, user};
use eyre::WrapErr;
use rstest_bdd_macros::when;
use std::time::Duration;

const WAIT_LIMIT: Duration = Duration::from_secs(10);

fn relay(
    world: &mut RelayWorld,
    from: &str,
    to: &str,
    note: Option<String>,
) -> Result<(), eyre::Report> {
    let task_id = world.task_id()?;
    let id = run_async(
        world
            .service
            .start_task_relay(task_id, user(from)?, user(to)?, note),
    )
    .wrap_err("start relay workflow")?;
    let closed = run_async(
        world
            .service
            .runtime()
            .wait_for_completion(&id, Some(WAIT_LIMIT)),
    )
    .wrap_err("wait for relay workflow")?;
    world.outcome = Some(closed);
    Ok(())
}

#[when(r#""{from}" relays the task to "{to}" with the note "{note}""#)]
fn relays_with_note(
    world: &mut RelayWorld,
    from: String,
    to: String,
    note: String,
) -> Result<(), eyre::Report> {
    relay(world, &from, &to, Some(note))
}

#[when(r#""{from}" relays the task to "{to}" without a note"#)]
fn relays_without_note(world: &mut RelayWorld, from: String, to: String) -> Result<(), eyre::Report> {
    relay(world, &from, &to, None)
}
