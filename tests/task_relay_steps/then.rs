//! Then steps for task relay BDD scenarios.

use super::world::{RelayWorld, run_async, user};
use relai::notification::domain::NotificationKind;
use relai::workflow::domain::WorkflowStatus;
use rstest_bdd_macros::then;

fn closed_as(world: &RelayWorld, expected: WorkflowStatus) -> Result<(), eyre::Report> {
    let outcome = world
        .outcome
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing relay outcome"))?;
    if outcome.status != expected {
        return Err(eyre::eyre!(
            "expected relay to close as {expected}, found {} ({:?})",
            outcome.status,
            outcome.error
        ));
    }
    Ok(())
}

#[then("the relay workflow completes")]
fn relay_completes(world: &RelayWorld) -> Result<(), eyre::Report> {
    closed_as(world, WorkflowStatus::Completed)
}

#[then("the relay workflow fails")]
fn relay_fails(world: &RelayWorld) -> Result<(), eyre::Report> {
    closed_as(world, WorkflowStatus::Failed)?;
    let succeeded = world
        .outcome
        .as_ref()
        .and_then(|outcome| outcome.result.as_ref())
        .is_some_and(|output| output.success);
    if succeeded {
        return Err(eyre::eyre!("failed relay reported success"));
    }
    Ok(())
}

#[then(r#"the task is assigned to "{owner}""#)]
fn task_assigned_to(world: &RelayWorld, owner: String) -> Result<(), eyre::Report> {
    let task = run_async(world.records.get(world.task_id()?))?
        .ok_or_else(|| eyre::eyre!("task missing from store"))?;
    let expected = user(&owner)?;
    if task.assigned_to() != Some(&expected) {
        return Err(eyre::eyre!(
            "expected assignee {expected}, found {:?}",
            task.assigned_to()
        ));
    }
    Ok(())
}

#[then(r#""{receiver}" is told the task came from "{sender}" with the note "{note}""#)]
fn receiver_notified(
    world: &RelayWorld,
    receiver: String,
    sender: String,
    note: String,
) -> Result<(), eyre::Report> {
    let received = world.outbox.sent_of_kind(NotificationKind::TaskRelayReceived)?;
    let expected = format!(
        "Task relayed to you from {sender}: {} ({note})",
        world.task_id()?
    );
    let matched = received
        .iter()
        .any(|sent| sent.user().as_str() == receiver && sent.message() == expected);
    if !matched {
        return Err(eyre::eyre!("no relay notice for {receiver}: {received:?}"));
    }
    Ok(())
}

#[then(r#""{sender}" is told the task reached "{receiver}""#)]
fn sender_notified(
    world: &RelayWorld,
    sender: String,
    receiver: String,
) -> Result<(), eyre::Report> {
    let sent = world.outbox.sent_of_kind(NotificationKind::TaskRelaySent)?;
    let expected = format!("Task successfully relayed to {receiver}: {}", world.task_id()?);
    let matched = sent
        .iter()
        .any(|notice| notice.user().as_str() == sender && notice.message() == expected);
    if !matched {
        return Err(eyre::eyre!("no confirmation for {sender}: {sent:?}"));
    }
    Ok(())
}

#[then("no notifications are sent")]
fn no_notifications(world: &RelayWorld) -> Result<(), eyre::Report> {
    let sent = world.outbox.sent()?;
    if !sent.is_empty() {
        return Err(eyre::eyre!("unexpected notifications: {sent:?}"));
    }
    Ok(())
}
