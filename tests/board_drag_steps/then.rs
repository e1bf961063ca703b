//! Then steps for board drag-and-drop BDD scenarios.

use super::world::BoardWorld;
use rstest_bdd_macros::then;
use salesboard::pipeline::{
    board::{GestureError, IgnoredMove, MoveOutcome, ReleaseOutcome},
    domain::TaskId,
    ports::{GatewayOperation, NotificationLevel},
    services::MutationError,
};

#[then(r#"task {id:u64} is in stage "{stage}""#)]
fn task_is_in_stage(world: &BoardWorld, id: u64, stage: String) -> Result<(), eyre::Report> {
    let task = world
        .board
        .task(TaskId::new(id))
        .ok_or_else(|| eyre::eyre!("task {id} is not on the board"))?;

    if task.stage().as_str() != stage {
        return Err(eyre::eyre!(
            "expected task {id} in {stage}, found {}",
            task.stage()
        ));
    }

    Ok(())
}

#[then("the update count is {count:u64}")]
fn update_count_is(world: &BoardWorld, count: u64) -> Result<(), eyre::Report> {
    let updates = world
        .gateway
        .calls_of(GatewayOperation::Update)
        .map_err(|err| eyre::eyre!("read gateway calls: {err}"))?;

    if u64::try_from(updates.len())? != count {
        return Err(eyre::eyre!(
            "expected {count} update calls, found {}",
            updates.len()
        ));
    }

    Ok(())
}

#[then(r#"a success notification reads "{message}""#)]
fn success_notification(world: &BoardWorld, message: String) -> Result<(), eyre::Report> {
    let found = world.notifier.notifications().iter().any(|notification| {
        notification.level == NotificationLevel::Success && notification.message == message
    });

    if !found {
        return Err(eyre::eyre!("no success notification reads {message:?}"));
    }

    Ok(())
}

#[then("an error notification is recorded")]
fn error_notification(world: &BoardWorld) -> Result<(), eyre::Report> {
    if world.notifier.errors().is_empty() {
        return Err(eyre::eyre!("expected an error notification"));
    }

    Ok(())
}

#[then("the drop is ignored")]
fn drop_is_ignored(world: &BoardWorld) -> Result<(), eyre::Report> {
    let release = world
        .last_release
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing release result"))?;

    if !matches!(
        release,
        Ok(ReleaseOutcome::Dropped(MoveOutcome::Ignored(IgnoredMove::NoTarget)))
    ) {
        return Err(eyre::eyre!("expected an ignored drop, got {release:?}"));
    }

    Ok(())
}

#[then("the move fails")]
fn move_fails(world: &BoardWorld) -> Result<(), eyre::Report> {
    let release = world
        .last_release
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing release result"))?;

    if !matches!(release, Err(MutationError::Remote(_))) {
        return Err(eyre::eyre!("expected a remote failure, got {release:?}"));
    }

    Ok(())
}

#[then(r#"the detail view shows "{title}""#)]
fn detail_view_shows(world: &BoardWorld, title: String) -> Result<(), eyre::Report> {
    let shown = world
        .detail_title
        .as_deref()
        .ok_or_else(|| eyre::eyre!("no detail view was opened"))?;

    if shown != title {
        return Err(eyre::eyre!("expected detail for {title:?}, found {shown:?}"));
    }

    Ok(())
}

#[then("the second press is rejected while task {id:u64} is active")]
fn second_press_rejected(world: &mut BoardWorld, id: u64) -> Result<(), eyre::Report> {
    let press = world
        .last_press
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing press result"))?;

    match press {
        Err(GestureError::GestureInProgress { active }) if *active == TaskId::new(id) => {}
        other => return Err(eyre::eyre!("expected rejection for task {id}, got {other:?}")),
    }

    if world.board.pointer_cancel() {
        Ok(())
    } else {
        Err(eyre::eyre!("the first gesture should still be active"))
    }
}
