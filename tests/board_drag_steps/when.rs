//! When steps for board drag-and-drop BDD scenarios.

use super::world::{BoardWorld, CARD, COLUMN_WIDTH, GRAB, run_async};
use rstest_bdd_macros::when;
use salesboard::pipeline::{
    board::{Point, ReleaseOutcome},
    domain::TaskId,
};

/// Pointer x that puts the card's centre near the centre of column `index`.
fn column_x(index: usize) -> Result<f64, eyre::Report> {
    let position = u32::try_from(index).map_err(|err| eyre::eyre!("column index: {err}"))?;
    Ok(f64::from(position) * COLUMN_WIDTH + 80.0)
}

#[when(r#"task {id:u64} is dragged to the "{stage}" column"#)]
fn drag_to_column(world: &mut BoardWorld, id: u64, stage: String) -> Result<(), eyre::Report> {
    let index = world
        .board
        .coordinator()
        .registry()
        .position(&stage)
        .ok_or_else(|| eyre::eyre!("unknown stage {stage} in scenario"))?;
    let target = Point::new(column_x(index)?, GRAB.y);

    world
        .board
        .pointer_down(TaskId::new(id), CARD, GRAB)
        .map_err(|err| eyre::eyre!("gesture should start: {err}"))?;
    world.board.pointer_move(target);
    world.last_release = Some(run_async(world.board.pointer_up(target)));
    Ok(())
}

#[when("task {id:u64} is clicked")]
fn click_task(world: &mut BoardWorld, id: u64) -> Result<(), eyre::Report> {
    world
        .board
        .pointer_down(TaskId::new(id), CARD, GRAB)
        .map_err(|err| eyre::eyre!("gesture should start: {err}"))?;
    let release = run_async(world.board.pointer_up(GRAB));
    if let Ok(ReleaseOutcome::Clicked(clicked)) = &release {
        world.detail_title = world
            .board
            .open_detail(*clicked)
            .map(|session| session.snapshot().title().to_owned());
    }
    world.last_release = Some(release);
    Ok(())
}

#[when("task {id:u64} is pressed")]
fn press_task(world: &mut BoardWorld, id: u64) {
    world.last_press = Some(world.board.pointer_down(TaskId::new(id), CARD, GRAB));
}
