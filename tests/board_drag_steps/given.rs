//! Given steps for board drag-and-drop BDD scenarios.

use super::world::{BoardWorld, COLUMN_HEIGHT, COLUMN_WIDTH, run_async};
use eyre::WrapErr;
use rstest_bdd_macros::given;
use salesboard::pipeline::{
    board::Rect,
    domain::{ResourceName, StageKey},
    ports::{GatewayOperation, RemoteErrorKind},
};
use serde_json::json;

#[given(r#"task {id:u64} "{title}" is in stage "{stage}""#)]
fn task_in_stage(
    world: &mut BoardWorld,
    id: u64,
    title: String,
    stage: String,
) -> Result<(), eyre::Report> {
    let record = json!({
        "id": id,
        "titulo": title,
        "descripcion": "",
        "etapa": stage,
        "etiquetas": [],
        "fecha_vencimiento": null,
        "fecha_creacion": "2025-03-01T09:00:00Z",
        "prioridad": "media",
        "checklist": [],
        "deleted": false
    });
    world
        .gateway
        .seed(&ResourceName::sales_pipeline(), [record])
        .wrap_err("seed task record")?;
    Ok(())
}

#[given("the board is loaded with columns for every stage")]
fn board_with_columns(world: &mut BoardWorld) -> Result<(), eyre::Report> {
    let keys: Vec<&str> = world.board.coordinator().registry().keys().collect();
    let mut left = 0.0;
    for key in keys {
        world.board.register_drop_zone(
            StageKey::new(key),
            Rect::new(left, 0.0, COLUMN_WIDTH, COLUMN_HEIGHT),
        );
        left += COLUMN_WIDTH;
    }
    run_async(world.board.refresh()).wrap_err("load board")?;
    Ok(())
}

#[given("the board is loaded without drop zones")]
fn board_without_zones(world: &mut BoardWorld) -> Result<(), eyre::Report> {
    run_async(world.board.refresh()).wrap_err("load board")?;
    Ok(())
}

#[given("the store rejects the next update")]
fn store_rejects_update(world: &mut BoardWorld) -> Result<(), eyre::Report> {
    world
        .gateway
        .fail_next(
            GatewayOperation::Update,
            RemoteErrorKind::Status {
                code: 409,
                body: "conflict".to_owned(),
            },
        )
        .wrap_err("queue update failure")?;
    Ok(())
}
