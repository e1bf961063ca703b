//! In-memory integration tests for detail sessions and quick create.

use super::helpers::{Pipeline, pipeline, task_record};
use rstest::rstest;
use salesboard::pipeline::{
    domain::{StageKey, TaskId, ValidationError},
    ports::{GatewayOperation, MutationAction},
    services::MutationError,
};
use serde_json::json;

async fn loaded(mut pipeline: Pipeline) -> Pipeline {
    pipeline.seed(vec![task_record(1, "Demo", "COTIZACION")]);
    pipeline.board.refresh().await.expect("board should load");
    pipeline
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn tag_writes_reach_the_store_without_unsaved_edits(pipeline: Pipeline) {
    let mut pipeline = loaded(pipeline).await;
    let mut session = pipeline
        .board
        .open_detail(TaskId::new(1))
        .expect("task should be on the board");
    session.set_title("Renamed but unsaved");

    let pending = session
        .add_tag("Cotizado")
        .expect("tag should be accepted")
        .expect("a write should be issued");
    pipeline
        .board
        .settle(pending)
        .await
        .expect("tag write should settle");
    let persisted = session.cancel();

    let stored = pipeline.stored(1);
    assert_eq!(stored["etiquetas"], json!(["Cotizado"]));
    assert_eq!(stored["titulo"], "Demo");
    assert_eq!(persisted.tags(), ["Cotizado".to_owned()]);
    assert!(
        pipeline
            .notifier
            .notifications()
            .iter()
            .any(|note| note.action == MutationAction::Tags && !note.is_error())
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn saving_a_session_writes_every_edited_field(pipeline: Pipeline) {
    let mut pipeline = loaded(pipeline).await;
    let mut session = pipeline
        .board
        .open_detail(TaskId::new(1))
        .expect("task should be on the board");
    session.set_title("Demo ampliada");
    session.set_description("Llamar el lunes");
    session
        .set_stage(StageKey::new("NEGOCIACION"))
        .expect("stage should be known");
    session
        .add_checklist_item("Enviar ficha técnica")
        .expect("item should be added");

    let saved = session.save().await.expect("save should succeed");
    pipeline.board.apply_confirmed(saved.task, saved.snapshot);

    let stored = pipeline.stored(1);
    assert_eq!(stored["titulo"], "Demo ampliada");
    assert_eq!(stored["descripcion"], "Llamar el lunes");
    assert_eq!(stored["etapa"], "NEGOCIACION");
    assert_eq!(stored["checklist"][0]["texto"], "Enviar ficha técnica");
    assert_eq!(stored["checklist"][0]["completado"], false);
    let view = pipeline.board.list_tasks_by_stage();
    let card = view
        .column("NEGOCIACION")
        .and_then(|column| column.cards.first())
        .expect("saved card should move columns");
    assert_eq!((card.checklist_done, card.checklist_total), (0, 1));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn deleting_from_the_detail_view_soft_deletes(pipeline: Pipeline) {
    let mut pipeline = loaded(pipeline).await;
    let session = pipeline
        .board
        .open_detail(TaskId::new(1))
        .expect("task should be on the board");

    let deleted = session.delete().await.expect("delete should succeed");
    pipeline.board.apply_confirmed(deleted.task, deleted.snapshot);

    assert_eq!(pipeline.stored(1)["deleted"], true);
    assert_eq!(pipeline.board.list_tasks_by_stage().card_count(), 0);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn quick_create_adds_a_card_to_its_column(pipeline: Pipeline) {
    let mut pipeline = loaded(pipeline).await;
    let mut form = pipeline.board.open_create(StageKey::new("APARTADO"));
    form.set_title("Visita de demostración");
    form.add_tag("C/Fecha").expect("tag should be accepted");

    let created = form.submit().await.expect("create should succeed");
    let id = created.task.id();
    pipeline.board.apply_confirmed(created.task, created.snapshot);

    assert!(form.is_pristine());
    let stored = pipeline.stored(id.value());
    assert_eq!(stored["etapa"], "APARTADO");
    assert_eq!(stored["etiquetas"], json!(["C/Fecha"]));
    assert_eq!(stored["prioridad"], "media");
    assert!(stored["fecha_creacion"].is_string());
    let view = pipeline.board.list_tasks_by_stage();
    assert_eq!(
        view.column("APARTADO").map(|column| column.cards.len()),
        Some(1)
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn blank_titles_never_reach_the_store(pipeline: Pipeline) {
    let pipeline = loaded(pipeline).await;
    let mut form = pipeline.board.open_create(StageKey::inbox());
    form.set_title("   ");

    let result = form.submit().await;

    assert!(matches!(
        result,
        Err(MutationError::Validation(ValidationError::MissingTitle))
    ));
    let creates = pipeline
        .store
        .calls_of(GatewayOperation::Create)
        .expect("calls should be readable");
    assert!(creates.is_empty());
    assert_eq!(form.title(), "   ");
}
