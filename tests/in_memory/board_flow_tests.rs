//! In-memory integration tests for loading, rendering, and moving cards.

use super::helpers::{Pipeline, pipeline, pipeline_with, task_record};
use rstest::rstest;
use salesboard::pipeline::{
    board::{BoardSettings, MoveOutcome, Point, Rect, ReleaseOutcome},
    domain::{StageKey, TaskId},
    ports::{GatewayOperation, MutationAction, RemoteErrorKind},
    services::ConsistencyMode,
};
use serde_json::json;

const CARD: Rect = Rect::new(10.0, 100.0, 180.0, 60.0);
const GRAB: Point = Point::new(50.0, 120.0);

fn column_names(pipeline: &Pipeline) -> Vec<String> {
    pipeline
        .board
        .list_tasks_by_stage()
        .columns
        .iter()
        .map(|column| column.stage.to_string())
        .collect()
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn board_renders_every_stage_in_order(mut pipeline: Pipeline) {
    pipeline.seed(vec![
        task_record(1, "Demo", "NEGOCIACION"),
        task_record(2, "Cotizar", "INBOX"),
    ]);

    pipeline.board.refresh().await.expect("board should load");

    assert_eq!(
        column_names(&pipeline),
        vec![
            "INBOX",
            "COTIZACION",
            "NEGOCIACION",
            "APARTADO",
            "PAGADO",
            "FINALIZADO",
            "PERDIDO"
        ]
    );
    let view = pipeline.board.list_tasks_by_stage();
    assert_eq!(view.card_count(), 2);
    assert_eq!(
        view.column("NEGOCIACION").map(|column| column.cards.len()),
        Some(1)
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn deleted_and_unknown_stage_records_stay_off_the_columns(mut pipeline: Pipeline) {
    let mut deleted = task_record(1, "Descartado", "INBOX");
    deleted["deleted"] = json!(true);
    pipeline.seed(vec![
        deleted,
        task_record(2, "Huérfano", "ARCHIVADO"),
        task_record(3, "Visible", "INBOX"),
    ]);

    pipeline.board.refresh().await.expect("board should load");
    let view = pipeline.board.list_tasks_by_stage();

    assert_eq!(view.card_count(), 1);
    assert_eq!(view.unplaced, vec![TaskId::new(2)]);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn past_due_cards_are_overdue_until_finished(mut pipeline: Pipeline) {
    let mut open = task_record(1, "Pendiente", "APARTADO");
    open["fecha_vencimiento"] = json!("2020-01-01T00:00:00Z");
    let mut done = task_record(2, "Cerrado", "FINALIZADO");
    done["fecha_vencimiento"] = json!("2020-01-01T00:00:00Z");
    pipeline.seed(vec![open, done]);

    pipeline.board.refresh().await.expect("board should load");
    let view = pipeline.board.list_tasks_by_stage();

    let open_card = view
        .column("APARTADO")
        .and_then(|column| column.cards.first())
        .expect("open card should render");
    let done_card = view
        .column("FINALIZADO")
        .and_then(|column| column.cards.first())
        .expect("finished card should render");
    assert!(open_card.overdue);
    assert!(!done_card.overdue);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn dragging_a_card_rewrites_only_its_stage(mut pipeline: Pipeline) {
    let mut original = task_record(1, "Demo", "INBOX");
    original["origen"] = json!("feria");
    original["etiquetas"] = json!(["Sin fecha"]);
    pipeline.seed(vec![original]);
    pipeline.register_columns();
    pipeline.board.refresh().await.expect("board should load");

    pipeline
        .board
        .pointer_down(TaskId::new(1), CARD, GRAB)
        .expect("gesture should start");
    let hovered = pipeline.board.pointer_move(Point::new(280.0, 120.0)).cloned();
    let outcome = pipeline
        .board
        .pointer_up(Point::new(280.0, 120.0))
        .await
        .expect("drop should succeed");

    assert_eq!(hovered, Some(StageKey::new("COTIZACION")));
    assert!(matches!(
        outcome,
        ReleaseOutcome::Dropped(MoveOutcome::Applied(_))
    ));
    let stored = pipeline.stored(1);
    assert_eq!(stored["etapa"], "COTIZACION");
    assert_eq!(stored["origen"], "feria");
    assert_eq!(stored["etiquetas"], json!(["Sin fecha"]));
    assert_eq!(stored["titulo"], "Demo");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn optimistic_moves_show_first_and_settle_later() {
    let mut pipeline = pipeline_with(BoardSettings {
        move_consistency: ConsistencyMode::Optimistic,
        ..BoardSettings::default()
    });
    pipeline.seed(vec![task_record(1, "Demo", "INBOX")]);
    pipeline.board.refresh().await.expect("board should load");

    let outcome = pipeline
        .board
        .move_task(TaskId::new(1), StageKey::new("PAGADO"))
        .await
        .expect("move should be accepted");
    let MoveOutcome::Pending(pending) = outcome else {
        panic!("optimistic moves should return a pending write");
    };
    let shown = pipeline
        .board
        .task(TaskId::new(1))
        .map(|task| task.stage().to_string());
    let settled = pipeline
        .board
        .settle(pending)
        .await
        .expect("write should settle");

    assert_eq!(shown.as_deref(), Some("PAGADO"));
    assert_eq!(settled.stage().as_str(), "PAGADO");
    assert_eq!(pipeline.stored(1)["etapa"], "PAGADO");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn failed_optimistic_move_marks_the_board_stale_until_refreshed() {
    let mut pipeline = pipeline_with(BoardSettings {
        move_consistency: ConsistencyMode::Optimistic,
        ..BoardSettings::default()
    });
    pipeline.seed(vec![task_record(1, "Demo", "INBOX")]);
    pipeline.board.refresh().await.expect("board should load");
    pipeline
        .store
        .fail_next(GatewayOperation::Update, RemoteErrorKind::Status {
            code: 503,
            body: String::new(),
        })
        .expect("failure should queue");

    let outcome = pipeline
        .board
        .move_task(TaskId::new(1), StageKey::new("PERDIDO"))
        .await
        .expect("move should be accepted");
    let MoveOutcome::Pending(pending) = outcome else {
        panic!("optimistic moves should return a pending write");
    };
    let result = pipeline.board.settle(pending).await;

    assert!(result.is_err());
    assert!(pipeline.board.is_stale());
    let errors = pipeline.notifier.errors();
    assert!(errors.iter().any(|note| note.action == MutationAction::Move));

    let refreshed = pipeline
        .board
        .refresh_if_stale()
        .await
        .expect("refresh should succeed");
    assert!(refreshed);
    assert_eq!(
        pipeline
            .board
            .task(TaskId::new(1))
            .map(|task| task.stage().to_string())
            .as_deref(),
        Some("INBOX")
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn deleting_a_task_hides_it_but_keeps_the_record(mut pipeline: Pipeline) {
    pipeline.seed(vec![task_record(1, "Demo", "INBOX")]);
    pipeline.board.refresh().await.expect("board should load");

    let deleted = pipeline
        .board
        .delete_task(TaskId::new(1))
        .await
        .expect("delete should succeed");

    assert!(deleted.is_some_and(|task| task.is_deleted()));
    assert_eq!(pipeline.board.list_tasks_by_stage().card_count(), 0);
    assert_eq!(pipeline.stored(1)["deleted"], true);
}
