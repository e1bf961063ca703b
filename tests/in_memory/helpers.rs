//! Shared test helpers for in-memory pipeline integration tests.

use std::sync::Arc;

use mockable::DefaultClock;
use rstest::fixture;
use salesboard::pipeline::{
    adapters::memory::{InMemoryGateway, RecordingNotifier},
    board::{BoardSettings, PipelineBoard, Rect},
    domain::{ResourceName, StageKey},
    services::MutationCoordinator,
};
use serde_json::{Value, json};

/// Board type used by the integration tests.
pub type TestBoard = PipelineBoard<InMemoryGateway, RecordingNotifier, DefaultClock>;

/// In-memory store, recording notifier, and a board wired to both.
pub struct Pipeline {
    pub store: Arc<InMemoryGateway>,
    pub notifier: Arc<RecordingNotifier>,
    pub board: TestBoard,
}

impl Pipeline {
    /// Seeds `records` into the sales pipeline resource.
    ///
    /// # Panics
    ///
    /// Panics if the store rejects the seed.
    pub fn seed(&self, records: impl IntoIterator<Item = Value>) -> Vec<u64> {
        self.store
            .seed(&ResourceName::sales_pipeline(), records)
            .expect("seeding should succeed")
    }

    /// Returns the stored record for `id`.
    ///
    /// # Panics
    ///
    /// Panics if the record does not exist.
    pub fn stored(&self, id: u64) -> Value {
        self.store
            .peek(&ResourceName::sales_pipeline(), id)
            .expect("peek should succeed")
            .expect("record should exist")
    }

    /// Registers one 200px-wide column per stage, left to right.
    pub fn register_columns(&mut self) {
        let keys: Vec<&str> = self.board.coordinator().registry().keys().collect();
        let mut left = 0.0;
        for key in keys {
            self.board
                .register_drop_zone(StageKey::new(key), Rect::new(left, 0.0, 200.0, 600.0));
            left += 200.0;
        }
    }
}

/// Provides an empty pipeline with confirmed moves.
#[fixture]
pub fn pipeline() -> Pipeline {
    pipeline_with(BoardSettings::default())
}

/// Builds a pipeline with `settings`.
#[must_use]
pub fn pipeline_with(settings: BoardSettings) -> Pipeline {
    let store = Arc::new(InMemoryGateway::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let coordinator = MutationCoordinator::new(
        Arc::clone(&store),
        Arc::clone(&notifier),
        Arc::new(DefaultClock),
    );
    Pipeline {
        store,
        notifier,
        board: PipelineBoard::new(coordinator, settings),
    }
}

/// Store record for a task in `stage`.
#[must_use]
pub fn task_record(id: u64, title: &str, stage: &str) -> Value {
    json!({
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
    })
}
