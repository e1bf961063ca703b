//! Shared world state for board drag-and-drop BDD scenarios.

use std::sync::Arc;

use mockable::DefaultClock;
use rstest::fixture;
use salesboard::pipeline::{
    adapters::memory::{InMemoryGateway, RecordingNotifier},
    board::{BoardSettings, GestureError, PipelineBoard, Point, Rect, ReleaseOutcome},
    services::{MutationCoordinator, MutationError},
};

/// Board type used by the BDD world.
pub type TestBoard = PipelineBoard<InMemoryGateway, RecordingNotifier, DefaultClock>;

/// Width of every column's drop zone.
pub const COLUMN_WIDTH: f64 = 200.0;

/// Height of every column's drop zone.
pub const COLUMN_HEIGHT: f64 = 600.0;

/// Bounds of a card rendered in the first column.
pub const CARD: Rect = Rect::new(10.0, 100.0, 180.0, 60.0);

/// Where the pointer grabs [`CARD`].
pub const GRAB: Point = Point::new(50.0, 120.0);

/// Scenario world for board drag behaviour tests.
pub struct BoardWorld {
    pub gateway: Arc<InMemoryGateway>,
    pub notifier: Arc<RecordingNotifier>,
    pub board: TestBoard,
    pub last_release: Option<Result<ReleaseOutcome, MutationError>>,
    pub last_press: Option<Result<(), GestureError>>,
    pub detail_title: Option<String>,
}

impl BoardWorld {
    /// Creates a world over an empty store.
    #[must_use]
    pub fn new() -> Self {
        let gateway = Arc::new(InMemoryGateway::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let coordinator = MutationCoordinator::new(
            Arc::clone(&gateway),
            Arc::clone(&notifier),
            Arc::new(DefaultClock),
        );

        Self {
            gateway,
            notifier,
            board: PipelineBoard::new(coordinator, BoardSettings::default()),
            last_release: None,
            last_press: None,
            detail_title: None,
        }
    }
}

impl Default for BoardWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> BoardWorld {
    BoardWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
