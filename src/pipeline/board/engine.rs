//! Pipeline board: the in-memory task set, drop zones, and gestures.

use super::{
    columns::{BoardView, partition},
    drag::{DEFAULT_ACTIVATION_DISTANCE, DragTracker, GestureError, GestureOutcome},
    geometry::{DropZone, Point, Rect},
};
use crate::pipeline::{
    domain::{StageKey, Task, TaskDraft, TaskId},
    ports::{MutationAction, Notification, Notifier, RecordGateway, RemoteError},
    services::{
        ConfirmedWrite, ConsistencyMode, CreateTaskForm, MutationCoordinator, MutationResult,
        PendingWrite, TaskDetailSession, WriteOutcome,
    },
};
use mockable::Clock;
use std::fmt;

/// Board tuning knobs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoardSettings {
    /// Pointer travel, in pixels, before a press becomes a drag.
    pub activation_distance: f64,
    /// Consistency mode of stage moves.
    pub move_consistency: ConsistencyMode,
}

impl Default for BoardSettings {
    fn default() -> Self {
        Self {
            activation_distance: DEFAULT_ACTIVATION_DISTANCE,
            move_consistency: ConsistencyMode::Confirmed,
        }
    }
}

/// Reason a move request was dropped without a write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoredMove {
    /// The card was released away from every drop zone.
    NoTarget,
    /// The target is not a registered stage.
    UnknownStage(StageKey),
    /// The task already sits in the target stage.
    SameStage(StageKey),
    /// The task is no longer on the board.
    UnknownTask(TaskId),
}

impl fmt::Display for IgnoredMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoTarget => f.write_str("released outside every column"),
            Self::UnknownStage(stage) => write!(f, "stage {stage} is not registered"),
            Self::SameStage(stage) => write!(f, "task is already in stage {stage}"),
            Self::UnknownTask(id) => write!(f, "task {id} is not on the board"),
        }
    }
}

/// Result of a stage move.
#[derive(Debug)]
pub enum MoveOutcome {
    /// Nothing was written.
    Ignored(IgnoredMove),
    /// The store accepted the move and the board was refreshed.
    Applied(Task),
    /// The board shows the move; the write is still running.
    Pending(PendingWrite),
}

/// Result of releasing the pointer.
#[derive(Debug)]
pub enum ReleaseOutcome {
    /// No gesture was active.
    Idle,
    /// The gesture was a click; the caller should open the detail view.
    Clicked(TaskId),
    /// The gesture was a drag.
    Dropped(MoveOutcome),
}

/// Sales pipeline board.
///
/// Owns the task set between explicit refreshes. Rendering is a pure
/// function of that set, the clock, and the hovered drop zone.
pub struct PipelineBoard<G, N, C>
where
    G: RecordGateway + 'static,
    N: Notifier + 'static,
    C: Clock + Send + Sync,
{
    coordinator: MutationCoordinator<G, N, C>,
    settings: BoardSettings,
    tasks: Vec<Task>,
    zones: Vec<DropZone>,
    drag: DragTracker,
    stale: bool,
}

impl<G, N, C> PipelineBoard<G, N, C>
where
    G: RecordGateway + 'static,
    N: Notifier + 'static,
    C: Clock + Send + Sync,
{
    /// Creates an empty board. Call [`Self::refresh`] to load tasks.
    #[must_use]
    pub const fn new(coordinator: MutationCoordinator<G, N, C>, settings: BoardSettings) -> Self {
        Self {
            coordinator,
            settings,
            tasks: Vec::new(),
            zones: Vec::new(),
            drag: DragTracker::new(settings.activation_distance),
            stale: true,
        }
    }

    /// Returns the coordinator.
    #[must_use]
    pub const fn coordinator(&self) -> &MutationCoordinator<G, N, C> {
        &self.coordinator
    }

    /// Returns the settings.
    #[must_use]
    pub const fn settings(&self) -> BoardSettings {
        self.settings
    }

    /// Returns every task on the board, deleted ones included.
    #[must_use]
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Returns the task with `id`.
    #[must_use]
    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id() == id)
    }

    /// Returns whether the board may diverge from the store.
    ///
    /// Set before the first load, after a failed background write (awaited
    /// or not, from the board or from a detail session), and after a
    /// confirmed write whose follow-up refresh failed.
    #[must_use]
    pub fn is_stale(&self) -> bool {
        self.stale || self.coordinator.has_diverged()
    }

    /// Returns the active gesture's hover target.
    #[must_use]
    pub const fn hovered_stage(&self) -> Option<&StageKey> {
        self.drag.hovered()
    }

    /// Replaces the task set with the store's contents.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError`] when listing fails; the previous task set is
    /// kept and an error notification is emitted.
    pub async fn refresh(&mut self) -> Result<(), RemoteError> {
        self.coordinator.clear_divergence();
        match self.coordinator.fetch_tasks().await {
            Ok(tasks) => {
                self.replace_tasks(tasks);
                Ok(())
            }
            Err(err) => {
                self.coordinator.notifier().notify(
                    Notification::error(MutationAction::Refresh, "Could not load board")
                        .with_description(err.to_string()),
                );
                self.stale = true;
                Err(err)
            }
        }
    }

    /// Refreshes only when the board is stale.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError`] when the refresh fails.
    pub async fn refresh_if_stale(&mut self) -> Result<bool, RemoteError> {
        if !self.stale {
            return Ok(false);
        }
        self.refresh().await?;
        Ok(true)
    }

    /// Renders the board into stage columns at the current clock instant.
    #[must_use]
    pub fn list_tasks_by_stage(&self) -> BoardView {
        partition(
            &self.tasks,
            self.coordinator.registry(),
            self.coordinator.clock().utc(),
            self.drag.hovered(),
        )
    }

    /// Registers the column of `stage` as a drop target at `bounds`.
    ///
    /// Re-registering a stage updates its bounds and keeps its position in
    /// the registration order.
    pub fn register_drop_zone(&mut self, stage: StageKey, bounds: Rect) {
        match self.zones.iter_mut().find(|zone| zone.stage == stage) {
            Some(zone) => zone.bounds = bounds,
            None => self.zones.push(DropZone { stage, bounds }),
        }
    }

    /// Removes every drop zone.
    pub fn clear_drop_zones(&mut self) {
        self.zones.clear();
    }

    /// Returns the registered drop zones.
    #[must_use]
    pub fn drop_zones(&self) -> &[DropZone] {
        &self.zones
    }

    /// Presses the pointer on the card of `task`.
    ///
    /// # Errors
    ///
    /// Returns [`GestureError::GestureInProgress`] while another gesture is
    /// active.
    pub fn pointer_down(&mut self, task: TaskId, card: Rect, at: Point) -> Result<(), GestureError> {
        self.drag.pointer_down(task, card, at)
    }

    /// Moves the pointer and returns the hovered stage.
    pub fn pointer_move(&mut self, at: Point) -> Option<&StageKey> {
        self.drag.pointer_move(at, &self.zones)
    }

    /// Aborts the active gesture. Returns whether one was active.
    pub fn pointer_cancel(&mut self) -> bool {
        self.drag.cancel()
    }

    /// Releases the pointer and applies the resulting move, if any.
    ///
    /// # Errors
    ///
    /// Returns the coordinator's error when a confirmed move fails; the
    /// board is left as it was.
    pub async fn pointer_up(&mut self, at: Point) -> MutationResult<ReleaseOutcome> {
        match self.drag.pointer_up(at, &self.zones) {
            None => Ok(ReleaseOutcome::Idle),
            Some(GestureOutcome::Click(task)) => Ok(ReleaseOutcome::Clicked(task)),
            Some(GestureOutcome::Drop { task, target: None }) => {
                let reason = IgnoredMove::NoTarget;
                tracing::debug!(task_id = %task, %reason, "drop ignored");
                Ok(ReleaseOutcome::Dropped(MoveOutcome::Ignored(reason)))
            }
            Some(GestureOutcome::Drop {
                task,
                target: Some(stage),
            }) => self.move_task(task, stage).await.map(ReleaseOutcome::Dropped),
        }
    }

    /// Moves task `id` to `stage` with the configured consistency mode.
    ///
    /// Moves onto an unregistered stage, onto the task's own stage, or of a
    /// task not on the board are ignored without a gateway call.
    ///
    /// # Errors
    ///
    /// Returns the coordinator's error when a confirmed move fails.
    pub async fn move_task(&mut self, id: TaskId, stage: StageKey) -> MutationResult<MoveOutcome> {
        let current = match self.check_move(id, &stage) {
            Ok(task) => task.clone(),
            Err(reason) => {
                tracing::debug!(task_id = %id, %reason, "move ignored");
                return Ok(MoveOutcome::Ignored(reason));
            }
        };
        let mode = self.settings.move_consistency;
        match self.coordinator.move_task(&current, stage.clone(), mode).await? {
            WriteOutcome::Confirmed(confirmed) => Ok(MoveOutcome::Applied(self.absorb(confirmed))),
            WriteOutcome::Pending(pending) => {
                let mut moved = current;
                moved.set_stage(stage);
                self.apply_local(moved);
                Ok(MoveOutcome::Pending(pending))
            }
        }
    }

    /// Creates a task and refreshes the board.
    ///
    /// # Errors
    ///
    /// Returns the coordinator's error for invalid drafts and failed writes.
    pub async fn create_task(&mut self, draft: &TaskDraft) -> MutationResult<Task> {
        let outcome = self.coordinator.create_task(draft).await?;
        Ok(self.absorb(outcome))
    }

    /// Writes the full `task` in confirmed mode and refreshes the board.
    ///
    /// # Errors
    ///
    /// Returns the coordinator's error when the write fails.
    pub async fn update_task(&mut self, task: Task) -> MutationResult<Task> {
        let outcome = self.coordinator.save_task(task).await?;
        Ok(self.absorb(outcome))
    }

    /// Soft-deletes task `id`.
    ///
    /// Returns `None` without a gateway call when the task is not on the
    /// board.
    ///
    /// # Errors
    ///
    /// Returns the coordinator's error when the write fails.
    pub async fn delete_task(&mut self, id: TaskId) -> MutationResult<Option<Task>> {
        let Some(current) = self.task(id).cloned() else {
            tracing::debug!(task_id = %id, "delete ignored: task is not on the board");
            return Ok(None);
        };
        let outcome = self.coordinator.soft_delete(&current).await?;
        Ok(Some(self.absorb(outcome)))
    }

    /// Awaits a background write. A failed write leaves the board stale
    /// whether or not it is awaited here.
    ///
    /// # Errors
    ///
    /// Returns the write's error.
    pub async fn settle(&mut self, pending: PendingWrite) -> MutationResult<Task> {
        let result = pending.settle().await;
        if result.is_err() {
            self.stale = true;
        }
        result
    }

    /// Opens a detail session on a copy of task `id`.
    #[must_use]
    pub fn open_detail(&self, id: TaskId) -> Option<TaskDetailSession<G, N, C>> {
        self.task(id)
            .map(|task| TaskDetailSession::open(self.coordinator.clone(), task.clone()))
    }

    /// Opens the quick-create form bound to `stage`.
    #[must_use]
    pub fn open_create(&self, stage: StageKey) -> CreateTaskForm<G, N, C> {
        CreateTaskForm::new(self.coordinator.clone(), stage)
    }

    /// Applies the result of a confirmed write.
    ///
    /// With a snapshot the whole task set is replaced; without one only the
    /// accepted task is, and the board is marked stale.
    pub fn apply_confirmed(&mut self, task: Task, snapshot: Option<Vec<Task>>) {
        match snapshot {
            Some(tasks) => self.replace_tasks(tasks),
            None => {
                self.apply_local(task);
                self.stale = true;
            }
        }
    }

    /// Shows `task` on the board without contacting the store.
    pub fn apply_local(&mut self, task: Task) {
        match self.tasks.iter_mut().find(|existing| existing.id() == task.id()) {
            Some(existing) => *existing = task,
            None => self.tasks.push(task),
        }
    }

    fn absorb(&mut self, confirmed: ConfirmedWrite) -> Task {
        let ConfirmedWrite { task, snapshot } = confirmed;
        self.apply_confirmed(task.clone(), snapshot);
        task
    }

    fn check_move(&self, id: TaskId, stage: &StageKey) -> Result<&Task, IgnoredMove> {
        if !self.coordinator.registry().is_registered(stage.as_str()) {
            return Err(IgnoredMove::UnknownStage(stage.clone()));
        }
        let task = self
            .task(id)
            .filter(|task| !task.is_deleted())
            .ok_or(IgnoredMove::UnknownTask(id))?;
        if task.stage() == stage {
            return Err(IgnoredMove::SameStage(stage.clone()));
        }
        Ok(task)
    }

    fn replace_tasks(&mut self, tasks: Vec<Task>) {
        tracing::debug!(count = tasks.len(), "board refreshed");
        self.tasks = tasks;
        self.stale = false;
    }
}
