//! Mutation coordinator: applies task writes through the gateway.
//!
//! Every write sends the complete record. Two consistency modes exist:
//!
//! - [`ConsistencyMode::Confirmed`] awaits the write, then re-lists the
//!   store so the caller can replace its view with the accepted state. On
//!   failure nothing is applied.
//! - [`ConsistencyMode::Optimistic`] hands the write to a spawned task and
//!   returns at once with a [`PendingWrite`]; the caller shows the intended
//!   value immediately. The outcome is reported through the [`Notifier`]
//!   when the write settles. Writes queued on the same [`WriteLane`] run
//!   one after another, in the order they were issued.

use crate::pipeline::{
    domain::{RecordCodecError, ResourceName, StageKey, StageRegistry, Task, TaskDraft, TaskId,
        ValidationError},
    ports::{
        GatewayOperation, MutationAction, Notification, Notifier, RecordGateway, RemoteError,
        RemoteErrorKind,
    },
};
use mockable::Clock;
use serde::Deserialize;
use serde_json::Value;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use thiserror::Error;
use tokio::{sync::oneshot, task::JoinHandle};

/// How a write is reconciled with the visible board.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsistencyMode {
    /// Wait for the write, then re-list.
    #[default]
    Confirmed,
    /// Show the change at once and write in the background.
    Optimistic,
}

/// Errors surfaced by coordinator operations.
#[derive(Debug, Error)]
pub enum MutationError {
    /// Input was rejected before reaching the gateway.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// The gateway call failed.
    #[error(transparent)]
    Remote(#[from] RemoteError),
    /// The task could not be converted to or from a record.
    #[error(transparent)]
    Codec(#[from] RecordCodecError),
    /// A background write ended without producing a result.
    #[error("background write for task {task_id} aborted: {reason}")]
    WriteAborted {
        /// Task the write was for.
        task_id: TaskId,
        /// Runtime message.
        reason: String,
    },
}

/// Result type for coordinator operations.
pub type MutationResult<T> = Result<T, MutationError>;

/// Handle to an optimistic write running in the background.
#[derive(Debug)]
pub struct PendingWrite {
    task_id: TaskId,
    handle: JoinHandle<Result<Task, RemoteError>>,
}

impl PendingWrite {
    /// Returns the task being written.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Returns whether the write has settled.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Waits for the write to settle.
    ///
    /// The notification has already been emitted when this returns.
    ///
    /// # Errors
    ///
    /// Returns [`MutationError::Remote`] when the write failed and
    /// [`MutationError::WriteAborted`] when the background task panicked or
    /// was cancelled.
    pub async fn settle(self) -> MutationResult<Task> {
        let task_id = self.task_id;
        match self.handle.await {
            Ok(result) => Ok(result?),
            Err(err) => Err(MutationError::WriteAborted {
                task_id,
                reason: err.to_string(),
            }),
        }
    }
}

/// Queue that orders background writes.
///
/// Each write queued on a lane starts only after the previous one has
/// settled, so a later full-record write always lands last.
#[derive(Debug, Default)]
pub struct WriteLane {
    tail: Option<oneshot::Receiver<()>>,
}

impl WriteLane {
    /// Creates an empty lane.
    #[must_use]
    pub const fn new() -> Self {
        Self { tail: None }
    }

    /// Waits until every write queued so far has settled.
    pub async fn drain(&mut self) {
        if let Some(tail) = self.tail.take() {
            wait_for(tail).await;
        }
    }

    fn enqueue(&mut self) -> (Option<oneshot::Receiver<()>>, oneshot::Sender<()>) {
        let (finished, tail) = oneshot::channel();
        (self.tail.replace(tail), finished)
    }
}

/// Resolves once the sender side is dropped by its finished write.
async fn wait_for(previous: oneshot::Receiver<()>) {
    previous.await.unwrap_or_default();
}

/// A write the store has accepted.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfirmedWrite {
    /// The record as accepted by the store.
    pub task: Task,
    /// Fresh store contents, absent when the follow-up re-list failed.
    pub snapshot: Option<Vec<Task>>,
}

/// Result of a write whose mode is chosen by the caller.
#[derive(Debug)]
pub enum WriteOutcome {
    /// The store accepted the write.
    Confirmed(ConfirmedWrite),
    /// The write is still running.
    Pending(PendingWrite),
}

/// Wording of the notifications of one write.
#[derive(Debug, Clone)]
struct WriteLabels {
    action: MutationAction,
    success: Notification,
    failure: &'static str,
}

/// Coordinates task writes and their notifications.
pub struct MutationCoordinator<G, N, C>
where
    G: RecordGateway + 'static,
    N: Notifier + 'static,
    C: Clock + Send + Sync,
{
    gateway: Arc<G>,
    notifier: Arc<N>,
    clock: Arc<C>,
    registry: &'static StageRegistry,
    resource: ResourceName,
    diverged: Arc<AtomicBool>,
}

impl<G, N, C> Clone for MutationCoordinator<G, N, C>
where
    G: RecordGateway + 'static,
    N: Notifier + 'static,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            gateway: Arc::clone(&self.gateway),
            notifier: Arc::clone(&self.notifier),
            clock: Arc::clone(&self.clock),
            registry: self.registry,
            resource: self.resource.clone(),
            diverged: Arc::clone(&self.diverged),
        }
    }
}

impl<G, N, C> MutationCoordinator<G, N, C>
where
    G: RecordGateway + 'static,
    N: Notifier + 'static,
    C: Clock + Send + Sync,
{
    /// Creates a coordinator for the sales pipeline resource.
    #[must_use]
    pub fn new(gateway: Arc<G>, notifier: Arc<N>, clock: Arc<C>) -> Self {
        Self {
            gateway,
            notifier,
            clock,
            registry: StageRegistry::sales_pipeline(),
            resource: ResourceName::sales_pipeline(),
            diverged: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Targets another resource name.
    #[must_use]
    pub fn with_resource(mut self, resource: ResourceName) -> Self {
        self.resource = resource;
        self
    }

    /// Returns the stage registry.
    #[must_use]
    pub const fn registry(&self) -> &'static StageRegistry {
        self.registry
    }

    /// Returns the resource tasks live in.
    #[must_use]
    pub const fn resource(&self) -> &ResourceName {
        &self.resource
    }

    /// Returns the clock.
    #[must_use]
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Returns the notifier.
    #[must_use]
    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Returns whether a background write failed since the last
    /// [`Self::clear_divergence`].
    ///
    /// Shared by every clone of this coordinator, and set whether or not
    /// the failed [`PendingWrite`] was awaited.
    #[must_use]
    pub fn has_diverged(&self) -> bool {
        self.diverged.load(Ordering::SeqCst)
    }

    /// Forgets earlier background write failures.
    pub fn clear_divergence(&self) {
        self.diverged.store(false, Ordering::SeqCst);
    }

    /// Lists every task in the store.
    ///
    /// Records that do not decode as tasks are skipped with a warning so one
    /// bad record cannot blank the board.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError`] when the list call fails.
    pub async fn fetch_tasks(&self) -> Result<Vec<Task>, RemoteError> {
        let records = self.gateway.list(&self.resource).await?;
        let total = records.len();
        let tasks: Vec<Task> = records
            .into_iter()
            .filter_map(|record| match Task::from_record(record) {
                Ok(task) => Some(task),
                Err(err) => {
                    tracing::warn!(resource = %self.resource, error = %err, "skipping undecodable task record");
                    None
                }
            })
            .collect();
        tracing::debug!(resource = %self.resource, total, decoded = tasks.len(), "listed tasks");
        Ok(tasks)
    }

    /// Loads one task.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError`] when the call fails or the record does not
    /// decode.
    pub async fn load_task(&self, id: TaskId) -> Result<Task, RemoteError> {
        let record = self.gateway.get(&self.resource, id.value()).await?;
        Task::from_record(record).map_err(|err| {
            RemoteError::new(
                self.resource.clone(),
                GatewayOperation::Get,
                RemoteErrorKind::MalformedPayload(err.to_string()),
            )
        })
    }

    /// Moves `task` to `new_stage`.
    ///
    /// # Errors
    ///
    /// Returns [`MutationError::Validation`] for unregistered stages and
    /// [`MutationError::Remote`] when a confirmed write fails.
    pub async fn move_task(
        &self,
        task: &Task,
        new_stage: StageKey,
        mode: ConsistencyMode,
    ) -> MutationResult<WriteOutcome> {
        let Some(stage) = self.registry.lookup(new_stage.as_str()) else {
            return Err(ValidationError::UnknownStage(new_stage).into());
        };
        let mut moved = task.clone();
        moved.set_stage(new_stage);
        let labels = WriteLabels {
            action: MutationAction::Move,
            success: Notification::success(MutationAction::Move, "Task moved")
                .with_description(format!("Moved to {}", stage.title())),
            failure: "Could not move task",
        };
        self.write(moved, mode, labels).await
    }

    /// Saves the full task in confirmed mode.
    ///
    /// # Errors
    ///
    /// Returns [`MutationError::Validation`] for a blank title and
    /// [`MutationError::Remote`] when the write fails.
    pub async fn save_task(&self, task: Task) -> MutationResult<ConfirmedWrite> {
        if task.title().trim().is_empty() {
            return Err(ValidationError::MissingTitle.into());
        }
        let labels = WriteLabels {
            action: MutationAction::Update,
            success: Notification::success(MutationAction::Update, "Task updated"),
            failure: "Could not update task",
        };
        self.write_confirmed(task, labels).await
    }

    /// Writes `baseline` with `tags` replaced, in optimistic mode.
    ///
    /// The write is queued on `lane` and starts once the writes queued
    /// before it have settled. Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`MutationError::Codec`] when the record cannot be encoded.
    pub fn write_tags(
        &self,
        lane: &mut WriteLane,
        baseline: &Task,
        tags: Vec<String>,
    ) -> MutationResult<PendingWrite> {
        let mut tagged = baseline.clone();
        tagged.set_tags(tags);
        let labels = WriteLabels {
            action: MutationAction::Tags,
            success: Notification::success(MutationAction::Tags, "Tags updated"),
            failure: "Could not update tags",
        };
        self.spawn_write(tagged, labels, Some(lane))
    }

    /// Soft-deletes `task` by rewriting it with the deleted marker.
    ///
    /// # Errors
    ///
    /// Returns [`MutationError::Remote`] when the write fails.
    pub async fn soft_delete(&self, task: &Task) -> MutationResult<ConfirmedWrite> {
        let mut deleted = task.clone();
        deleted.mark_deleted();
        let labels = WriteLabels {
            action: MutationAction::Delete,
            success: Notification::success(MutationAction::Delete, "Task deleted"),
            failure: "Could not delete task",
        };
        self.write_confirmed(deleted, labels).await
    }

    /// Creates a task from `draft` and re-lists the store.
    ///
    /// The new record always carries an empty checklist, medium priority,
    /// and the current clock reading as its creation date.
    ///
    /// # Errors
    ///
    /// Returns [`MutationError::Validation`] before any gateway call when the
    /// draft is invalid, and [`MutationError::Remote`] when creation fails.
    pub async fn create_task(&self, draft: &TaskDraft) -> MutationResult<ConfirmedWrite> {
        draft.validate(self.registry)?;
        let payload = draft.to_record(self.clock.utc())?;
        let created = match self.gateway.create(&self.resource, &payload).await {
            Ok(record) => record,
            Err(err) => {
                self.notifier.notify(
                    Notification::error(MutationAction::Create, "Could not create task")
                        .with_description(err.to_string()),
                );
                return Err(err.into());
            }
        };
        let task = Task::from_record(created).map_err(|err| {
            RemoteError::new(
                self.resource.clone(),
                GatewayOperation::Create,
                RemoteErrorKind::MalformedPayload(err.to_string()),
            )
        })?;
        tracing::info!(task_id = %task.id(), stage = %task.stage(), "task created");
        self.notifier.notify(
            Notification::success(MutationAction::Create, "Task created")
                .with_description(task.title().to_owned()),
        );
        let snapshot = self.refresh_after_write().await;
        Ok(ConfirmedWrite { task, snapshot })
    }

    async fn write(
        &self,
        task: Task,
        mode: ConsistencyMode,
        labels: WriteLabels,
    ) -> MutationResult<WriteOutcome> {
        match mode {
            ConsistencyMode::Confirmed => self
                .write_confirmed(task, labels)
                .await
                .map(WriteOutcome::Confirmed),
            ConsistencyMode::Optimistic => self
                .spawn_write(task, labels, None)
                .map(WriteOutcome::Pending),
        }
    }

    async fn write_confirmed(
        &self,
        task: Task,
        labels: WriteLabels,
    ) -> MutationResult<ConfirmedWrite> {
        let record = task.to_record()?;
        let accepted = match update_task_record(&*self.gateway, &self.resource, task, &record).await
        {
            Ok(accepted) => accepted,
            Err(err) => {
                self.notifier.notify(
                    Notification::error(labels.action, labels.failure)
                        .with_description(err.to_string()),
                );
                return Err(err.into());
            }
        };
        self.notifier.notify(labels.success);
        let snapshot = self.refresh_after_write().await;
        Ok(ConfirmedWrite {
            task: accepted,
            snapshot,
        })
    }

    fn spawn_write(
        &self,
        task: Task,
        labels: WriteLabels,
        lane: Option<&mut WriteLane>,
    ) -> MutationResult<PendingWrite> {
        let record = task.to_record()?;
        let task_id = task.id();
        let gateway = Arc::clone(&self.gateway);
        let notifier = Arc::clone(&self.notifier);
        let diverged = Arc::clone(&self.diverged);
        let resource = self.resource.clone();
        let (previous, finished) = lane.map_or((None, None), |queue| {
            let (waiting_on, done) = queue.enqueue();
            (waiting_on, Some(done))
        });
        let handle = tokio::spawn(async move {
            if let Some(earlier) = previous {
                wait_for(earlier).await;
            }
            let result = update_task_record(&*gateway, &resource, task, &record).await;
            match &result {
                Ok(_) => notifier.notify(labels.success),
                Err(err) => {
                    diverged.store(true, Ordering::SeqCst);
                    tracing::warn!(%task_id, error = %err, "optimistic write failed");
                    notifier.notify(
                        Notification::error(labels.action, labels.failure)
                            .with_description(err.to_string()),
                    );
                }
            }
            drop(finished);
            result
        });
        Ok(PendingWrite { task_id, handle })
    }

    async fn refresh_after_write(&self) -> Option<Vec<Task>> {
        match self.fetch_tasks().await {
            Ok(tasks) => Some(tasks),
            Err(err) => {
                self.notifier.notify(
                    Notification::error(MutationAction::Refresh, "Could not refresh board")
                        .with_description(err.to_string()),
                );
                None
            }
        }
    }
}

/// Sends the full record and decodes the store's answer.
///
/// A response that does not decode as a task falls back to the task that
/// was sent; the write itself succeeded.
async fn update_task_record<G>(
    gateway: &G,
    resource: &ResourceName,
    sent: Task,
    record: &Value,
) -> Result<Task, RemoteError>
where
    G: RecordGateway + ?Sized,
{
    let response = gateway
        .update(resource, sent.id().value(), record)
        .await?;
    Ok(Task::from_record(response).unwrap_or_else(|err| {
        tracing::warn!(task_id = %sent.id(), error = %err, "update response did not decode; keeping sent record");
        sent
    }))
}
