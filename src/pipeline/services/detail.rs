//! Task detail session: a snapshot editor over one task.
//!
//! Field edits stay in the snapshot until [`TaskDetailSession::save`]. Tag
//! changes are the exception: each one writes through at once. A tag write
//! is built from the last persisted record so unsaved edits to other fields
//! never reach the store early. Tag writes of one session run in issue
//! order, and saving or deleting waits for them first.

use super::coordinator::{
    ConfirmedWrite, MutationCoordinator, MutationResult, PendingWrite, WriteLane,
};
use crate::pipeline::{
    domain::{ChecklistItemId, Priority, StageKey, Task, TaskId, ValidationError},
    ports::{Notifier, RecordGateway},
};
use chrono::{DateTime, Utc};
use mockable::Clock;

/// Editor over a copy of one task.
pub struct TaskDetailSession<G, N, C>
where
    G: RecordGateway + 'static,
    N: Notifier + 'static,
    C: Clock + Send + Sync,
{
    coordinator: MutationCoordinator<G, N, C>,
    persisted: Task,
    snapshot: Task,
    lane: WriteLane,
}

impl<G, N, C> TaskDetailSession<G, N, C>
where
    G: RecordGateway + 'static,
    N: Notifier + 'static,
    C: Clock + Send + Sync,
{
    /// Opens a session on `task`.
    #[must_use]
    pub fn open(coordinator: MutationCoordinator<G, N, C>, task: Task) -> Self {
        Self {
            coordinator,
            snapshot: task.clone(),
            persisted: task,
            lane: WriteLane::new(),
        }
    }

    /// Returns the task being edited.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.persisted.id()
    }

    /// Returns the working copy.
    #[must_use]
    pub const fn snapshot(&self) -> &Task {
        &self.snapshot
    }

    /// Returns the last record known to be written.
    #[must_use]
    pub const fn persisted(&self) -> &Task {
        &self.persisted
    }

    /// Returns whether the snapshot has unsaved edits.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.snapshot != self.persisted
    }

    /// Sets the title.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.snapshot.set_title(title);
    }

    /// Sets the description.
    pub fn set_description(&mut self, description: impl Into<String>) {
        self.snapshot.set_description(description);
    }

    /// Selects a new stage.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::UnknownStage`] for unregistered stages.
    pub fn set_stage(&mut self, stage: StageKey) -> Result<(), ValidationError> {
        if !self.coordinator.registry().is_registered(stage.as_str()) {
            return Err(ValidationError::UnknownStage(stage));
        }
        self.snapshot.set_stage(stage);
        Ok(())
    }

    /// Sets or clears the due date.
    pub const fn set_due_date(&mut self, due_date: Option<DateTime<Utc>>) {
        self.snapshot.set_due_date(due_date);
    }

    /// Sets the priority.
    pub const fn set_priority(&mut self, priority: Priority) {
        self.snapshot.set_priority(priority);
    }

    /// Flips the done flag of a checklist item.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::ChecklistItemNotFound`] for unknown ids.
    pub fn toggle_checklist_item(&mut self, id: ChecklistItemId) -> Result<bool, ValidationError> {
        self.snapshot.toggle_checklist_item(id)
    }

    /// Appends a checklist item.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyChecklistText`] for blank text.
    pub fn add_checklist_item(&mut self, text: &str) -> Result<ChecklistItemId, ValidationError> {
        self.snapshot
            .add_checklist_item(text, self.coordinator.clock())
    }

    /// Removes a checklist item.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::ChecklistItemNotFound`] for unknown ids.
    pub fn remove_checklist_item(&mut self, id: ChecklistItemId) -> Result<(), ValidationError> {
        self.snapshot.remove_checklist_item(id).map(drop)
    }

    /// Returns the current stage's vocabulary minus attached tags.
    #[must_use]
    pub fn tag_suggestions(&self) -> Vec<&'static str> {
        self.coordinator
            .registry()
            .tag_vocabulary(self.snapshot.stage().as_str())
            .iter()
            .copied()
            .filter(|tag| !self.snapshot.has_tag(tag))
            .collect()
    }

    /// Attaches `tag` and writes the tag list through.
    ///
    /// Returns `None` when the tag was already attached.
    ///
    /// # Errors
    ///
    /// Returns a validation error for blank tags.
    pub fn add_tag(&mut self, tag: &str) -> MutationResult<Option<PendingWrite>> {
        if !self.snapshot.add_tag(tag)? {
            return Ok(None);
        }
        self.write_tags().map(Some)
    }

    /// Detaches `tag` and writes the tag list through.
    ///
    /// Returns `None` when the tag was not attached.
    ///
    /// # Errors
    ///
    /// Returns a codec error when the record cannot be encoded.
    pub fn remove_tag(&mut self, tag: &str) -> MutationResult<Option<PendingWrite>> {
        if !self.snapshot.remove_tag(tag) {
            return Ok(None);
        }
        self.write_tags().map(Some)
    }

    /// Sends the whole snapshot in confirmed mode.
    ///
    /// Tag writes already issued settle first. On success the snapshot and
    /// the persisted record both become the store's accepted value.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a blank title and the remote error
    /// when the write fails; the snapshot is kept either way.
    pub async fn save(&mut self) -> MutationResult<ConfirmedWrite> {
        self.lane.drain().await;
        let confirmed = self.coordinator.save_task(self.snapshot.clone()).await?;
        self.persisted = confirmed.task.clone();
        self.snapshot = confirmed.task.clone();
        Ok(confirmed)
    }

    /// Waits until every tag write issued by this session has settled.
    pub async fn flush_tag_writes(&mut self) {
        self.lane.drain().await;
    }

    /// Closes the session, discarding unsaved edits.
    ///
    /// Returns the last persisted record; tag writes already issued stay.
    #[must_use]
    pub fn cancel(self) -> Task {
        if self.is_dirty() {
            tracing::debug!(task_id = %self.task_id(), "discarding unsaved task edits");
        }
        self.persisted
    }

    /// Soft-deletes the task and closes the session, after any issued tag
    /// writes have settled.
    ///
    /// # Errors
    ///
    /// Returns the remote error when the write fails.
    pub async fn delete(mut self) -> MutationResult<ConfirmedWrite> {
        self.lane.drain().await;
        self.coordinator.soft_delete(&self.persisted).await
    }

    fn write_tags(&mut self) -> MutationResult<PendingWrite> {
        let tags = self.snapshot.tags().to_vec();
        let pending = self
            .coordinator
            .write_tags(&mut self.lane, &self.persisted, tags.clone())?;
        self.persisted.set_tags(tags);
        Ok(pending)
    }
}
