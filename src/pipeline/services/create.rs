//! Quick-create form bound to a board column.

use super::coordinator::{ConfirmedWrite, MutationCoordinator, MutationResult};
use crate::pipeline::{
    domain::{StageKey, TaskDraft, ValidationError},
    ports::{Notifier, RecordGateway},
};
use chrono::{DateTime, Utc};
use mockable::Clock;

/// Local state of the create form.
#[derive(Debug, Clone, PartialEq, Eq)]
struct FormFields {
    title: String,
    description: String,
    stage: StageKey,
    tags: Vec<String>,
    due_date: Option<DateTime<Utc>>,
}

impl FormFields {
    const fn empty(stage: StageKey) -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            stage,
            tags: Vec::new(),
            due_date: None,
        }
    }
}

/// Form that creates one task per submission.
pub struct CreateTaskForm<G, N, C>
where
    G: RecordGateway + 'static,
    N: Notifier + 'static,
    C: Clock + Send + Sync,
{
    coordinator: MutationCoordinator<G, N, C>,
    default_stage: StageKey,
    fields: FormFields,
}

impl<G, N, C> CreateTaskForm<G, N, C>
where
    G: RecordGateway + 'static,
    N: Notifier + 'static,
    C: Clock + Send + Sync,
{
    /// Opens an empty form targeting `stage`.
    #[must_use]
    pub fn new(coordinator: MutationCoordinator<G, N, C>, stage: StageKey) -> Self {
        Self {
            coordinator,
            fields: FormFields::empty(stage.clone()),
            default_stage: stage,
        }
    }

    /// Returns the stage the form resets to.
    #[must_use]
    pub const fn default_stage(&self) -> &StageKey {
        &self.default_stage
    }

    /// Returns the entered title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.fields.title
    }

    /// Returns the selected stage.
    #[must_use]
    pub const fn stage(&self) -> &StageKey {
        &self.fields.stage
    }

    /// Returns the selected tags.
    #[must_use]
    pub fn tags(&self) -> &[String] {
        &self.fields.tags
    }

    /// Returns whether the form is untouched.
    #[must_use]
    pub fn is_pristine(&self) -> bool {
        self.fields == FormFields::empty(self.default_stage.clone())
    }

    /// Sets the title.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.fields.title = title.into();
    }

    /// Sets the description.
    pub fn set_description(&mut self, description: impl Into<String>) {
        self.fields.description = description.into();
    }

    /// Selects the target stage.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::UnknownStage`] for unregistered stages.
    pub fn set_stage(&mut self, stage: StageKey) -> Result<(), ValidationError> {
        if !self.coordinator.registry().is_registered(stage.as_str()) {
            return Err(ValidationError::UnknownStage(stage));
        }
        self.fields.stage = stage;
        Ok(())
    }

    /// Sets or clears the due date.
    pub const fn set_due_date(&mut self, due_date: Option<DateTime<Utc>>) {
        self.fields.due_date = due_date;
    }

    /// Selects a tag. Returns `Ok(false)` when already selected.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyTag`] for blank tags.
    pub fn add_tag(&mut self, tag: &str) -> Result<bool, ValidationError> {
        let trimmed = tag.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyTag);
        }
        if self.fields.tags.iter().any(|existing| existing == trimmed) {
            return Ok(false);
        }
        self.fields.tags.push(trimmed.to_owned());
        Ok(true)
    }

    /// Deselects a tag, returning whether it was selected.
    pub fn remove_tag(&mut self, tag: &str) -> bool {
        let before = self.fields.tags.len();
        self.fields.tags.retain(|existing| existing != tag);
        self.fields.tags.len() != before
    }

    /// Returns the selected stage's vocabulary minus selected tags.
    #[must_use]
    pub fn tag_suggestions(&self) -> Vec<&'static str> {
        self.coordinator
            .registry()
            .tag_vocabulary(self.fields.stage.as_str())
            .iter()
            .copied()
            .filter(|tag| !self.fields.tags.iter().any(|existing| existing == tag))
            .collect()
    }

    /// Builds the creation payload from the current fields.
    #[must_use]
    pub fn draft(&self) -> TaskDraft {
        let mut draft = TaskDraft::new(self.fields.title.clone(), self.fields.stage.clone())
            .with_description(self.fields.description.clone())
            .with_tags(self.fields.tags.iter().cloned());
        if let Some(due_date) = self.fields.due_date {
            draft = draft.with_due_date(due_date);
        }
        draft
    }

    /// Creates the task and resets the form.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingTitle`] before any gateway call
    /// when the title is blank, and the remote error when creation fails.
    /// The fields are kept on error.
    pub async fn submit(&mut self) -> MutationResult<ConfirmedWrite> {
        let confirmed = self.coordinator.create_task(&self.draft()).await?;
        self.reset();
        Ok(confirmed)
    }

    /// Closes the form without side effects.
    pub fn close(&mut self) {
        self.reset();
    }

    fn reset(&mut self) {
        self.fields = FormFields::empty(self.default_stage.clone());
    }
}
