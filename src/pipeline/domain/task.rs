//! Pipeline task entity and its sub-entities.

use super::{
    ChecklistItemId, ParsePriorityError, RecordCodecError, StageKey, StageRegistry, TaskId,
    ValidationError,
    wire::{null_as_default, optional_datetime},
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Task priority.
///
/// Decoding goes through [`Priority::try_from`], so it ignores case and
/// accepts the English names as well.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum Priority {
    /// Urgent opportunity.
    #[serde(rename = "alta")]
    High,
    /// Default priority for new tasks.
    #[default]
    #[serde(rename = "media")]
    Medium,
    /// Low urgency.
    #[serde(rename = "baja")]
    Low,
}

impl Priority {
    /// Returns the wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::High => "alta",
            Self::Medium => "media",
            Self::Low => "baja",
        }
    }
}

impl TryFrom<&str> for Priority {
    type Error = ParsePriorityError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_lowercase();
        match normalized.as_str() {
            "alta" | "high" => Ok(Self::High),
            "media" | "medium" => Ok(Self::Medium),
            "baja" | "low" => Ok(Self::Low),
            _ => Err(ParsePriorityError(value.to_owned())),
        }
    }
}

impl TryFrom<String> for Priority {
    type Error = ParsePriorityError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_from(value.as_str())
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Boolean-completion entry attached to a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItem {
    id: ChecklistItemId,
    #[serde(rename = "texto", default, deserialize_with = "null_as_default")]
    text: String,
    #[serde(rename = "completado", default, deserialize_with = "null_as_default")]
    done: bool,
}

impl ChecklistItem {
    /// Creates an open checklist item.
    #[must_use]
    pub fn new(id: ChecklistItemId, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
            done: false,
        }
    }

    /// Returns the item identifier.
    #[must_use]
    pub const fn id(&self) -> ChecklistItemId {
        self.id
    }

    /// Returns the item text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns whether the item is done.
    #[must_use]
    pub const fn is_done(&self) -> bool {
        self.done
    }
}

/// Stage-bound pipeline task as stored in the record store.
///
/// Fields the model does not know about are kept verbatim and written back
/// on update, so a full-document write never drops data owned by another
/// screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    #[serde(rename = "titulo", default, deserialize_with = "null_as_default")]
    title: String,
    #[serde(rename = "descripcion", default, deserialize_with = "null_as_default")]
    description: String,
    #[serde(rename = "etapa")]
    stage: StageKey,
    #[serde(rename = "etiquetas", default, deserialize_with = "null_as_default")]
    tags: Vec<String>,
    #[serde(rename = "fecha_vencimiento", default, with = "optional_datetime")]
    due_date: Option<DateTime<Utc>>,
    #[serde(rename = "fecha_creacion", default, with = "optional_datetime")]
    created_date: Option<DateTime<Utc>>,
    #[serde(rename = "prioridad", default, deserialize_with = "null_as_default")]
    priority: Priority,
    #[serde(default, deserialize_with = "null_as_default")]
    checklist: Vec<ChecklistItem>,
    #[serde(default, deserialize_with = "null_as_default")]
    deleted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    company_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    contact_id: Option<u64>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl Task {
    /// Creates a task with default optional fields.
    ///
    /// Mostly useful for tests and in-memory fixtures; real tasks come from
    /// [`Task::from_record`].
    #[must_use]
    pub fn new(id: TaskId, title: impl Into<String>, stage: impl Into<StageKey>) -> Self {
        Self {
            id,
            title: title.into(),
            description: String::new(),
            stage: stage.into(),
            tags: Vec::new(),
            due_date: None,
            created_date: None,
            priority: Priority::Medium,
            checklist: Vec::new(),
            deleted: false,
            company_id: None,
            contact_id: None,
            extra: Map::new(),
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the due date.
    #[must_use]
    pub const fn with_due_date(mut self, due_date: DateTime<Utc>) -> Self {
        self.due_date = Some(due_date);
        self
    }

    /// Sets the creation date.
    #[must_use]
    pub const fn with_created_date(mut self, created_date: DateTime<Utc>) -> Self {
        self.created_date = Some(created_date);
        self
    }

    /// Sets the priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Sets the tags, dropping blanks and duplicates.
    #[must_use]
    pub fn with_tags(mut self, tags: impl IntoIterator<Item = String>) -> Self {
        self.set_tags(tags);
        self
    }

    /// Sets the checklist.
    #[must_use]
    pub fn with_checklist(mut self, checklist: impl IntoIterator<Item = ChecklistItem>) -> Self {
        self.checklist = checklist.into_iter().collect();
        self
    }

    /// Decodes a task from a store record.
    ///
    /// # Errors
    ///
    /// Returns [`RecordCodecError::NotAnObject`] for non-object values and
    /// [`RecordCodecError::InvalidShape`] when required fields are missing
    /// or malformed.
    pub fn from_record(record: Value) -> Result<Self, RecordCodecError> {
        if !record.is_object() {
            return Err(RecordCodecError::NotAnObject);
        }
        serde_json::from_value(record).map_err(|err| RecordCodecError::InvalidShape(err.to_string()))
    }

    /// Encodes the full task as a store record.
    ///
    /// # Errors
    ///
    /// Returns [`RecordCodecError::Encode`] when serialisation fails.
    pub fn to_record(&self) -> Result<Value, RecordCodecError> {
        serde_json::to_value(self).map_err(|err| RecordCodecError::Encode(err.to_string()))
    }

    /// Returns the store identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the stage key, which may be unregistered.
    #[must_use]
    pub const fn stage(&self) -> &StageKey {
        &self.stage
    }

    /// Returns the tags in insertion order.
    #[must_use]
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Returns the due date, if any.
    #[must_use]
    pub const fn due_date(&self) -> Option<DateTime<Utc>> {
        self.due_date
    }

    /// Returns the creation date, if any.
    #[must_use]
    pub const fn created_date(&self) -> Option<DateTime<Utc>> {
        self.created_date
    }

    /// Returns the priority.
    #[must_use]
    pub const fn priority(&self) -> Priority {
        self.priority
    }

    /// Returns the checklist.
    #[must_use]
    pub fn checklist(&self) -> &[ChecklistItem] {
        &self.checklist
    }

    /// Returns whether the task carries the soft-delete marker.
    #[must_use]
    pub const fn is_deleted(&self) -> bool {
        self.deleted
    }

    /// Returns the referenced company, if any.
    #[must_use]
    pub const fn company_id(&self) -> Option<u64> {
        self.company_id
    }

    /// Returns the referenced contact, if any.
    #[must_use]
    pub const fn contact_id(&self) -> Option<u64> {
        self.contact_id
    }

    /// Returns whether the task is overdue at `now`.
    ///
    /// A task is overdue when it has a due date strictly before `now` and it
    /// is not in the completed stage. Evaluate on every render; the result
    /// changes as time moves on.
    #[must_use]
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.due_date.is_some_and(|due| due < now) && !self.stage.is_completed()
    }

    /// Returns `(done, total)` checklist counts.
    #[must_use]
    pub fn checklist_progress(&self) -> (usize, usize) {
        let done = self.checklist.iter().filter(|item| item.done).count();
        (done, self.checklist.len())
    }

    /// Replaces the title.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    /// Replaces the description.
    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    /// Moves the task to another stage.
    pub fn set_stage(&mut self, stage: StageKey) {
        self.stage = stage;
    }

    /// Sets or clears the due date.
    pub const fn set_due_date(&mut self, due_date: Option<DateTime<Utc>>) {
        self.due_date = due_date;
    }

    /// Replaces the priority.
    pub const fn set_priority(&mut self, priority: Priority) {
        self.priority = priority;
    }

    /// Sets the soft-delete marker.
    pub const fn mark_deleted(&mut self) {
        self.deleted = true;
    }

    /// Replaces the tags, trimming values and dropping blanks and duplicates.
    pub fn set_tags(&mut self, tags: impl IntoIterator<Item = String>) {
        self.tags = normalize_tags(tags);
    }

    /// Returns whether `tag` is attached.
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|existing| existing == tag)
    }

    /// Attaches a tag.
    ///
    /// Returns `Ok(false)` when the tag is already attached.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyTag`] when the tag is blank.
    pub fn add_tag(&mut self, tag: &str) -> Result<bool, ValidationError> {
        let trimmed = tag.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyTag);
        }
        if self.has_tag(trimmed) {
            return Ok(false);
        }
        self.tags.push(trimmed.to_owned());
        Ok(true)
    }

    /// Detaches a tag, returning whether it was attached.
    pub fn remove_tag(&mut self, tag: &str) -> bool {
        let before = self.tags.len();
        self.tags.retain(|existing| existing != tag);
        self.tags.len() != before
    }

    /// Flips the `done` flag of a checklist item and returns the new value.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::ChecklistItemNotFound`] for unknown ids.
    pub fn toggle_checklist_item(&mut self, id: ChecklistItemId) -> Result<bool, ValidationError> {
        let item = self
            .checklist
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or(ValidationError::ChecklistItemNotFound(id))?;
        item.done = !item.done;
        Ok(item.done)
    }

    /// Appends a checklist item whose id is the clock reading in milliseconds.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyChecklistText`] for blank text.
    pub fn add_checklist_item(
        &mut self,
        text: &str,
        clock: &impl Clock,
    ) -> Result<ChecklistItemId, ValidationError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyChecklistText);
        }
        let mut raw_id = clock.utc().timestamp_millis();
        while self.checklist.iter().any(|item| item.id.value() == raw_id) {
            raw_id = raw_id.saturating_add(1);
        }
        let id = ChecklistItemId::new(raw_id);
        self.checklist.push(ChecklistItem::new(id, trimmed));
        Ok(id)
    }

    /// Removes a checklist item.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::ChecklistItemNotFound`] for unknown ids.
    pub fn remove_checklist_item(
        &mut self,
        id: ChecklistItemId,
    ) -> Result<ChecklistItem, ValidationError> {
        let position = self
            .checklist
            .iter()
            .position(|item| item.id == id)
            .ok_or(ValidationError::ChecklistItemNotFound(id))?;
        Ok(self.checklist.remove(position))
    }
}

/// Fields supplied when creating a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    title: String,
    description: String,
    stage: StageKey,
    tags: Vec<String>,
    due_date: Option<DateTime<Utc>>,
    company_id: Option<u64>,
    contact_id: Option<u64>,
}

#[derive(Serialize)]
struct CreateTaskRecord<'a> {
    #[serde(rename = "titulo")]
    title: &'a str,
    #[serde(rename = "descripcion")]
    description: &'a str,
    #[serde(rename = "etapa")]
    stage: &'a StageKey,
    #[serde(rename = "etiquetas")]
    tags: &'a [String],
    #[serde(rename = "fecha_vencimiento", with = "optional_datetime")]
    due_date: Option<DateTime<Utc>>,
    #[serde(rename = "fecha_creacion", with = "optional_datetime")]
    created_date: Option<DateTime<Utc>>,
    #[serde(rename = "prioridad")]
    priority: Priority,
    checklist: &'a [ChecklistItem],
    #[serde(skip_serializing_if = "Option::is_none")]
    company_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    contact_id: Option<u64>,
}

impl TaskDraft {
    /// Creates a draft with the required fields.
    #[must_use]
    pub fn new(title: impl Into<String>, stage: impl Into<StageKey>) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            stage: stage.into(),
            tags: Vec::new(),
            due_date: None,
            company_id: None,
            contact_id: None,
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the tags.
    #[must_use]
    pub fn with_tags(mut self, tags: impl IntoIterator<Item = String>) -> Self {
        self.tags = tags.into_iter().collect();
        self
    }

    /// Sets the due date.
    #[must_use]
    pub const fn with_due_date(mut self, due_date: DateTime<Utc>) -> Self {
        self.due_date = Some(due_date);
        self
    }

    /// Sets the referenced company.
    #[must_use]
    pub const fn with_company_id(mut self, company_id: u64) -> Self {
        self.company_id = Some(company_id);
        self
    }

    /// Sets the referenced contact.
    #[must_use]
    pub const fn with_contact_id(mut self, contact_id: u64) -> Self {
        self.contact_id = Some(contact_id);
        self
    }

    /// Returns the title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the target stage.
    #[must_use]
    pub const fn stage(&self) -> &StageKey {
        &self.stage
    }

    /// Checks the draft against the registry.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingTitle`] for a blank title and
    /// [`ValidationError::UnknownStage`] for a stage outside `registry`.
    pub fn validate(&self, registry: &StageRegistry) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::MissingTitle);
        }
        if !registry.is_registered(self.stage.as_str()) {
            return Err(ValidationError::UnknownStage(self.stage.clone()));
        }
        Ok(())
    }

    /// Encodes the creation payload.
    ///
    /// The payload always carries an empty checklist, the default priority,
    /// and `created_at` as the creation date.
    ///
    /// # Errors
    ///
    /// Returns [`RecordCodecError::Encode`] when serialisation fails.
    pub fn to_record(&self, created_at: DateTime<Utc>) -> Result<Value, RecordCodecError> {
        let tags = normalize_tags(self.tags.iter().cloned());
        let payload = CreateTaskRecord {
            title: self.title.trim(),
            description: &self.description,
            stage: &self.stage,
            tags: &tags,
            due_date: self.due_date,
            created_date: Some(created_at),
            priority: Priority::default(),
            checklist: &[],
            company_id: self.company_id,
            contact_id: self.contact_id,
        };
        serde_json::to_value(payload).map_err(|err| RecordCodecError::Encode(err.to_string()))
    }
}

/// Trims tags and drops blanks and duplicates, keeping first-seen order.
fn normalize_tags(tags: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::new();
    for tag in tags {
        let trimmed = tag.trim();
        if !trimmed.is_empty() && !normalized.iter().any(|existing| existing == trimmed) {
            normalized.push(trimmed.to_owned());
        }
    }
    normalized
}
