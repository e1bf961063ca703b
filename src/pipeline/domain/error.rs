//! Error types for pipeline domain validation and record conversion.

use super::{ChecklistItemId, StageKey};
use thiserror::Error;

/// Validation failures raised before any write reaches the record store.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// The task title is empty after trimming.
    #[error("task title must not be empty")]
    MissingTitle,

    /// The stage is not part of the stage registry.
    #[error("unknown pipeline stage: {0}")]
    UnknownStage(StageKey),

    /// A tag is empty after trimming.
    #[error("tag must not be empty")]
    EmptyTag,

    /// A checklist item text is empty after trimming.
    #[error("checklist item text must not be empty")]
    EmptyChecklistText,

    /// No checklist item with the identifier exists on the task.
    #[error("checklist item {0} not found")]
    ChecklistItemNotFound(ChecklistItemId),
}

/// Errors returned while converting between tasks and store records.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RecordCodecError {
    /// The record is not a JSON object.
    #[error("task record must be a JSON object")]
    NotAnObject,

    /// The record lacks a required field or holds a field of the wrong shape.
    #[error("invalid task record: {0}")]
    InvalidShape(String),

    /// A value could not be encoded as a store record.
    #[error("failed to encode task record: {0}")]
    Encode(String),
}

/// Error returned while parsing a priority from its wire form.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task priority: {0}")]
pub struct ParsePriorityError(pub String);
