//! Domain model for the sales pipeline.
//!
//! The domain holds the stage registry, the task entity with its checklist
//! and tags, and the wire-format rules for store records. It performs no I/O.

mod error;
mod ids;
mod stage;
mod task;
pub mod wire;

pub use error::{ParsePriorityError, RecordCodecError, ValidationError};
pub use ids::{ChecklistItemId, ResourceName, TaskId};
pub use stage::{DEFAULT_TAG_COLOR, StageDefinition, StageKey, StageRegistry};
pub use task::{ChecklistItem, Priority, Task, TaskDraft};
