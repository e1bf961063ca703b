//! Application services for the pipeline.
//!
//! The mutation coordinator performs every write; the detail session and
//! the create form are the editing surfaces built on top of it.

mod coordinator;
mod create;
mod detail;

pub use coordinator::{
    ConfirmedWrite, ConsistencyMode, MutationCoordinator, MutationError, MutationResult,
    PendingWrite, WriteLane, WriteOutcome,
};
pub use create::CreateTaskForm;
pub use detail::TaskDetailSession;
