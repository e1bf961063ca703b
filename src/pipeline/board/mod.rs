//! Board engine: columns, drop zones, and the drag protocol.

mod columns;
mod drag;
mod engine;
mod geometry;

pub use columns::{BoardView, CardView, ColumnView, TagView, partition};
pub use drag::{DEFAULT_ACTIVATION_DISTANCE, DragTracker, GestureError, GestureOutcome};
pub use engine::{BoardSettings, IgnoredMove, MoveOutcome, PipelineBoard, ReleaseOutcome};
pub use geometry::{DropZone, Point, Rect, closest_center};
