//! Pointer gesture tracking for cards.
//!
//! One pointer-down produces exactly one outcome: a click when the pointer
//! is released within the activation distance, or a drop otherwise. The
//! tracker knows nothing about tasks beyond their ids; resolving a drop into
//! a stage change is the board engine's job.

use super::geometry::{DropZone, Point, Rect, closest_center};
use crate::pipeline::domain::{StageKey, TaskId};
use thiserror::Error;

/// Default pointer travel, in pixels, before a press becomes a drag.
pub const DEFAULT_ACTIVATION_DISTANCE: f64 = 8.0;

/// Errors raised by pointer input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GestureError {
    /// A gesture is already active.
    #[error("a gesture for task {active} is already in progress")]
    GestureInProgress {
        /// Task of the active gesture.
        active: TaskId,
    },
}

/// Final outcome of one gesture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GestureOutcome {
    /// Released before the activation distance.
    Click(TaskId),
    /// Released after dragging.
    Drop {
        /// Dragged task.
        task: TaskId,
        /// Zone under the card at release, if any zone exists.
        target: Option<StageKey>,
    },
}

#[derive(Debug, Clone, PartialEq)]
enum DragState {
    Idle,
    Pressed {
        task: TaskId,
        card: Rect,
        origin: Point,
    },
    Dragging {
        task: TaskId,
        card: Rect,
        origin: Point,
        hovered: Option<StageKey>,
    },
}

/// Tracks the single active pointer gesture.
#[derive(Debug, Clone, PartialEq)]
pub struct DragTracker {
    activation_distance: f64,
    state: DragState,
}

impl Default for DragTracker {
    fn default() -> Self {
        Self::new(DEFAULT_ACTIVATION_DISTANCE)
    }
}

impl DragTracker {
    /// Creates an idle tracker. Negative distances are treated as zero.
    #[must_use]
    pub const fn new(activation_distance: f64) -> Self {
        Self {
            activation_distance: activation_distance.max(0.0),
            state: DragState::Idle,
        }
    }

    /// Returns the activation distance.
    #[must_use]
    pub const fn activation_distance(&self) -> f64 {
        self.activation_distance
    }

    /// Returns the task of the active gesture.
    #[must_use]
    pub const fn active_task(&self) -> Option<TaskId> {
        match &self.state {
            DragState::Idle => None,
            DragState::Pressed { task, .. } | DragState::Dragging { task, .. } => Some(*task),
        }
    }

    /// Returns whether a drag is under way.
    #[must_use]
    pub const fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    /// Returns the zone currently under the dragged card.
    #[must_use]
    pub const fn hovered(&self) -> Option<&StageKey> {
        match &self.state {
            DragState::Dragging { hovered, .. } => hovered.as_ref(),
            DragState::Idle | DragState::Pressed { .. } => None,
        }
    }

    /// Arms a gesture on the card of `task` occupying `card`.
    ///
    /// # Errors
    ///
    /// Returns [`GestureError::GestureInProgress`] while another gesture is
    /// active.
    pub fn pointer_down(&mut self, task: TaskId, card: Rect, at: Point) -> Result<(), GestureError> {
        if let Some(active) = self.active_task() {
            return Err(GestureError::GestureInProgress { active });
        }
        self.state = DragState::Pressed {
            task,
            card,
            origin: at,
        };
        Ok(())
    }

    /// Feeds pointer movement and returns the hovered zone.
    ///
    /// Movement without an active gesture is ignored.
    pub fn pointer_move(&mut self, at: Point, zones: &[DropZone]) -> Option<&StageKey> {
        match &mut self.state {
            DragState::Idle => {}
            DragState::Pressed { task, card, origin } => {
                if at.distance_to(*origin) > self.activation_distance {
                    let dragged = card.translated(at.delta_from(*origin));
                    tracing::debug!(task_id = %task, "drag started");
                    self.state = DragState::Dragging {
                        task: *task,
                        card: *card,
                        origin: *origin,
                        hovered: closest_center(&dragged, zones).map(|zone| zone.stage.clone()),
                    };
                }
            }
            DragState::Dragging {
                card,
                origin,
                hovered,
                ..
            } => {
                let dragged = card.translated(at.delta_from(*origin));
                *hovered = closest_center(&dragged, zones).map(|zone| zone.stage.clone());
            }
        }
        self.hovered()
    }

    /// Ends the gesture at `at`.
    ///
    /// Returns `None` when no gesture was active.
    pub fn pointer_up(&mut self, at: Point, zones: &[DropZone]) -> Option<GestureOutcome> {
        match std::mem::replace(&mut self.state, DragState::Idle) {
            DragState::Idle => None,
            DragState::Pressed { task, card, origin } => {
                if at.distance_to(origin) > self.activation_distance {
                    Some(Self::resolve_drop(task, card, origin, at, zones))
                } else {
                    Some(GestureOutcome::Click(task))
                }
            }
            DragState::Dragging {
                task, card, origin, ..
            } => Some(Self::resolve_drop(task, card, origin, at, zones)),
        }
    }

    /// Aborts the active gesture without an outcome.
    ///
    /// Returns whether a gesture was active.
    pub fn cancel(&mut self) -> bool {
        let active = self.active_task();
        self.state = DragState::Idle;
        if let Some(task_id) = active {
            tracing::debug!(%task_id, "gesture cancelled");
        }
        active.is_some()
    }

    fn resolve_drop(
        task: TaskId,
        card: Rect,
        origin: Point,
        at: Point,
        zones: &[DropZone],
    ) -> GestureOutcome {
        let dragged = card.translated(at.delta_from(origin));
        GestureOutcome::Drop {
            task,
            target: closest_center(&dragged, zones).map(|zone| zone.stage.clone()),
        }
    }
}
