//! Column view models: the board's task set partitioned by stage.

use crate::pipeline::domain::{StageKey, StageRegistry, Task, TaskId};
use chrono::{DateTime, Utc};

/// Tag with its legend colour.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagView {
    /// Tag label.
    pub label: String,
    /// Legend colour.
    pub color: &'static str,
}

/// Card shown in a column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardView {
    /// Task identifier.
    pub id: TaskId,
    /// Task title.
    pub title: String,
    /// Whether the task was overdue at render time.
    pub overdue: bool,
    /// Due date, if any.
    pub due_date: Option<DateTime<Utc>>,
    /// Tags in task order.
    pub tags: Vec<TagView>,
    /// Completed checklist items.
    pub checklist_done: usize,
    /// Total checklist items.
    pub checklist_total: usize,
}

impl CardView {
    fn render(task: &Task, registry: &StageRegistry, now: DateTime<Utc>) -> Self {
        let (checklist_done, checklist_total) = task.checklist_progress();
        Self {
            id: task.id(),
            title: task.title().to_owned(),
            overdue: task.is_overdue(now),
            due_date: task.due_date(),
            tags: task
                .tags()
                .iter()
                .map(|tag| TagView {
                    label: tag.clone(),
                    color: registry.tag_color(tag),
                })
                .collect(),
            checklist_done,
            checklist_total,
        }
    }
}

/// One stage column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnView {
    /// Stage key.
    pub stage: StageKey,
    /// Display title.
    pub title: &'static str,
    /// Column colour.
    pub color: &'static str,
    /// Whether a dragged card currently hovers this column.
    pub highlighted: bool,
    /// Cards in board order.
    pub cards: Vec<CardView>,
}

/// Rendered board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardView {
    /// Columns in registry order, one per registered stage.
    pub columns: Vec<ColumnView>,
    /// Tasks whose stage is not registered.
    pub unplaced: Vec<TaskId>,
}

impl BoardView {
    /// Returns the column for `stage`.
    #[must_use]
    pub fn column(&self, stage: &str) -> Option<&ColumnView> {
        self.columns.iter().find(|column| column.stage == stage)
    }

    /// Returns the total number of placed cards.
    #[must_use]
    pub fn card_count(&self) -> usize {
        self.columns.iter().map(|column| column.cards.len()).sum()
    }
}

/// Partitions `tasks` into registry-ordered columns.
///
/// Soft-deleted tasks are left out. Tasks on unregistered stages land in
/// [`BoardView::unplaced`]. The overdue flag is evaluated against `now`.
#[must_use]
pub fn partition(
    tasks: &[Task],
    registry: &StageRegistry,
    now: DateTime<Utc>,
    hovered: Option<&StageKey>,
) -> BoardView {
    let mut columns: Vec<ColumnView> = registry
        .stages()
        .iter()
        .map(|stage| ColumnView {
            stage: StageKey::from(stage),
            title: stage.title(),
            color: stage.color(),
            highlighted: hovered.is_some_and(|key| key == stage.key()),
            cards: Vec::new(),
        })
        .collect();
    let mut unplaced = Vec::new();

    for task in tasks.iter().filter(|task| !task.is_deleted()) {
        match columns
            .iter_mut()
            .find(|column| column.stage == *task.stage())
        {
            Some(column) => column.cards.push(CardView::render(task, registry, now)),
            None => {
                tracing::debug!(task_id = %task.id(), stage = %task.stage(), "task stage is not registered");
                unplaced.push(task.id());
            }
        }
    }

    BoardView { columns, unplaced }
}
