//! Notification port for user-visible mutation outcomes.

use std::fmt;

/// Severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationLevel {
    /// The action succeeded.
    Success,
    /// The action failed; the board stays interactive.
    Error,
}

/// Action a notification reports on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationAction {
    /// Stage change from the board.
    Move,
    /// Task creation.
    Create,
    /// Full-record save from the detail surface.
    Update,
    /// Soft delete.
    Delete,
    /// Tag write-through.
    Tags,
    /// Board re-list.
    Refresh,
}

impl MutationAction {
    /// Returns a short action name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Move => "move",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Tags => "tags",
            Self::Refresh => "refresh",
        }
    }
}

impl fmt::Display for MutationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transient, non-blocking message for the UI layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Severity.
    pub level: NotificationLevel,
    /// Action the message is about.
    pub action: MutationAction,
    /// Headline.
    pub message: String,
    /// Optional detail line.
    pub description: Option<String>,
}

impl Notification {
    /// Creates a success notification.
    #[must_use]
    pub fn success(action: MutationAction, message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            action,
            message: message.into(),
            description: None,
        }
    }

    /// Creates an error notification.
    #[must_use]
    pub fn error(action: MutationAction, message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            action,
            message: message.into(),
            description: None,
        }
    }

    /// Adds a detail line.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Returns whether this notification reports a failure.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.level == NotificationLevel::Error
    }
}

/// Sink for notifications.
///
/// Called from the caller's task for confirmed writes and from the spawned
/// write task for optimistic ones, so implementations must be thread-safe.
pub trait Notifier: Send + Sync {
    /// Surfaces a notification.
    fn notify(&self, notification: Notification);
}
