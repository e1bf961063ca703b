//! Notifier that keeps every notification in memory.

use std::sync::{Arc, RwLock};

use crate::pipeline::ports::{Notification, Notifier};

/// Thread-safe notifier recording notifications in arrival order.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    notifications: Arc<RwLock<Vec<Notification>>>,
}

impl RecordingNotifier {
    /// Creates an empty notifier.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of every notification received so far.
    #[must_use]
    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications
            .read()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    /// Returns only error notifications.
    #[must_use]
    pub fn errors(&self) -> Vec<Notification> {
        self.notifications()
            .into_iter()
            .filter(Notification::is_error)
            .collect()
    }

    /// Drops every recorded notification.
    pub fn clear(&self) {
        if let Ok(mut guard) = self.notifications.write() {
            guard.clear();
        }
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        if let Ok(mut guard) = self.notifications.write() {
            guard.push(notification);
        }
    }
}
