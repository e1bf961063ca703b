//! Notifier that writes notifications to the tracing log.

use crate::pipeline::ports::{Notification, NotificationLevel, Notifier};

/// Notifier emitting one `tracing` event per notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        let description = notification.description.as_deref().unwrap_or_default();
        match notification.level {
            NotificationLevel::Success => tracing::info!(
                action = %notification.action,
                description,
                "{}",
                notification.message
            ),
            NotificationLevel::Error => tracing::warn!(
                action = %notification.action,
                description,
                "{}",
                notification.message
            ),
        }
    }
}
