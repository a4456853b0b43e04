//! User-facing notifications ("toasts")
//!
//! Stores report every outcome through a [`Notifier`]. Delete confirmations
//! carry an [`UndoHandle`] that restores the removed entity when invoked.

use futures::future::{BoxFuture, FutureExt};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{info, warn};

/// How long a notification with an undo action stays actionable
pub const UNDO_WINDOW: Duration = Duration::from_secs(5);

/// Message emitted when an undo restores a deleted entity
pub const DELETE_CANCELLED: &str = "Delete cancelled";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationLevel {
    Success,
    Error,
    Info,
}

impl fmt::Display for NotificationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationLevel::Success => write!(f, "success"),
            NotificationLevel::Error => write!(f, "error"),
            NotificationLevel::Info => write!(f, "info"),
        }
    }
}

/// Inline action attached to a notification
#[derive(Clone)]
pub struct UndoHandle {
    action: Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>,
}

impl UndoHandle {
    pub fn new<F, Fut>(action: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self {
            action: Arc::new(move || action().boxed()),
        }
    }

    /// Run the action. Safe to call more than once.
    pub async fn invoke(&self) {
        (self.action)().await
    }
}

impl fmt::Debug for UndoHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("UndoHandle")
    }
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
    pub undo: Option<UndoHandle>,
    /// `None` leaves the display time to the sink
    pub duration: Option<Duration>,
}

impl Notification {
    pub fn new(level: NotificationLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            undo: None,
            duration: None,
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Success, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Error, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Info, message)
    }

    /// Attach an undo action, keeping the notification up for [`UNDO_WINDOW`]
    pub fn with_undo(mut self, undo: UndoHandle) -> Self {
        self.undo = Some(undo);
        self.duration = Some(UNDO_WINDOW);
        self
    }

    pub fn is_error(&self) -> bool {
        self.level == NotificationLevel::Error
    }
}

/// Sink for notifications
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Fans notifications out to every subscribed view
#[derive(Clone)]
pub struct BroadcastNotifier {
    tx: broadcast::Sender<Notification>,
}

impl BroadcastNotifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.tx.subscribe()
    }
}

impl Default for BroadcastNotifier {
    fn default() -> Self {
        Self::new(64)
    }
}

impl Notifier for BroadcastNotifier {
    fn notify(&self, notification: Notification) {
        // No subscribers is fine
        let _ = self.tx.send(notification);
    }
}

/// Writes notifications to the tracing log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: Notification) {
        match notification.level {
            NotificationLevel::Error => warn!("{}", notification.message),
            _ => info!("{}", notification.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_undo_handle_runs_each_time() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let undo = UndoHandle::new(move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });

        undo.invoke().await;
        undo.clone().invoke().await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_undo_notification_duration() {
        let plain = Notification::success("Item deleted");
        assert!(plain.duration.is_none());

        let with_undo = plain.with_undo(UndoHandle::new(|| async {}));
        assert_eq!(with_undo.duration, Some(UNDO_WINDOW));
        assert!(with_undo.undo.is_some());
    }

    #[test]
    fn test_broadcast_without_subscribers() {
        let notifier = BroadcastNotifier::default();
        notifier.notify(Notification::info("nobody listening"));

        let mut rx = notifier.subscribe();
        notifier.notify(Notification::error("Failed to load items"));
        let received = rx.try_recv().unwrap();
        assert!(received.is_error());
        assert_eq!(received.message, "Failed to load items");
    }
}
