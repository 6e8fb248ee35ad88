//! NotificationWorker - Background task that delivers queued notifications.
//!
//! Send failures are logged and the notification is dropped; delivery is
//! best effort and never affects enrollment state.
//!
//! ## Graceful Shutdown
//!
//! On shutdown the worker delivers whatever is already queued, then stops.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};

use crate::ports::{Notification, NotificationSender};

/// Drains the notification queue into a [`NotificationSender`].
pub struct NotificationWorker {
    receiver: mpsc::Receiver<Notification>,
    sender: Arc<dyn NotificationSender>,
}

impl NotificationWorker {
    pub fn new(receiver: mpsc::Receiver<Notification>, sender: Arc<dyn NotificationSender>) -> Self {
        Self { receiver, sender }
    }

    /// Run until the shutdown signal fires or every dispatcher is dropped.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    // A dropped sender counts as shutdown
                    if changed.is_err() || *shutdown.borrow() {
                        let drained = self.process_pending().await;
                        tracing::info!(drained, "Notification worker stopped");
                        return;
                    }
                }

                next = self.receiver.recv() => {
                    match next {
                        Some(notification) => self.deliver(&notification).await,
                        None => {
                            tracing::info!("Notification queue closed, worker stopping");
                            return;
                        }
                    }
                }
            }
        }
    }

    /// Deliver everything currently queued without waiting for more.
    ///
    /// Returns the number of notifications taken off the queue.
    pub async fn process_pending(&mut self) -> usize {
        let mut count = 0;
        while let Ok(notification) = self.receiver.try_recv() {
            self.deliver(&notification).await;
            count += 1;
        }
        count
    }

    async fn deliver(&self, notification: &Notification) {
        if let Err(e) = self.sender.send(notification).await {
            tracing::warn!(
                recipient = %notification.recipient,
                template = ?notification.template,
                error = %e,
                "Failed to send notification"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::notifications::QueuedNotificationDispatcher;
    use crate::ports::{NotificationDispatcher, NotificationError, NotificationTemplate};
    use async_trait::async_trait;
    use serde_json::json;
    use tokio::sync::RwLock;

    #[derive(Default)]
    struct RecordingSender {
        sent: RwLock<Vec<String>>,
        fail_for: Option<String>,
    }

    #[async_trait]
    impl NotificationSender for RecordingSender {
        async fn send(&self, notification: &Notification) -> Result<(), NotificationError> {
            if self.fail_for.as_deref() == Some(notification.recipient.as_str()) {
                return Err(NotificationError::Delivery("mailbox unavailable".to_string()));
            }
            self.sent.write().await.push(notification.recipient.clone());
            Ok(())
        }
    }

    fn notification(to: &str) -> Notification {
        Notification {
            recipient: to.to_string(),
            template: NotificationTemplate::EnrollmentConfirmed,
            data: json!({}),
        }
    }

    #[tokio::test]
    async fn process_pending_delivers_queued_notifications() {
        let (dispatcher, receiver) = QueuedNotificationDispatcher::new(8);
        let sender = Arc::new(RecordingSender::default());
        let mut worker = NotificationWorker::new(receiver, sender.clone());

        dispatcher.dispatch(notification("a@example.com")).unwrap();
        dispatcher.dispatch(notification("b@example.com")).unwrap();

        let count = worker.process_pending().await;

        assert_eq!(count, 2);
        assert_eq!(*sender.sent.read().await, vec!["a@example.com", "b@example.com"]);
    }

    #[tokio::test]
    async fn send_failure_is_dropped_and_worker_continues() {
        let (dispatcher, receiver) = QueuedNotificationDispatcher::new(8);
        let sender = Arc::new(RecordingSender {
            fail_for: Some("bad@example.com".to_string()),
            ..Default::default()
        });
        let mut worker = NotificationWorker::new(receiver, sender.clone());

        dispatcher.dispatch(notification("bad@example.com")).unwrap();
        dispatcher.dispatch(notification("good@example.com")).unwrap();

        assert_eq!(worker.process_pending().await, 2);
        assert_eq!(*sender.sent.read().await, vec!["good@example.com"]);
    }

    #[tokio::test]
    async fn shutdown_drains_queue_then_stops() {
        let (dispatcher, receiver) = QueuedNotificationDispatcher::new(8);
        let sender = Arc::new(RecordingSender::default());
        let worker = NotificationWorker::new(receiver, sender.clone());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        dispatcher.dispatch(notification("a@example.com")).unwrap();
        dispatcher.dispatch(notification("b@example.com")).unwrap();
        shutdown_tx.send(true).unwrap();

        worker.run(shutdown_rx).await;

        assert_eq!(sender.sent.read().await.len(), 2);
    }

    #[tokio::test]
    async fn stops_when_all_dispatchers_dropped() {
        let (dispatcher, receiver) = QueuedNotificationDispatcher::new(8);
        let sender = Arc::new(RecordingSender::default());
        let worker = NotificationWorker::new(receiver, sender.clone());
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);

        dispatcher.dispatch(notification("a@example.com")).unwrap();
        drop(dispatcher);

        worker.run(shutdown_rx).await;

        assert_eq!(*sender.sent.read().await, vec!["a@example.com"]);
    }
}
