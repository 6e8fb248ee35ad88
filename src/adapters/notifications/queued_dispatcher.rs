//! Bounded-queue NotificationDispatcher.
//!
//! `dispatch` never blocks: it either enqueues or fails immediately. The
//! matching receiver is drained by [`NotificationWorker`](super::NotificationWorker).

use tokio::sync::mpsc::{self, error::TrySendError};

use crate::ports::{Notification, NotificationDispatcher, NotificationError};

/// Dispatcher that pushes notifications onto a bounded tokio channel.
#[derive(Clone)]
pub struct QueuedNotificationDispatcher {
    queue: mpsc::Sender<Notification>,
}

impl QueuedNotificationDispatcher {
    /// Creates a dispatcher and the receiver its worker should drain.
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<Notification>) {
        let (queue, receiver) = mpsc::channel(capacity.max(1));
        (Self { queue }, receiver)
    }
}

impl NotificationDispatcher for QueuedNotificationDispatcher {
    fn dispatch(&self, notification: Notification) -> Result<(), NotificationError> {
        self.queue.try_send(notification).map_err(|e| match e {
            TrySendError::Full(_) => NotificationError::QueueFull,
            TrySendError::Closed(_) => NotificationError::QueueClosed,
        })
    }
}
