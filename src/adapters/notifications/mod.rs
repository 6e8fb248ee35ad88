//! Notification adapters.
//!
//! - `QueuedNotificationDispatcher` - Bounded in-process queue
//! - `NotificationWorker` - Background task draining the queue
//! - `ResendEmailSender` - Email via the Resend API
//! - `LogNotificationSender` - Logs instead of sending

mod log_sender;
mod queued_dispatcher;
mod resend;
mod worker;

pub use log_sender::LogNotificationSender;
pub use queued_dispatcher::QueuedNotificationDispatcher;
pub use resend::{ResendConfig, ResendEmailSender};
pub use worker::NotificationWorker;
