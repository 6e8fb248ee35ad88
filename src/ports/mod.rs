//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `EnrollmentRepository` - Enrollment persistence with conditional transitions
//! - `WebhookEventLog` - Append-only log of verified webhook deliveries
//! - `NotificationDispatcher` / `NotificationSender` - Fire-and-forget email

mod enrollment_repository;
mod notification_dispatcher;
mod webhook_event_log;

pub use enrollment_repository::{EnrollmentRepository, StatusTransition, TransitionOutcome};
pub use notification_dispatcher::{
    Notification, NotificationDispatcher, NotificationError, NotificationSender,
    NotificationTemplate,
};
pub use webhook_event_log::{DeliveryOutcome, WebhookEventLog, WebhookEventRecord};
