//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `http` - Axum router and webhook endpoint
//! - `postgres` - PostgreSQL repositories
//! - `memory` - In-memory repositories for tests and local runs
//! - `notifications` - Notification queue, worker and email senders

pub mod http;
pub mod memory;
pub mod notifications;
pub mod postgres;

pub use memory::{InMemoryEnrollmentRepository, InMemoryWebhookEventLog};
pub use notifications::{
    LogNotificationSender, NotificationWorker, QueuedNotificationDispatcher, ResendConfig,
    ResendEmailSender,
};
pub use postgres::{PostgresEnrollmentRepository, PostgresWebhookEventLog};
