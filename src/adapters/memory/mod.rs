//! In-memory adapters for tests and running without a database.

mod enrollment_repository;
mod webhook_event_log;

pub use enrollment_repository::InMemoryEnrollmentRepository;
pub use webhook_event_log::InMemoryWebhookEventLog;
