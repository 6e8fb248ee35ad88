//! PostgreSQL adapters - Database implementations for repository ports.
//!
//! - `PostgresEnrollmentRepository` - Enrollments with conditional status transitions
//! - `PostgresWebhookEventLog` - Append-only webhook delivery log

mod enrollment_repository;
mod webhook_event_log;

pub use enrollment_repository::PostgresEnrollmentRepository;
pub use webhook_event_log::PostgresWebhookEventLog;
