//! Enrollment domain module.
//!
//! Handles course enrollment payment status and the payment webhook rules that
//! drive it.
//!
//! # Module Structure
//!
//! - `aggregate` - Enrollment aggregate entity
//! - `amount` - Two-decimal payment amount
//! - `status` - EnrollmentStatus state machine
//! - `webhook_event` - Raw and validated payment webhook events
//! - `webhook_verifier` - HMAC-SHA256 signature verification
//! - `idempotency` - Decision table for repeated and out-of-order events
//! - `webhook_errors` - Rejections and their HTTP mapping

mod aggregate;
mod amount;
mod idempotency;
mod status;
mod webhook_errors;
mod webhook_event;
mod webhook_verifier;

pub use aggregate::Enrollment;
pub use amount::Amount;
pub use idempotency::{AckReason, GuardDecision, IdempotencyGuard};
pub use status::EnrollmentStatus;
pub use webhook_errors::WebhookError;
pub use webhook_event::{PaymentStatus, PaymentWebhookEvent, RawWebhookPayload};
pub use webhook_verifier::WebhookSignatureVerifier;
