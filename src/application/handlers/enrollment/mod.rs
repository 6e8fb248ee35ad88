//! Enrollment handlers.
//!
//! ## Commands
//! - Applying verified payment webhooks to enrollments

mod apply_payment_webhook;

pub use apply_payment_webhook::{
    ApplyPaymentWebhookCommand, ApplyPaymentWebhookHandler, ApplyPaymentWebhookResult,
};
