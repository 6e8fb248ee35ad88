//! Application handlers.
//!
//! Command handlers that orchestrate domain operations.

pub mod enrollment;

pub use enrollment::{
    ApplyPaymentWebhookCommand, ApplyPaymentWebhookHandler, ApplyPaymentWebhookResult,
};
