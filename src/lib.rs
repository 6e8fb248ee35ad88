//! E-Shikshan Payments - Webhook-verified enrollment activation
//!
//! Receives payment gateway webhooks, verifies their HMAC-SHA256 signature,
//! moves course enrollments out of `pending` exactly once, and queues a
//! confirmation email after activation.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
