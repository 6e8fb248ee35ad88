//! HTTP adapter for payment gateway webhooks.

mod dto;
mod handlers;
mod routes;

pub use dto::{ErrorResponse, WebhookAcceptedResponse};
pub use handlers::{handle_payment_webhook, WebhookApiError, WebhookAppState, SIGNATURE_HEADER};
pub use routes::webhook_routes;
