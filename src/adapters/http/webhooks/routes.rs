//! Axum router configuration for webhook endpoints.

use axum::{routing::post, Router};

use super::handlers::{handle_payment_webhook, WebhookAppState};

/// Create the webhook router, mounted at `/api/webhooks`.
///
/// # Routes
/// - `POST /payment` - Payment gateway webhook (no auth, signature verified)
pub fn webhook_routes() -> Router<WebhookAppState> {
    Router::new().route("/payment", post(handle_payment_webhook))
}
