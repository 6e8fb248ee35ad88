//! HTTP handlers for payment webhooks.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};

use crate::application::{ApplyPaymentWebhookCommand, ApplyPaymentWebhookHandler};
use crate::domain::enrollment::{WebhookError, WebhookSignatureVerifier};
use crate::ports::{EnrollmentRepository, NotificationDispatcher, WebhookEventLog};

use super::dto::{ErrorResponse, WebhookAcceptedResponse};

/// Header carrying the hex HMAC-SHA256 signature.
pub const SIGNATURE_HEADER: &str = "X-Webhook-Signature";

/// Shared state for webhook endpoints.
#[derive(Clone)]
pub struct WebhookAppState {
    pub enrollment_repository: Arc<dyn EnrollmentRepository>,
    pub webhook_event_log: Arc<dyn WebhookEventLog>,
    pub notification_dispatcher: Arc<dyn NotificationDispatcher>,
    pub verifier: Arc<WebhookSignatureVerifier>,
}

impl WebhookAppState {
    /// Create the handler on demand from the shared state.
    pub fn apply_payment_webhook_handler(&self) -> ApplyPaymentWebhookHandler {
        ApplyPaymentWebhookHandler::new(
            self.enrollment_repository.clone(),
            self.webhook_event_log.clone(),
            self.notification_dispatcher.clone(),
            self.verifier.clone(),
        )
    }
}

/// POST /api/webhooks/payment - Apply a payment gateway webhook
pub async fn handle_payment_webhook(
    State(state): State<WebhookAppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, WebhookApiError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let handler = state.apply_payment_webhook_handler();
    let cmd = ApplyPaymentWebhookCommand {
        payload: body.to_vec(),
        signature,
    };

    let result = handler.handle(cmd).await?;

    Ok((StatusCode::OK, Json(WebhookAcceptedResponse::from(&result))))
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts webhook errors to HTTP responses.
#[derive(Debug)]
pub struct WebhookApiError(pub WebhookError);

impl From<WebhookError> for WebhookApiError {
    fn from(err: WebhookError) -> Self {
        Self(err)
    }
}

impl IntoResponse for WebhookApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.0.status_code();
        // Storage details stay in the logs
        let message = match &self.0 {
            WebhookError::Database(_) => "Internal error, please retry".to_string(),
            other => other.to_string(),
        };
        let body = ErrorResponse::new(self.0.error_code(), message);
        (status, Json(body)).into_response()
    }
}
