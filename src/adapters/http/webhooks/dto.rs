//! HTTP DTOs for the payment webhook endpoint.

use serde::Serialize;

use crate::application::ApplyPaymentWebhookResult;

/// Body returned for an accepted webhook.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookAcceptedResponse {
    pub success: bool,
    /// `activated`, `failed`, `acknowledged` or `replayed`.
    pub outcome: &'static str,
    pub enrollment_id: String,
}

impl From<&ApplyPaymentWebhookResult> for WebhookAcceptedResponse {
    fn from(result: &ApplyPaymentWebhookResult) -> Self {
        let enrollment_id = match result {
            ApplyPaymentWebhookResult::Activated { enrollment_id, .. }
            | ApplyPaymentWebhookResult::MarkedFailed { enrollment_id, .. }
            | ApplyPaymentWebhookResult::Acknowledged { enrollment_id, .. } => enrollment_id,
        };
        Self {
            success: true,
            outcome: result.outcome().as_str(),
            enrollment_id: enrollment_id.to_string(),
        }
    }
}

/// Standard error response body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub success: bool,
    /// Error code for programmatic handling.
    pub error_code: String,
    /// Human-readable error message.
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error_code: error_code.into(),
            message: message.into(),
        }
    }
}
