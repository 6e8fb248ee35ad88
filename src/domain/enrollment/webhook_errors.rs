//! Webhook error types for payment webhook handling.
//!
//! Defines every rejection the webhook flow can produce, with HTTP status
//! code mapping and retryability semantics. None of these errors leave a
//! partial mutation behind.

use axum::http::StatusCode;
use thiserror::Error;

use crate::domain::foundation::{DomainError, EnrollmentId};

use super::{Amount, EnrollmentStatus, PaymentStatus};

/// Errors that occur during webhook processing.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Signature did not match the canonical payload.
    #[error("Invalid signature")]
    InvalidSignature,

    /// Neither the header nor the body carried a signature.
    #[error("Missing signature")]
    MissingSignature,

    /// Event timestamp is outside the configured freshness window.
    #[error("Timestamp out of range")]
    TimestampOutOfRange,

    /// Body could not be parsed into a well-formed event.
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    /// The `orderId` does not name a known enrollment.
    #[error("Enrollment not found: {0}")]
    EnrollmentNotFound(EnrollmentId),

    /// Event contradicts a terminal enrollment state.
    #[error("Conflicting state for enrollment {enrollment_id}: {received} received while {current} ({reason})")]
    ConflictingState {
        enrollment_id: EnrollmentId,
        current: EnrollmentStatus,
        received: PaymentStatus,
        reason: String,
    },

    /// Gateway reported a different amount than the enrollment's price.
    #[error("Amount mismatch for enrollment {enrollment_id}: expected {expected}, received {received}")]
    AmountMismatch {
        enrollment_id: EnrollmentId,
        expected: Amount,
        received: Amount,
    },

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(String),
}

impl WebhookError {
    /// Returns true if the gateway should retry delivering this webhook.
    ///
    /// Only infrastructure failures qualify; every other rejection is
    /// deterministic and would fail the same way on redelivery.
    pub fn is_retryable(&self) -> bool {
        matches!(self, WebhookError::Database(_))
    }

    /// Returns true for rejections that need a human to look at them.
    pub fn needs_review(&self) -> bool {
        matches!(
            self,
            WebhookError::ConflictingState { .. } | WebhookError::AmountMismatch { .. }
        )
    }

    /// Maps the error to an appropriate HTTP status code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            WebhookError::InvalidSignature
            | WebhookError::MissingSignature
            | WebhookError::TimestampOutOfRange => StatusCode::UNAUTHORIZED,

            WebhookError::MalformedPayload(_) => StatusCode::BAD_REQUEST,

            WebhookError::EnrollmentNotFound(_) => StatusCode::NOT_FOUND,

            WebhookError::ConflictingState { .. } | WebhookError::AmountMismatch { .. } => {
                StatusCode::CONFLICT
            }

            WebhookError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code for API responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            WebhookError::InvalidSignature => "INVALID_SIGNATURE",
            WebhookError::MissingSignature => "MISSING_SIGNATURE",
            WebhookError::TimestampOutOfRange => "TIMESTAMP_OUT_OF_RANGE",
            WebhookError::MalformedPayload(_) => "MALFORMED_PAYLOAD",
            WebhookError::EnrollmentNotFound(_) => "ENROLLMENT_NOT_FOUND",
            WebhookError::ConflictingState { .. } => "CONFLICTING_STATE",
            WebhookError::AmountMismatch { .. } => "AMOUNT_MISMATCH",
            WebhookError::Database(_) => "INTERNAL_ERROR",
        }
    }
}

/// Repository failures surface as retryable database errors.
impl From<DomainError> for WebhookError {
    fn from(err: DomainError) -> Self {
        WebhookError::Database(err.to_string())
    }
}
