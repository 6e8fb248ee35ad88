//! Payment webhook signature verification.
//!
//! The gateway signs `transactionId|orderId|amount|status|timestamp` with
//! HMAC-SHA256 using the shared webhook secret and sends the hex digest in the
//! `X-Webhook-Signature` header (or, for older integrations, in the body).

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, Secret};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::domain::foundation::Timestamp;

use super::webhook_event::PaymentWebhookEvent;
use super::webhook_errors::WebhookError;

/// Maximum allowed clock skew for future events (1 minute).
const MAX_CLOCK_SKEW_SECS: i64 = 60;

/// Verifier for payment gateway webhook signatures.
pub struct WebhookSignatureVerifier {
    /// Shared secret configured with the gateway.
    secret: Secret<String>,
    /// Freshness window; `None` accepts events of any age.
    max_age_secs: Option<i64>,
}

impl WebhookSignatureVerifier {
    /// Creates a verifier without a freshness window.
    pub fn new(secret: Secret<String>) -> Self {
        Self {
            secret,
            max_age_secs: None,
        }
    }

    /// Rejects events older than `max_age_secs` when set.
    pub fn with_max_age(mut self, max_age_secs: Option<i64>) -> Self {
        self.max_age_secs = max_age_secs;
        self
    }

    /// Verifies the signature of a parsed event.
    ///
    /// The header signature takes precedence over the one carried in the body.
    ///
    /// # Errors
    ///
    /// - `MissingSignature` - neither source carried a signature
    /// - `TimestampOutOfRange` - outside the freshness window, when configured
    /// - `InvalidSignature` - non-hex signature or digest mismatch
    pub fn verify(
        &self,
        event: &PaymentWebhookEvent,
        header_signature: Option<&str>,
    ) -> Result<(), WebhookError> {
        let provided = header_signature
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .or(event.signature.as_deref())
            .ok_or(WebhookError::MissingSignature)?;

        self.validate_timestamp(&event.timestamp)?;

        let provided =
            hex::decode(provided.trim()).map_err(|_| WebhookError::InvalidSignature)?;
        let expected = self.compute_signature(&event.signing_payload())?;

        if !constant_time_compare(&expected, &provided) {
            return Err(WebhookError::InvalidSignature);
        }

        Ok(())
    }

    /// Hex-encoded signature for a canonical payload.
    ///
    /// Used by tests and local tooling to produce gateway-equivalent requests.
    pub fn sign(&self, payload: &str) -> Result<String, WebhookError> {
        self.compute_signature(payload).map(hex::encode)
    }

    fn validate_timestamp(&self, timestamp: &Timestamp) -> Result<(), WebhookError> {
        let Some(max_age) = self.max_age_secs else {
            return Ok(());
        };

        let age = Timestamp::now().duration_since(timestamp).num_seconds();

        if age > max_age || age < -MAX_CLOCK_SKEW_SECS {
            return Err(WebhookError::TimestampOutOfRange);
        }

        Ok(())
    }

    fn compute_signature(&self, payload: &str) -> Result<Vec<u8>, WebhookError> {
        let mut mac = Hmac::<Sha256>::new_from_slice(self.secret.expose_secret().as_bytes())
            .map_err(|_| WebhookError::InvalidSignature)?;
        mac.update(payload.as_bytes());
        Ok(mac.finalize().into_bytes().to_vec())
    }
}

/// Performs constant-time comparison of two byte slices.
fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}
