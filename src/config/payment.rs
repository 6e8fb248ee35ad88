//! Payment webhook configuration

use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;

use super::error::ValidationError;

/// Minimum accepted length of the shared webhook secret.
const MIN_SECRET_LEN: usize = 16;

/// Payment gateway webhook configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentConfig {
    /// Shared HMAC-SHA256 secret agreed with the gateway
    pub webhook_secret: Secret<String>,

    /// Reject events older than this many seconds (unset: accept any age)
    #[serde(default)]
    pub webhook_max_age_secs: Option<i64>,
}

impl PaymentConfig {
    /// Validate payment configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        let secret = self.webhook_secret.expose_secret();
        if secret.is_empty() {
            return Err(ValidationError::MissingRequired("PAYMENT__WEBHOOK_SECRET"));
        }
        if secret.len() < MIN_SECRET_LEN {
            return Err(ValidationError::WebhookSecretTooShort);
        }
        if matches!(self.webhook_max_age_secs, Some(age) if age <= 0) {
            return Err(ValidationError::InvalidWebhookMaxAge);
        }
        Ok(())
    }
}
