//! Email configuration

use std::time::Duration;

use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;

use super::error::ValidationError;

/// Email configuration (Resend)
#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    /// Resend API key; without it notifications are only logged
    #[serde(default)]
    pub resend_api_key: Option<Secret<String>>,

    /// Resend API base URL
    #[serde(default = "default_resend_base_url")]
    pub resend_base_url: String,

    /// From email address
    #[serde(default = "default_from_email")]
    pub from_email: String,

    /// From name
    #[serde(default = "default_from_name")]
    pub from_name: String,

    /// Capacity of the in-process notification queue
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Timeout for one Resend API call, in seconds
    #[serde(default = "default_send_timeout")]
    pub send_timeout_secs: u64,
}

impl EmailConfig {
    /// Get formatted "From" header value
    pub fn from_header(&self) -> String {
        format!("{} <{}>", self.from_name, self.from_email)
    }

    pub fn send_timeout(&self) -> Duration {
        Duration::from_secs(self.send_timeout_secs)
    }

    /// Check if a real email provider is configured
    pub fn is_enabled(&self) -> bool {
        self.resend_api_key
            .as_ref()
            .is_some_and(|key| !key.expose_secret().is_empty())
    }

    /// Validate email configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(key) = &self.resend_api_key {
            if !key.expose_secret().starts_with("re_") {
                return Err(ValidationError::InvalidResendKey);
            }
        }
        if !self.resend_base_url.starts_with("http://") && !self.resend_base_url.starts_with("https://") {
            return Err(ValidationError::InvalidResendUrl);
        }
        if !self.from_email.contains('@') {
            return Err(ValidationError::InvalidFromEmail);
        }
        if self.queue_capacity == 0 {
            return Err(ValidationError::InvalidQueueCapacity);
        }
        if self.send_timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            resend_api_key: None,
            resend_base_url: default_resend_base_url(),
            from_email: default_from_email(),
            from_name: default_from_name(),
            queue_capacity: default_queue_capacity(),
            send_timeout_secs: default_send_timeout(),
        }
    }
}

fn default_resend_base_url() -> String {
    "https://api.resend.com".to_string()
}

fn default_from_email() -> String {
    "noreply@eshikshan.in".to_string()
}

fn default_from_name() -> String {
    "E-Shikshan".to_string()
}

fn default_queue_capacity() -> usize {
    1024
}

fn default_send_timeout() -> u64 {
    10
}
