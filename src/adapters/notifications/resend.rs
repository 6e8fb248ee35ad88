//! Resend email sender.
//!
//! Delivers notifications through the Resend HTTP API
//! (`POST {base_url}/emails` with a bearer API key).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::Serialize;

use crate::ports::{Notification, NotificationError, NotificationSender};

/// Configuration for the Resend sender.
#[derive(Debug, Clone)]
pub struct ResendConfig {
    api_key: Secret<String>,
    /// Base URL for the API (default: https://api.resend.com).
    pub base_url: String,
    /// Value of the `from` field, e.g. `E-Shikshan <noreply@eshikshan.in>`.
    pub from: String,
    /// Request timeout.
    pub timeout: Duration,
}

impl ResendConfig {
    pub fn new(api_key: Secret<String>, from: impl Into<String>) -> Self {
        Self {
            api_key,
            base_url: "https://api.resend.com".to_string(),
            from: from.into(),
            timeout: Duration::from_secs(10),
        }
    }

    /// Sets the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Request body for `POST /emails`.
#[derive(Debug, Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: Vec<&'a str>,
    subject: &'a str,
    text: String,
}

/// Resend implementation of [`NotificationSender`].
pub struct ResendEmailSender {
    config: ResendConfig,
    client: Client,
}

impl ResendEmailSender {
    /// # Errors
    ///
    /// Returns `Delivery` if the HTTP client cannot be built.
    pub fn new(config: ResendConfig) -> Result<Self, NotificationError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| NotificationError::Delivery(format!("HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    fn emails_url(&self) -> String {
        format!("{}/emails", self.config.base_url.trim_end_matches('/'))
    }

    fn to_request<'a>(&'a self, notification: &'a Notification) -> SendEmailRequest<'a> {
        SendEmailRequest {
            from: &self.config.from,
            to: vec![notification.recipient.as_str()],
            subject: notification.template.subject(),
            text: notification.body_text(),
        }
    }
}

#[async_trait]
impl NotificationSender for ResendEmailSender {
    async fn send(&self, notification: &Notification) -> Result<(), NotificationError> {
        let response = self
            .client
            .post(self.emails_url())
            .bearer_auth(self.config.api_key.expose_secret())
            .json(&self.to_request(notification))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    NotificationError::Delivery("Resend request timed out".to_string())
                } else {
                    NotificationError::Delivery(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotificationError::Delivery(format!(
                "Resend returned {}: {}",
                status, body
            )));
        }

        tracing::debug!(recipient = %notification.recipient, "Email sent via Resend");
        Ok(())
    }
}
