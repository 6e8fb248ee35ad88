//! Notification ports.
//!
//! The webhook flow hands notifications to a [`NotificationDispatcher`] and
//! never waits for delivery. A background worker passes queued notifications
//! to a [`NotificationSender`], which performs the actual send.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

/// Message templates the service can send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationTemplate {
    /// Sent once when an enrollment becomes active.
    EnrollmentConfirmed,
}

impl NotificationTemplate {
    pub fn subject(&self) -> &'static str {
        match self {
            NotificationTemplate::EnrollmentConfirmed => "Your enrollment is confirmed",
        }
    }
}

/// A message to a single recipient.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub recipient: String,
    pub template: NotificationTemplate,
    pub data: serde_json::Value,
}

impl Notification {
    /// Short plain-text body rendered from `data`.
    pub fn body_text(&self) -> String {
        let field = |key: &str| {
            self.data
                .get(key)
                .and_then(|v| v.as_str())
                .unwrap_or("-")
                .to_string()
        };
        match self.template {
            NotificationTemplate::EnrollmentConfirmed => format!(
                "Your payment of {} for course {} was received (transaction {}). \
                 Enrollment {} is now active.",
                field("amount"),
                field("courseId"),
                field("transactionId"),
                field("enrollmentId"),
            ),
        }
    }
}

/// Errors from dispatching or sending a notification.
#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("Notification queue is full")]
    QueueFull,

    #[error("Notification queue is closed")]
    QueueClosed,

    #[error("Notification delivery failed: {0}")]
    Delivery(String),
}

/// Fire-and-forget submission of notifications.
pub trait NotificationDispatcher: Send + Sync {
    /// Submit a notification without waiting for delivery.
    ///
    /// # Errors
    ///
    /// Returns an error only if the notification could not be accepted.
    fn dispatch(&self, notification: Notification) -> Result<(), NotificationError>;
}

/// Delivers a single notification.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send(&self, notification: &Notification) -> Result<(), NotificationError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn confirmation_body_includes_details() {
        let notification = Notification {
            recipient: "student@example.com".to_string(),
            template: NotificationTemplate::EnrollmentConfirmed,
            data: json!({
                "enrollmentId": "E1",
                "courseId": "dsa-101",
                "amount": "499.00",
                "transactionId": "T1",
            }),
        };

        let body = notification.body_text();

        assert!(body.contains("499.00"));
        assert!(body.contains("dsa-101"));
        assert!(body.contains("T1"));
        assert!(body.contains("E1"));
    }

    #[test]
    fn missing_fields_render_placeholder() {
        let notification = Notification {
            recipient: "student@example.com".to_string(),
            template: NotificationTemplate::EnrollmentConfirmed,
            data: json!({}),
        };

        assert!(notification.body_text().contains("course -"));
    }
}
