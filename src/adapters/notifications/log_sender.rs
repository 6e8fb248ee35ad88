//! Notification sender that only writes a log line.
//!
//! Used when no email provider is configured.

use async_trait::async_trait;

use crate::ports::{Notification, NotificationError, NotificationSender};

pub struct LogNotificationSender;

#[async_trait]
impl NotificationSender for LogNotificationSender {
    async fn send(&self, notification: &Notification) -> Result<(), NotificationError> {
        tracing::info!(
            recipient = %notification.recipient,
            subject = notification.template.subject(),
            body = %notification.body_text(),
            "Email provider not configured, notification logged only"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::NotificationTemplate;
    use serde_json::json;

    #[tokio::test]
    async fn send_always_succeeds() {
        let notification = Notification {
            recipient: "student@example.com".to_string(),
            template: NotificationTemplate::EnrollmentConfirmed,
            data: json!({"enrollmentId": "E1"}),
        };

        assert!(LogNotificationSender.send(&notification).await.is_ok());
    }
}
