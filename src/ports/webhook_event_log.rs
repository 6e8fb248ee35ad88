//! WebhookEventLog port - Append-only record of verified webhook deliveries.
//!
//! Every delivery whose signature checks out is recorded together with what the
//! service did with it. The log is for auditing and support; the enrollment row
//! alone decides idempotency.

use std::fmt;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::enrollment::PaymentStatus;
use crate::domain::foundation::{DomainError, EnrollmentId, Timestamp, TransactionId};

/// What the service did with a delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Enrollment moved from pending to active.
    Activated,
    /// Enrollment moved from pending to failed.
    Failed,
    /// Accepted without a change (still pending or stale).
    Acknowledged,
    /// Redelivery of an already applied event.
    Replayed,
    /// Rejected after verification (conflict, mismatch, storage error).
    Rejected,
}

impl DeliveryOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryOutcome::Activated => "activated",
            DeliveryOutcome::Failed => "failed",
            DeliveryOutcome::Acknowledged => "acknowledged",
            DeliveryOutcome::Replayed => "replayed",
            DeliveryOutcome::Rejected => "rejected",
        }
    }
}

impl fmt::Display for DeliveryOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One verified webhook delivery.
#[derive(Debug, Clone)]
pub struct WebhookEventRecord {
    pub id: Uuid,
    pub transaction_id: TransactionId,
    pub order_id: EnrollmentId,
    pub payment_status: PaymentStatus,
    pub outcome: DeliveryOutcome,

    /// Rejection reason, if any.
    pub error_message: Option<String>,

    /// Event snapshot for debugging.
    pub payload: serde_json::Value,

    pub received_at: Timestamp,
}

impl WebhookEventRecord {
    /// Creates a record for a delivery that was accepted.
    pub fn accepted(
        transaction_id: TransactionId,
        order_id: EnrollmentId,
        payment_status: PaymentStatus,
        outcome: DeliveryOutcome,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            transaction_id,
            order_id,
            payment_status,
            outcome,
            error_message: None,
            payload,
            received_at: Timestamp::now(),
        }
    }

    /// Creates a record for a delivery that was rejected after verification.
    pub fn rejected(
        transaction_id: TransactionId,
        order_id: EnrollmentId,
        payment_status: PaymentStatus,
        error: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            error_message: Some(error.into()),
            ..Self::accepted(
                transaction_id,
                order_id,
                payment_status,
                DeliveryOutcome::Rejected,
                payload,
            )
        }
    }
}

/// Port for the webhook delivery log.
#[async_trait]
pub trait WebhookEventLog: Send + Sync {
    /// Append a delivery record.
    async fn append(&self, record: WebhookEventRecord) -> Result<(), DomainError>;

    /// All deliveries for a gateway transaction, oldest first.
    async fn find_by_transaction_id(
        &self,
        transaction_id: &TransactionId,
    ) -> Result<Vec<WebhookEventRecord>, DomainError>;
}
