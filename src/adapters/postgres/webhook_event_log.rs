//! PostgreSQL implementation of WebhookEventLog.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::enrollment::PaymentStatus;
use crate::domain::foundation::{DomainError, EnrollmentId, ErrorCode, Timestamp, TransactionId};
use crate::ports::{DeliveryOutcome, WebhookEventLog, WebhookEventRecord};

/// PostgreSQL implementation of the WebhookEventLog port.
pub struct PostgresWebhookEventLog {
    pool: PgPool,
}

impl PostgresWebhookEventLog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct WebhookEventRow {
    id: Uuid,
    transaction_id: String,
    order_id: String,
    payment_status: String,
    outcome: String,
    error_message: Option<String>,
    payload: serde_json::Value,
    received_at: DateTime<Utc>,
}

fn parse_outcome(s: &str) -> Result<DeliveryOutcome, DomainError> {
    match s {
        "activated" => Ok(DeliveryOutcome::Activated),
        "failed" => Ok(DeliveryOutcome::Failed),
        "acknowledged" => Ok(DeliveryOutcome::Acknowledged),
        "replayed" => Ok(DeliveryOutcome::Replayed),
        "rejected" => Ok(DeliveryOutcome::Rejected),
        _ => Err(DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid outcome value: {}", s),
        )),
    }
}

impl TryFrom<WebhookEventRow> for WebhookEventRecord {
    type Error = DomainError;

    fn try_from(row: WebhookEventRow) -> Result<Self, Self::Error> {
        let corrupt = |field: &str, e: &dyn std::fmt::Display| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Invalid {} in webhook_events row: {}", field, e),
            )
        };

        let payment_status: PaymentStatus = row
            .payment_status
            .parse()
            .map_err(|e| corrupt("payment_status", &e))?;

        Ok(WebhookEventRecord {
            id: row.id,
            transaction_id: TransactionId::new(row.transaction_id)
                .map_err(|e| corrupt("transaction_id", &e))?,
            order_id: EnrollmentId::new(row.order_id).map_err(|e| corrupt("order_id", &e))?,
            payment_status,
            outcome: parse_outcome(&row.outcome)?,
            error_message: row.error_message,
            payload: row.payload,
            received_at: Timestamp::from_datetime(row.received_at),
        })
    }
}

#[async_trait]
impl WebhookEventLog for PostgresWebhookEventLog {
    async fn append(&self, record: WebhookEventRecord) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO webhook_events (
                id, transaction_id, order_id, payment_status, outcome,
                error_message, payload, received_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(record.id)
        .bind(record.transaction_id.as_str())
        .bind(record.order_id.as_str())
        .bind(record.payment_status.as_str())
        .bind(record.outcome.as_str())
        .bind(&record.error_message)
        .bind(&record.payload)
        .bind(record.received_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to append webhook event: {}", e),
            )
        })?;

        Ok(())
    }

    async fn find_by_transaction_id(
        &self,
        transaction_id: &TransactionId,
    ) -> Result<Vec<WebhookEventRecord>, DomainError> {
        let rows: Vec<WebhookEventRow> = sqlx::query_as(
            r#"
            SELECT id, transaction_id, order_id, payment_status, outcome,
                   error_message, payload, received_at
            FROM webhook_events
            WHERE transaction_id = $1
            ORDER BY received_at ASC
            "#,
        )
        .bind(transaction_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to find webhook events: {}", e),
            )
        })?;

        rows.into_iter().map(WebhookEventRecord::try_from).collect()
    }
}
