//! In-memory WebhookEventLog for tests and local runs.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, TransactionId};
use crate::ports::{WebhookEventLog, WebhookEventRecord};

#[derive(Default)]
pub struct InMemoryWebhookEventLog {
    records: RwLock<Vec<WebhookEventRecord>>,
}

impl InMemoryWebhookEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// All records in append order.
    pub async fn records(&self) -> Vec<WebhookEventRecord> {
        self.records.read().await.clone()
    }
}

#[async_trait]
impl WebhookEventLog for InMemoryWebhookEventLog {
    async fn append(&self, record: WebhookEventRecord) -> Result<(), DomainError> {
        self.records.write().await.push(record);
        Ok(())
    }

    async fn find_by_transaction_id(
        &self,
        transaction_id: &TransactionId,
    ) -> Result<Vec<WebhookEventRecord>, DomainError> {
        Ok(self
            .records
            .read()
            .await
            .iter()
            .filter(|r| &r.transaction_id == transaction_id)
            .cloned()
            .collect())
    }
}
