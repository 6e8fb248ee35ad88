//! Payment webhook event parsing.
//!
//! Incoming bodies are first read into [`RawWebhookPayload`], where every
//! field is optional and loosely typed, then converted into a
//! [`PaymentWebhookEvent`] whose fields are all present and well formed.
//! Business logic only ever sees the second type.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::foundation::{EnrollmentId, Timestamp, TransactionId};

use super::{Amount, WebhookError};

/// Payment outcome reported by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentStatus {
    Success,
    Failed,
    Pending,
}

impl PaymentStatus {
    /// Wire form, as signed by the gateway.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Success => "SUCCESS",
            PaymentStatus::Failed => "FAILED",
            PaymentStatus::Pending => "PENDING",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = WebhookError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SUCCESS" => Ok(PaymentStatus::Success),
            "FAILED" => Ok(PaymentStatus::Failed),
            "PENDING" => Ok(PaymentStatus::Pending),
            other => Err(WebhookError::MalformedPayload(format!(
                "unknown status '{}'",
                other
            ))),
        }
    }
}

/// Webhook body as received, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawWebhookPayload {
    pub transaction_id: Option<String>,
    pub order_id: Option<String>,
    pub amount: Option<Value>,
    pub status: Option<String>,
    pub timestamp: Option<String>,
    pub signature: Option<String>,

    /// Payment-method details and any other extra fields.
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

/// A validated payment webhook event.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentWebhookEvent {
    pub transaction_id: TransactionId,
    pub order_id: EnrollmentId,
    pub amount: Amount,
    pub status: PaymentStatus,

    /// Parsed event time.
    pub timestamp: Timestamp,

    /// Event time exactly as sent; this is what the gateway signed.
    pub raw_timestamp: String,

    /// Signature carried in the body, if any.
    pub signature: Option<String>,

    pub metadata: Map<String, Value>,
}

impl PaymentWebhookEvent {
    /// Parses and validates a raw JSON body.
    ///
    /// # Errors
    ///
    /// Returns `MalformedPayload` for invalid JSON or any missing/invalid field.
    pub fn parse(body: &[u8]) -> Result<Self, WebhookError> {
        let raw: RawWebhookPayload = serde_json::from_slice(body)
            .map_err(|e| WebhookError::MalformedPayload(e.to_string()))?;
        Self::try_from(raw)
    }

    /// Pipe-joined canonical string covered by the HMAC:
    /// `transactionId|orderId|amount|status|timestamp`.
    pub fn signing_payload(&self) -> String {
        format!(
            "{}|{}|{}|{}|{}",
            self.transaction_id,
            self.order_id,
            self.amount.canonical(),
            self.status.as_str(),
            self.raw_timestamp
        )
    }

    /// JSON snapshot of the event for the delivery log.
    pub fn to_json(&self) -> Value {
        serde_json::json!({
            "transactionId": self.transaction_id.as_str(),
            "orderId": self.order_id.as_str(),
            "amount": self.amount.canonical(),
            "status": self.status.as_str(),
            "timestamp": self.raw_timestamp,
            "metadata": Value::Object(self.metadata.clone()),
        })
    }
}

fn required(value: Option<String>, field: &'static str) -> Result<String, WebhookError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| WebhookError::MalformedPayload(format!("missing field '{}'", field)))
}

/// Identifiers are signed and stored exactly as sent, so padding is refused
/// rather than trimmed away.
fn required_id(value: Option<String>, field: &'static str) -> Result<String, WebhookError> {
    let value = required(value, field)?;
    if value.trim() != value {
        return Err(WebhookError::MalformedPayload(format!(
            "field '{}' has surrounding whitespace",
            field
        )));
    }
    Ok(value)
}

impl TryFrom<RawWebhookPayload> for PaymentWebhookEvent {
    type Error = WebhookError;

    fn try_from(raw: RawWebhookPayload) -> Result<Self, Self::Error> {
        let malformed = |e: crate::domain::foundation::ValidationError| {
            WebhookError::MalformedPayload(e.to_string())
        };

        let transaction_id = TransactionId::new(required_id(raw.transaction_id, "transactionId")?)
            .map_err(malformed)?;
        let order_id =
            EnrollmentId::new(required_id(raw.order_id, "orderId")?).map_err(malformed)?;

        let amount = match raw.amount {
            Some(Value::Number(n)) => Amount::from_json_number(&n).map_err(malformed)?,
            Some(Value::Null) | None => {
                return Err(WebhookError::MalformedPayload(
                    "missing field 'amount'".to_string(),
                ))
            }
            Some(_) => {
                return Err(WebhookError::MalformedPayload(
                    "field 'amount' must be a number".to_string(),
                ))
            }
        };

        let status: PaymentStatus = required(raw.status, "status")?.parse()?;

        let raw_timestamp = required(raw.timestamp, "timestamp")?;
        let timestamp = Timestamp::parse_rfc3339(&raw_timestamp).map_err(|e| {
            WebhookError::MalformedPayload(format!("field 'timestamp' is not ISO-8601: {}", e))
        })?;

        let signature = raw.signature.filter(|s| !s.trim().is_empty());

        Ok(Self {
            transaction_id,
            order_id,
            amount,
            status,
            timestamp,
            raw_timestamp,
            signature,
            metadata: raw.metadata,
        })
    }
}
