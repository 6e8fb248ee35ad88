//! Idempotency guard for payment webhooks.
//!
//! Gateways deliver at least once, so the same event can arrive many times and
//! events can arrive out of order. The guard looks at the enrollment's current
//! status, the event status and the transaction id, and decides whether the
//! event moves the enrollment, is a harmless repeat, or contradicts what is
//! already recorded.

use super::{Enrollment, EnrollmentStatus, PaymentStatus, PaymentWebhookEvent, WebhookError};

/// Why an event was accepted without changing the enrollment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckReason {
    /// PENDING event for a pending enrollment.
    StillPending,
    /// Redelivery of the event that already decided the enrollment.
    Replay,
    /// Late PENDING event for a transaction that has since completed.
    StaleDelivery,
}

impl AckReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            AckReason::StillPending => "still_pending",
            AckReason::Replay => "replay",
            AckReason::StaleDelivery => "stale_delivery",
        }
    }
}

/// What to do with a verified event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// Move the pending enrollment to the given terminal status.
    Transition(EnrollmentStatus),
    /// Accept the event and leave the enrollment unchanged.
    Acknowledge(AckReason),
}

/// Stateless decision table over enrollment status, event status and transaction id.
pub struct IdempotencyGuard;

impl IdempotencyGuard {
    /// Decides how `event` applies to `enrollment`.
    ///
    /// # Errors
    ///
    /// - `AmountMismatch` - SUCCESS for a pending enrollment with a different price
    /// - `ConflictingState` - event contradicts a terminal status
    pub fn evaluate(
        enrollment: &Enrollment,
        event: &PaymentWebhookEvent,
    ) -> Result<GuardDecision, WebhookError> {
        use EnrollmentStatus as E;
        use PaymentStatus as P;

        let same_txn = enrollment.was_applied_by(&event.transaction_id);
        let conflict = |reason: &str| WebhookError::ConflictingState {
            enrollment_id: enrollment.id.clone(),
            current: enrollment.status,
            received: event.status,
            reason: reason.to_string(),
        };

        match (enrollment.status, event.status) {
            (E::Pending, P::Success) => {
                if event.amount != enrollment.amount {
                    return Err(WebhookError::AmountMismatch {
                        enrollment_id: enrollment.id.clone(),
                        expected: enrollment.amount,
                        received: event.amount,
                    });
                }
                Ok(GuardDecision::Transition(E::Active))
            }
            (E::Pending, P::Failed) => Ok(GuardDecision::Transition(E::Failed)),
            (E::Pending, P::Pending) => Ok(GuardDecision::Acknowledge(AckReason::StillPending)),

            (E::Active, P::Success) if same_txn => Ok(GuardDecision::Acknowledge(AckReason::Replay)),
            (E::Active, P::Success) => Err(conflict(
                "already activated by another transaction, possible double charge",
            )),
            (E::Active, P::Failed) => Err(conflict("enrollment already active")),

            (E::Failed, P::Failed) if same_txn => Ok(GuardDecision::Acknowledge(AckReason::Replay)),
            (E::Failed, P::Failed) => Err(conflict("already failed by another transaction")),
            (E::Failed, P::Success) => Err(conflict("enrollment already failed")),

            (_, P::Pending) if same_txn => {
                Ok(GuardDecision::Acknowledge(AckReason::StaleDelivery))
            }
            (_, P::Pending) => Err(conflict("pending event for a different transaction")),
        }
    }
}
