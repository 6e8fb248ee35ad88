//! Enrollment aggregate entity.
//!
//! An Enrollment links a student to a paid course and tracks the payment
//! lifecycle for that purchase. It is created by the checkout flow in
//! `Pending` status and mutated only by the payment webhook.
//!
//! # Design Decisions
//!
//! - **Order id is the identity**: the gateway echoes our id back as `orderId`
//! - **Money as decimal**: amounts are `Amount` (two-place fixed point), never floats
//! - **Last transaction recorded**: the applied `transaction_id` is stored on the
//!   row so redeliveries can be recognised without a separate lookup

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    CourseId, EnrollmentId, StateMachine, Timestamp, TransactionId, UserId, ValidationError,
};

use super::{Amount, EnrollmentStatus};

/// Enrollment aggregate - a student's paid access to one course.
///
/// # Invariants
///
/// - `id` is globally unique
/// - Status transitions follow [`EnrollmentStatus`] rules (pending is the only
///   non-terminal state)
/// - `transaction_id` is set exactly when the status left `Pending`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrollment {
    /// Unique identifier, used by the gateway as `orderId`.
    pub id: EnrollmentId,

    /// Student who purchased the course.
    pub user_id: UserId,

    /// Course or resource purchased.
    pub course_id: CourseId,

    /// Address that receives the confirmation email.
    pub recipient_email: String,

    /// Price charged at checkout.
    pub amount: Amount,

    /// Current payment status.
    pub status: EnrollmentStatus,

    /// Gateway transaction that moved the enrollment out of `Pending`.
    pub transaction_id: Option<TransactionId>,

    /// Timestamp carried by the webhook that last changed this enrollment.
    pub last_webhook_at: Option<Timestamp>,

    /// When the enrollment was created.
    pub created_at: Timestamp,

    /// When the enrollment was last updated.
    pub updated_at: Timestamp,
}

impl Enrollment {
    /// Create a new enrollment awaiting payment.
    pub fn create_pending(
        id: EnrollmentId,
        user_id: UserId,
        course_id: CourseId,
        recipient_email: impl Into<String>,
        amount: Amount,
    ) -> Self {
        let now = Timestamp::now();
        Self {
            id,
            user_id,
            course_id,
            recipient_email: recipient_email.into(),
            amount,
            status: EnrollmentStatus::Pending,
            transaction_id: None,
            last_webhook_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply the outcome of a payment webhook.
    ///
    /// # Errors
    ///
    /// Returns error if the transition is not allowed from the current status.
    pub fn apply_payment(
        &mut self,
        target: EnrollmentStatus,
        transaction_id: TransactionId,
        webhook_at: Timestamp,
    ) -> Result<(), ValidationError> {
        self.status = self.status.transition_to(target)?;
        self.transaction_id = Some(transaction_id);
        self.last_webhook_at = Some(webhook_at);
        self.updated_at = Timestamp::now();
        Ok(())
    }

    /// Returns true if `transaction_id` is the one already applied.
    pub fn was_applied_by(&self, transaction_id: &TransactionId) -> bool {
        self.transaction_id.as_ref() == Some(transaction_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending() -> Enrollment {
        Enrollment::create_pending(
            EnrollmentId::new("E1").unwrap(),
            UserId::new("student-1").unwrap(),
            CourseId::new("dsa-101").unwrap(),
            "student@example.com",
            "499.00".parse().unwrap(),
        )
    }

    fn txn(id: &str) -> TransactionId {
        TransactionId::new(id).unwrap()
    }

    #[test]
    fn create_pending_starts_without_access() {
        let enrollment = pending();
        assert_eq!(enrollment.status, EnrollmentStatus::Pending);
        assert!(enrollment.transaction_id.is_none());
        assert!(enrollment.last_webhook_at.is_none());
    }

    #[test]
    fn apply_success_activates() {
        let mut enrollment = pending();
        let at = Timestamp::now();

        enrollment
            .apply_payment(EnrollmentStatus::Active, txn("T1"), at)
            .unwrap();

        assert_eq!(enrollment.status, EnrollmentStatus::Active);
        assert!(enrollment.was_applied_by(&txn("T1")));
        assert_eq!(enrollment.last_webhook_at, Some(at));
    }

    #[test]
    fn apply_failure_marks_failed() {
        let mut enrollment = pending();

        enrollment
            .apply_payment(EnrollmentStatus::Failed, txn("T1"), Timestamp::now())
            .unwrap();

        assert_eq!(enrollment.status, EnrollmentStatus::Failed);
        assert!(enrollment.was_applied_by(&txn("T1")));
    }

    #[test]
    fn terminal_enrollment_rejects_further_payments() {
        let mut enrollment = pending();
        enrollment
            .apply_payment(EnrollmentStatus::Active, txn("T1"), Timestamp::now())
            .unwrap();

        let result = enrollment.apply_payment(EnrollmentStatus::Failed, txn("T2"), Timestamp::now());

        assert!(result.is_err());
        assert_eq!(enrollment.status, EnrollmentStatus::Active);
        assert!(enrollment.was_applied_by(&txn("T1")));
    }

    #[test]
    fn was_applied_by_is_false_for_other_transactions() {
        let mut enrollment = pending();
        assert!(!enrollment.was_applied_by(&txn("T1")));

        enrollment
            .apply_payment(EnrollmentStatus::Active, txn("T1"), Timestamp::now())
            .unwrap();
        assert!(!enrollment.was_applied_by(&txn("T2")));
    }
}
