//! ApplyPaymentWebhookHandler - Command handler for payment gateway webhooks.
//!
//! Parses and verifies the delivery, applies the idempotency rules, performs
//! the conditional status update, and queues the confirmation email after a
//! successful activation.

use std::sync::Arc;

use serde_json::json;

use crate::domain::enrollment::{
    AckReason, Enrollment, EnrollmentStatus, GuardDecision, IdempotencyGuard, PaymentWebhookEvent,
    WebhookError, WebhookSignatureVerifier,
};
use crate::domain::foundation::{DomainError, EnrollmentId, ErrorCode, TransactionId};
use crate::ports::{
    DeliveryOutcome, EnrollmentRepository, Notification, NotificationDispatcher,
    NotificationTemplate, StatusTransition, TransitionOutcome, WebhookEventLog,
    WebhookEventRecord,
};

/// Command to apply a payment webhook.
#[derive(Debug, Clone)]
pub struct ApplyPaymentWebhookCommand {
    /// Raw webhook body.
    pub payload: Vec<u8>,
    /// Value of the signature header, if sent.
    pub signature: Option<String>,
}

/// Result of webhook processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyPaymentWebhookResult {
    /// Payment succeeded, enrollment activated.
    Activated {
        enrollment_id: EnrollmentId,
        transaction_id: TransactionId,
    },
    /// Payment failed, enrollment marked failed.
    MarkedFailed {
        enrollment_id: EnrollmentId,
        transaction_id: TransactionId,
    },
    /// Event accepted, enrollment unchanged.
    Acknowledged {
        enrollment_id: EnrollmentId,
        reason: AckReason,
    },
}

impl ApplyPaymentWebhookResult {
    pub fn outcome(&self) -> DeliveryOutcome {
        match self {
            ApplyPaymentWebhookResult::Activated { .. } => DeliveryOutcome::Activated,
            ApplyPaymentWebhookResult::MarkedFailed { .. } => DeliveryOutcome::Failed,
            ApplyPaymentWebhookResult::Acknowledged {
                reason: AckReason::Replay,
                ..
            } => DeliveryOutcome::Replayed,
            ApplyPaymentWebhookResult::Acknowledged { .. } => DeliveryOutcome::Acknowledged,
        }
    }
}

/// Handler for payment gateway webhooks.
///
/// Guarantees at most one status transition per enrollment no matter how often
/// or how concurrently the gateway delivers the same event.
pub struct ApplyPaymentWebhookHandler {
    repository: Arc<dyn EnrollmentRepository>,
    event_log: Arc<dyn WebhookEventLog>,
    dispatcher: Arc<dyn NotificationDispatcher>,
    verifier: Arc<WebhookSignatureVerifier>,
}

impl ApplyPaymentWebhookHandler {
    pub fn new(
        repository: Arc<dyn EnrollmentRepository>,
        event_log: Arc<dyn WebhookEventLog>,
        dispatcher: Arc<dyn NotificationDispatcher>,
        verifier: Arc<WebhookSignatureVerifier>,
    ) -> Self {
        Self {
            repository,
            event_log,
            dispatcher,
            verifier,
        }
    }

    pub async fn handle(
        &self,
        cmd: ApplyPaymentWebhookCommand,
    ) -> Result<ApplyPaymentWebhookResult, WebhookError> {
        // 1. Parse and verify; nothing unverified reaches storage
        let event = PaymentWebhookEvent::parse(&cmd.payload)?;
        self.verifier.verify(&event, cmd.signature.as_deref())?;

        // 2. Apply
        let result = self.apply(&event).await;

        match &result {
            Ok(applied) => tracing::info!(
                enrollment_id = %event.order_id,
                transaction_id = %event.transaction_id,
                payment_status = %event.status,
                outcome = %applied.outcome(),
                "Payment webhook applied"
            ),
            Err(err) if err.needs_review() => tracing::warn!(
                enrollment_id = %event.order_id,
                transaction_id = %event.transaction_id,
                payment_status = %event.status,
                error = %err,
                "Payment webhook rejected, needs review"
            ),
            Err(err) => tracing::error!(
                enrollment_id = %event.order_id,
                transaction_id = %event.transaction_id,
                error = %err,
                retryable = err.is_retryable(),
                "Payment webhook failed"
            ),
        }

        // 3. Record the delivery
        self.record(&event, &result).await;

        result
    }

    async fn apply(
        &self,
        event: &PaymentWebhookEvent,
    ) -> Result<ApplyPaymentWebhookResult, WebhookError> {
        let enrollment = self
            .repository
            .find_by_id(&event.order_id)
            .await?
            .ok_or_else(|| WebhookError::EnrollmentNotFound(event.order_id.clone()))?;

        let target = match IdempotencyGuard::evaluate(&enrollment, event)? {
            GuardDecision::Acknowledge(reason) => return Ok(acknowledged(event, reason)),
            GuardDecision::Transition(target) => target,
        };

        let transition = StatusTransition {
            expected: enrollment.status,
            target,
            transaction_id: event.transaction_id.clone(),
            webhook_at: event.timestamp,
        };

        let outcome = self
            .repository
            .transition_status(&enrollment.id, transition)
            .await
            .map_err(|e| map_repository_error(e, &enrollment.id))?;

        match outcome {
            TransitionOutcome::Applied(updated) => {
                if updated.status == EnrollmentStatus::Active {
                    self.notify_confirmed(&updated);
                    Ok(ApplyPaymentWebhookResult::Activated {
                        enrollment_id: updated.id,
                        transaction_id: event.transaction_id.clone(),
                    })
                } else {
                    Ok(ApplyPaymentWebhookResult::MarkedFailed {
                        enrollment_id: updated.id,
                        transaction_id: event.transaction_id.clone(),
                    })
                }
            }
            TransitionOutcome::Stale(current) => {
                tracing::debug!(
                    enrollment_id = %current.id,
                    current_status = %current.status,
                    "Lost transition race, re-evaluating against fresh state"
                );
                match IdempotencyGuard::evaluate(&current, event)? {
                    GuardDecision::Acknowledge(reason) => Ok(acknowledged(event, reason)),
                    GuardDecision::Transition(_) => Err(WebhookError::Database(
                        "enrollment changed concurrently".to_string(),
                    )),
                }
            }
        }
    }

    fn notify_confirmed(&self, enrollment: &Enrollment) {
        let notification = Notification {
            recipient: enrollment.recipient_email.clone(),
            template: NotificationTemplate::EnrollmentConfirmed,
            data: json!({
                "enrollmentId": enrollment.id.as_str(),
                "courseId": enrollment.course_id.as_str(),
                "amount": enrollment.amount.canonical(),
                "transactionId": enrollment.transaction_id.as_ref().map(|t| t.as_str()),
            }),
        };

        if let Err(err) = self.dispatcher.dispatch(notification) {
            tracing::warn!(
                enrollment_id = %enrollment.id,
                error = %err,
                "Failed to queue enrollment confirmation"
            );
        }
    }

    async fn record(
        &self,
        event: &PaymentWebhookEvent,
        result: &Result<ApplyPaymentWebhookResult, WebhookError>,
    ) {
        let record = match result {
            Ok(applied) => WebhookEventRecord::accepted(
                event.transaction_id.clone(),
                event.order_id.clone(),
                event.status,
                applied.outcome(),
                event.to_json(),
            ),
            Err(err) => WebhookEventRecord::rejected(
                event.transaction_id.clone(),
                event.order_id.clone(),
                event.status,
                err.to_string(),
                event.to_json(),
            ),
        };

        if let Err(err) = self.event_log.append(record).await {
            tracing::error!(
                transaction_id = %event.transaction_id,
                error = %err,
                "Failed to append webhook delivery log"
            );
        }
    }
}

fn acknowledged(event: &PaymentWebhookEvent, reason: AckReason) -> ApplyPaymentWebhookResult {
    ApplyPaymentWebhookResult::Acknowledged {
        enrollment_id: event.order_id.clone(),
        reason,
    }
}

fn map_repository_error(err: DomainError, id: &EnrollmentId) -> WebhookError {
    match err.code {
        ErrorCode::EnrollmentNotFound => WebhookError::EnrollmentNotFound(id.clone()),
        _ => WebhookError::from(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{CourseId, Timestamp, UserId};
    use crate::ports::NotificationError;
    use async_trait::async_trait;
    use secrecy::Secret;
    use std::sync::Mutex;

    const SECRET: &str = "whsec_handler_test";

    // ════════════════════════════════════════════════════════════════════════════
    // Mock Implementations
    // ════════════════════════════════════════════════════════════════════════════

    struct MockEnrollmentRepository {
        enrollments: Mutex<Vec<Enrollment>>,
        /// State another writer commits just before our conditional update.
        race_winner: Mutex<Option<Enrollment>>,
        fail_reads: bool,
    }

    impl MockEnrollmentRepository {
        fn with_enrollment(enrollment: Enrollment) -> Self {
            Self {
                enrollments: Mutex::new(vec![enrollment]),
                race_winner: Mutex::new(None),
                fail_reads: false,
            }
        }

        fn empty() -> Self {
            Self {
                enrollments: Mutex::new(Vec::new()),
                race_winner: Mutex::new(None),
                fail_reads: false,
            }
        }

        fn failing() -> Self {
            Self {
                fail_reads: true,
                ..Self::empty()
            }
        }

        fn losing_race_to(self, winner: Enrollment) -> Self {
            *self.race_winner.lock().unwrap() = Some(winner);
            self
        }

        fn get(&self, id: &str) -> Enrollment {
            self.enrollments
                .lock()
                .unwrap()
                .iter()
                .find(|e| e.id.as_str() == id)
                .cloned()
                .unwrap()
        }
    }

    #[async_trait]
    impl EnrollmentRepository for MockEnrollmentRepository {
        async fn save(&self, enrollment: &Enrollment) -> Result<(), DomainError> {
            self.enrollments.lock().unwrap().push(enrollment.clone());
            Ok(())
        }

        async fn find_by_id(&self, id: &EnrollmentId) -> Result<Option<Enrollment>, DomainError> {
            if self.fail_reads {
                return Err(DomainError::database("connection refused"));
            }
            Ok(self
                .enrollments
                .lock()
                .unwrap()
                .iter()
                .find(|e| &e.id == id)
                .cloned())
        }

        async fn transition_status(
            &self,
            id: &EnrollmentId,
            transition: StatusTransition,
        ) -> Result<TransitionOutcome, DomainError> {
            let mut enrollments = self.enrollments.lock().unwrap();
            let stored = enrollments
                .iter_mut()
                .find(|e| &e.id == id)
                .ok_or_else(|| DomainError::new(ErrorCode::EnrollmentNotFound, "gone"))?;

            if let Some(winner) = self.race_winner.lock().unwrap().take() {
                *stored = winner;
            }

            if stored.status != transition.expected {
                return Ok(TransitionOutcome::Stale(stored.clone()));
            }
            stored.apply_payment(transition.target, transition.transaction_id, transition.webhook_at)?;
            Ok(TransitionOutcome::Applied(stored.clone()))
        }
    }

    #[derive(Default)]
    struct MockEventLog {
        records: Mutex<Vec<WebhookEventRecord>>,
        fail: bool,
    }

    impl MockEventLog {
        fn outcomes(&self) -> Vec<DeliveryOutcome> {
            self.records.lock().unwrap().iter().map(|r| r.outcome).collect()
        }
    }

    #[async_trait]
    impl WebhookEventLog for MockEventLog {
        async fn append(&self, record: WebhookEventRecord) -> Result<(), DomainError> {
            if self.fail {
                return Err(DomainError::database("log table missing"));
            }
            self.records.lock().unwrap().push(record);
            Ok(())
        }

        async fn find_by_transaction_id(
            &self,
            transaction_id: &TransactionId,
        ) -> Result<Vec<WebhookEventRecord>, DomainError> {
            Ok(self
                .records
                .lock()
                .unwrap()
                .iter()
                .filter(|r| &r.transaction_id == transaction_id)
                .cloned()
                .collect())
        }
    }

    #[derive(Default)]
    struct MockDispatcher {
        sent: Mutex<Vec<Notification>>,
        fail: bool,
    }

    impl NotificationDispatcher for MockDispatcher {
        fn dispatch(&self, notification: Notification) -> Result<(), NotificationError> {
            if self.fail {
                return Err(NotificationError::QueueFull);
            }
            self.sent.lock().unwrap().push(notification);
            Ok(())
        }
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Fixtures
    // ════════════════════════════════════════════════════════════════════════════

    fn pending_enrollment() -> Enrollment {
        Enrollment::create_pending(
            EnrollmentId::new("E1").unwrap(),
            UserId::new("student-1").unwrap(),
            CourseId::new("dsa-101").unwrap(),
            "student@example.com",
            "499.00".parse().unwrap(),
        )
    }

    fn decided(status: EnrollmentStatus, txn: &str) -> Enrollment {
        let mut enrollment = pending_enrollment();
        enrollment
            .apply_payment(status, TransactionId::new(txn).unwrap(), Timestamp::now())
            .unwrap();
        enrollment
    }

    fn verifier() -> Arc<WebhookSignatureVerifier> {
        Arc::new(WebhookSignatureVerifier::new(Secret::new(SECRET.to_string())))
    }

    fn signed_command(txn: &str, status: &str, amount: &str) -> ApplyPaymentWebhookCommand {
        let timestamp = "2024-05-01T10:00:00Z";
        let canonical: crate::domain::enrollment::Amount = amount.parse().unwrap();
        let signature = verifier()
            .sign(&format!("{}|E1|{}|{}|{}", txn, canonical, status, timestamp))
            .unwrap();
        let body = format!(
            r#"{{"transactionId":"{}","orderId":"E1","amount":{},"status":"{}","timestamp":"{}"}}"#,
            txn, amount, status, timestamp
        );
        ApplyPaymentWebhookCommand {
            payload: body.into_bytes(),
            signature: Some(signature),
        }
    }

    struct Harness {
        repo: Arc<MockEnrollmentRepository>,
        log: Arc<MockEventLog>,
        dispatcher: Arc<MockDispatcher>,
        handler: ApplyPaymentWebhookHandler,
    }

    fn harness_with(
        repo: MockEnrollmentRepository,
        log: MockEventLog,
        dispatcher: MockDispatcher,
    ) -> Harness {
        let repo = Arc::new(repo);
        let log = Arc::new(log);
        let dispatcher = Arc::new(dispatcher);
        let handler = ApplyPaymentWebhookHandler::new(
            repo.clone(),
            log.clone(),
            dispatcher.clone(),
            verifier(),
        );
        Harness {
            repo,
            log,
            dispatcher,
            handler,
        }
    }

    fn harness(enrollment: Enrollment) -> Harness {
        harness_with(
            MockEnrollmentRepository::with_enrollment(enrollment),
            MockEventLog::default(),
            MockDispatcher::default(),
        )
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Transition Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn success_activates_pending_enrollment() {
        let h = harness(pending_enrollment());

        let result = h.handler.handle(signed_command("T1", "SUCCESS", "499.00")).await;

        assert!(matches!(result, Ok(ApplyPaymentWebhookResult::Activated { .. })));
        let stored = h.repo.get("E1");
        assert_eq!(stored.status, EnrollmentStatus::Active);
        assert_eq!(stored.transaction_id.unwrap().as_str(), "T1");
    }

    #[tokio::test]
    async fn activation_queues_one_confirmation() {
        let h = harness(pending_enrollment());

        h.handler.handle(signed_command("T1", "SUCCESS", "499")).await.unwrap();

        let sent = h.dispatcher.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].recipient, "student@example.com");
        assert_eq!(sent[0].template, NotificationTemplate::EnrollmentConfirmed);
        assert_eq!(sent[0].data["amount"], "499.00");
        assert_eq!(sent[0].data["transactionId"], "T1");
    }

    #[tokio::test]
    async fn failure_marks_enrollment_failed_without_notification() {
        let h = harness(pending_enrollment());

        let result = h.handler.handle(signed_command("T1", "FAILED", "499.00")).await;

        assert!(matches!(result, Ok(ApplyPaymentWebhookResult::MarkedFailed { .. })));
        assert_eq!(h.repo.get("E1").status, EnrollmentStatus::Failed);
        assert!(h.dispatcher.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn pending_event_leaves_enrollment_pending() {
        let h = harness(pending_enrollment());

        let result = h.handler.handle(signed_command("T1", "PENDING", "499.00")).await;

        assert_eq!(
            result.unwrap(),
            ApplyPaymentWebhookResult::Acknowledged {
                enrollment_id: EnrollmentId::new("E1").unwrap(),
                reason: AckReason::StillPending,
            }
        );
        assert_eq!(h.repo.get("E1").status, EnrollmentStatus::Pending);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Idempotency Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn redelivery_is_replayed_without_second_notification() {
        let h = harness(pending_enrollment());

        for _ in 0..3 {
            h.handler.handle(signed_command("T1", "SUCCESS", "499.00")).await.unwrap();
        }

        assert_eq!(h.repo.get("E1").status, EnrollmentStatus::Active);
        assert_eq!(h.dispatcher.sent.lock().unwrap().len(), 1);
        assert_eq!(
            h.log.outcomes(),
            vec![
                DeliveryOutcome::Activated,
                DeliveryOutcome::Replayed,
                DeliveryOutcome::Replayed
            ]
        );
    }

    #[tokio::test]
    async fn failed_after_active_conflicts_and_stays_active() {
        let h = harness(decided(EnrollmentStatus::Active, "T1"));

        let result = h.handler.handle(signed_command("T1", "FAILED", "499.00")).await;

        assert!(matches!(result, Err(WebhookError::ConflictingState { .. })));
        assert_eq!(h.repo.get("E1").status, EnrollmentStatus::Active);
        assert_eq!(h.log.outcomes(), vec![DeliveryOutcome::Rejected]);
    }

    #[tokio::test]
    async fn success_with_new_transaction_is_flagged() {
        let h = harness(decided(EnrollmentStatus::Active, "T1"));

        let result = h.handler.handle(signed_command("T2", "SUCCESS", "499.00")).await;

        assert!(matches!(result, Err(WebhookError::ConflictingState { .. })));
        assert!(h.repo.get("E1").was_applied_by(&TransactionId::new("T1").unwrap()));
    }

    #[tokio::test]
    async fn amount_mismatch_is_rejected() {
        let h = harness(pending_enrollment());

        let result = h.handler.handle(signed_command("T1", "SUCCESS", "49.90")).await;

        assert!(matches!(result, Err(WebhookError::AmountMismatch { .. })));
        assert_eq!(h.repo.get("E1").status, EnrollmentStatus::Pending);
        assert!(h.dispatcher.sent.lock().unwrap().is_empty());
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Race Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn lost_race_to_same_transaction_is_replay() {
        let repo = MockEnrollmentRepository::with_enrollment(pending_enrollment())
            .losing_race_to(decided(EnrollmentStatus::Active, "T1"));
        let h = harness_with(repo, MockEventLog::default(), MockDispatcher::default());

        let result = h.handler.handle(signed_command("T1", "SUCCESS", "499.00")).await;

        assert_eq!(result.unwrap().outcome(), DeliveryOutcome::Replayed);
        assert!(h.dispatcher.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn lost_race_to_contradicting_event_conflicts() {
        let repo = MockEnrollmentRepository::with_enrollment(pending_enrollment())
            .losing_race_to(decided(EnrollmentStatus::Failed, "T1"));
        let h = harness_with(repo, MockEventLog::default(), MockDispatcher::default());

        let result = h.handler.handle(signed_command("T1", "SUCCESS", "499.00")).await;

        assert!(matches!(result, Err(WebhookError::ConflictingState { .. })));
        assert_eq!(h.repo.get("E1").status, EnrollmentStatus::Failed);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Rejection Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn invalid_signature_is_rejected_and_not_logged() {
        let h = harness(pending_enrollment());
        let mut cmd = signed_command("T1", "SUCCESS", "499.00");
        cmd.signature = Some("ab".repeat(32));

        let result = h.handler.handle(cmd).await;

        assert!(matches!(result, Err(WebhookError::InvalidSignature)));
        assert_eq!(h.repo.get("E1").status, EnrollmentStatus::Pending);
        assert!(h.log.outcomes().is_empty());
    }

    #[tokio::test]
    async fn missing_signature_is_rejected() {
        let h = harness(pending_enrollment());
        let mut cmd = signed_command("T1", "SUCCESS", "499.00");
        cmd.signature = None;

        let result = h.handler.handle(cmd).await;

        assert!(matches!(result, Err(WebhookError::MissingSignature)));
    }

    #[tokio::test]
    async fn malformed_body_is_rejected() {
        let h = harness(pending_enrollment());
        let cmd = ApplyPaymentWebhookCommand {
            payload: br#"{"orderId":"E1"}"#.to_vec(),
            signature: Some("00".to_string()),
        };

        let result = h.handler.handle(cmd).await;

        assert!(matches!(result, Err(WebhookError::MalformedPayload(_))));
    }

    #[tokio::test]
    async fn unknown_enrollment_is_not_found() {
        let h = harness_with(
            MockEnrollmentRepository::empty(),
            MockEventLog::default(),
            MockDispatcher::default(),
        );

        let result = h.handler.handle(signed_command("T1", "SUCCESS", "499.00")).await;

        assert!(matches!(result, Err(WebhookError::EnrollmentNotFound(id)) if id.as_str() == "E1"));
        assert_eq!(h.log.outcomes(), vec![DeliveryOutcome::Rejected]);
    }

    #[tokio::test]
    async fn storage_failure_is_retryable() {
        let h = harness_with(
            MockEnrollmentRepository::failing(),
            MockEventLog::default(),
            MockDispatcher::default(),
        );

        let result = h.handler.handle(signed_command("T1", "SUCCESS", "499.00")).await;

        match result {
            Err(err) => assert!(err.is_retryable()),
            Ok(other) => panic!("expected error, got {other:?}"),
        }
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Side Effect Failure Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn dispatch_failure_does_not_revert_activation() {
        let h = harness_with(
            MockEnrollmentRepository::with_enrollment(pending_enrollment()),
            MockEventLog::default(),
            MockDispatcher {
                fail: true,
                ..Default::default()
            },
        );

        let result = h.handler.handle(signed_command("T1", "SUCCESS", "499.00")).await;

        assert!(matches!(result, Ok(ApplyPaymentWebhookResult::Activated { .. })));
        assert_eq!(h.repo.get("E1").status, EnrollmentStatus::Active);
    }

    #[tokio::test]
    async fn log_failure_does_not_change_result() {
        let h = harness_with(
            MockEnrollmentRepository::with_enrollment(pending_enrollment()),
            MockEventLog {
                fail: true,
                ..Default::default()
            },
            MockDispatcher::default(),
        );

        let result = h.handler.handle(signed_command("T1", "SUCCESS", "499.00")).await;

        assert!(matches!(result, Ok(ApplyPaymentWebhookResult::Activated { .. })));
    }

    #[tokio::test]
    async fn delivery_log_is_searchable_by_transaction() {
        let h = harness(pending_enrollment());
        h.handler.handle(signed_command("T1", "SUCCESS", "499.00")).await.unwrap();

        let records = h
            .log
            .find_by_transaction_id(&TransactionId::new("T1").unwrap())
            .await
            .unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].payload["amount"], "499.00");
    }
}
