//! In-memory EnrollmentRepository for tests and local runs.
//!
//! The conditional transition holds the write lock across the status check and
//! the update, which gives the same single-winner behaviour as the PostgreSQL
//! `UPDATE ... WHERE status = $expected`.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::enrollment::Enrollment;
use crate::domain::foundation::{DomainError, EnrollmentId, ErrorCode};
use crate::ports::{EnrollmentRepository, StatusTransition, TransitionOutcome};

/// Enrollment store backed by a `HashMap`.
#[derive(Default)]
pub struct InMemoryEnrollmentRepository {
    enrollments: RwLock<HashMap<EnrollmentId, Enrollment>>,
}

impl InMemoryEnrollmentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored enrollments.
    pub async fn len(&self) -> usize {
        self.enrollments.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.enrollments.read().await.is_empty()
    }
}

#[async_trait]
impl EnrollmentRepository for InMemoryEnrollmentRepository {
    async fn save(&self, enrollment: &Enrollment) -> Result<(), DomainError> {
        let mut enrollments = self.enrollments.write().await;
        if enrollments.contains_key(&enrollment.id) {
            return Err(
                DomainError::new(ErrorCode::EnrollmentExists, "Enrollment already exists")
                    .with_detail("enrollment_id", enrollment.id.as_str()),
            );
        }
        enrollments.insert(enrollment.id.clone(), enrollment.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &EnrollmentId) -> Result<Option<Enrollment>, DomainError> {
        Ok(self.enrollments.read().await.get(id).cloned())
    }

    async fn transition_status(
        &self,
        id: &EnrollmentId,
        transition: StatusTransition,
    ) -> Result<TransitionOutcome, DomainError> {
        let mut enrollments = self.enrollments.write().await;
        let stored = enrollments.get_mut(id).ok_or_else(|| {
            DomainError::new(ErrorCode::EnrollmentNotFound, "Enrollment not found")
                .with_detail("enrollment_id", id.as_str())
        })?;

        if stored.status != transition.expected {
            return Ok(TransitionOutcome::Stale(stored.clone()));
        }

        stored
            .apply_payment(
                transition.target,
                transition.transaction_id,
                transition.webhook_at,
            )
            .map_err(|e| DomainError::new(ErrorCode::InvalidStateTransition, e.to_string()))?;

        Ok(TransitionOutcome::Applied(stored.clone()))
    }
}
