//! Enrollment repository port.
//!
//! Defines the contract for persisting enrollments and for the one mutation the
//! webhook flow performs: a conditional status transition out of `Pending`.
//!
//! # Design
//!
//! - **Conditional write**: `transition_status` only succeeds when the stored
//!   status still equals `expected`, so concurrent deliveries cannot both apply
//! - **Single statement**: status, transaction id and webhook time change together

use async_trait::async_trait;

use crate::domain::enrollment::{Enrollment, EnrollmentStatus};
use crate::domain::foundation::{DomainError, EnrollmentId, Timestamp, TransactionId};

/// Requested status change for one enrollment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusTransition {
    /// Status the enrollment must currently have.
    pub expected: EnrollmentStatus,
    /// Status to move to.
    pub target: EnrollmentStatus,
    /// Gateway transaction responsible for the change.
    pub transaction_id: TransactionId,
    /// Timestamp carried by the webhook.
    pub webhook_at: Timestamp,
}

/// Result of a conditional transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// The row matched `expected` and was updated; carries the new state.
    Applied(Enrollment),
    /// Another writer changed the status first; carries the current state.
    Stale(Enrollment),
}

/// Repository port for Enrollment persistence.
#[async_trait]
pub trait EnrollmentRepository: Send + Sync {
    /// Save a new enrollment.
    ///
    /// # Errors
    ///
    /// - `EnrollmentExists` if the id is already taken
    /// - `DatabaseError` on persistence failure
    async fn save(&self, enrollment: &Enrollment) -> Result<(), DomainError>;

    /// Find an enrollment by its ID.
    ///
    /// Returns `None` if not found.
    async fn find_by_id(&self, id: &EnrollmentId) -> Result<Option<Enrollment>, DomainError>;

    /// Atomically apply `transition` if the stored status still equals
    /// `transition.expected`.
    ///
    /// # Errors
    ///
    /// - `EnrollmentNotFound` if the enrollment doesn't exist
    /// - `DatabaseError` on persistence failure
    async fn transition_status(
        &self,
        id: &EnrollmentId,
        transition: StatusTransition,
    ) -> Result<TransitionOutcome, DomainError>;
}
