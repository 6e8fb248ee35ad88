//! PostgreSQL implementation of EnrollmentRepository.
//!
//! Status transitions are a single `UPDATE ... WHERE status = $expected
//! RETURNING`, so two concurrent webhooks for the same enrollment can never
//! both move it out of `pending`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::domain::enrollment::{Amount, Enrollment, EnrollmentStatus};
use crate::domain::foundation::{
    CourseId, DomainError, EnrollmentId, ErrorCode, Timestamp, TransactionId, UserId,
};
use crate::ports::{EnrollmentRepository, StatusTransition, TransitionOutcome};

const ENROLLMENT_COLUMNS: &str = "id, user_id, course_id, recipient_email, amount, status, \
     transaction_id, last_webhook_at, created_at, updated_at";

/// PostgreSQL implementation of the EnrollmentRepository port.
pub struct PostgresEnrollmentRepository {
    pool: PgPool,
}

impl PostgresEnrollmentRepository {
    /// Creates a new PostgresEnrollmentRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of an enrollment.
#[derive(Debug, sqlx::FromRow)]
struct EnrollmentRow {
    id: String,
    user_id: String,
    course_id: String,
    recipient_email: String,
    amount: Decimal,
    status: String,
    transaction_id: Option<String>,
    last_webhook_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<EnrollmentRow> for Enrollment {
    type Error = DomainError;

    fn try_from(row: EnrollmentRow) -> Result<Self, Self::Error> {
        let corrupt = |field: &str, e: &dyn std::fmt::Display| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Invalid {} in enrollments row: {}", field, e),
            )
        };

        Ok(Enrollment {
            id: EnrollmentId::new(row.id).map_err(|e| corrupt("id", &e))?,
            user_id: UserId::new(row.user_id).map_err(|e| corrupt("user_id", &e))?,
            course_id: CourseId::new(row.course_id).map_err(|e| corrupt("course_id", &e))?,
            recipient_email: row.recipient_email,
            amount: Amount::new(row.amount).map_err(|e| corrupt("amount", &e))?,
            status: row
                .status
                .parse::<EnrollmentStatus>()
                .map_err(|e| corrupt("status", &e))?,
            transaction_id: row
                .transaction_id
                .map(TransactionId::new)
                .transpose()
                .map_err(|e| corrupt("transaction_id", &e))?,
            last_webhook_at: row.last_webhook_at.map(Timestamp::from_datetime),
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

fn db_error(action: &str, e: sqlx::Error) -> DomainError {
    DomainError::new(
        ErrorCode::DatabaseError,
        format!("Failed to {} enrollment: {}", action, e),
    )
}

#[async_trait]
impl EnrollmentRepository for PostgresEnrollmentRepository {
    async fn save(&self, enrollment: &Enrollment) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO enrollments (
                id, user_id, course_id, recipient_email, amount, status,
                transaction_id, last_webhook_at, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(enrollment.id.as_str())
        .bind(enrollment.user_id.as_str())
        .bind(enrollment.course_id.as_str())
        .bind(&enrollment.recipient_email)
        .bind(enrollment.amount.as_decimal())
        .bind(enrollment.status.as_str())
        .bind(enrollment.transaction_id.as_ref().map(|t| t.as_str()))
        .bind(enrollment.last_webhook_at.map(|t| *t.as_datetime()))
        .bind(enrollment.created_at.as_datetime())
        .bind(enrollment.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.constraint() == Some("enrollments_pkey") {
                    return DomainError::new(
                        ErrorCode::EnrollmentExists,
                        "Enrollment already exists",
                    )
                    .with_detail("enrollment_id", enrollment.id.as_str());
                }
            }
            db_error("save", e)
        })?;

        Ok(())
    }

    async fn find_by_id(&self, id: &EnrollmentId) -> Result<Option<Enrollment>, DomainError> {
        let row: Option<EnrollmentRow> = sqlx::query_as(&format!(
            "SELECT {} FROM enrollments WHERE id = $1",
            ENROLLMENT_COLUMNS
        ))
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("find", e))?;

        row.map(Enrollment::try_from).transpose()
    }

    async fn transition_status(
        &self,
        id: &EnrollmentId,
        transition: StatusTransition,
    ) -> Result<TransitionOutcome, DomainError> {
        let updated: Option<EnrollmentRow> = sqlx::query_as(&format!(
            r#"
            UPDATE enrollments SET
                status = $3,
                transaction_id = $4,
                last_webhook_at = $5,
                updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING {}
            "#,
            ENROLLMENT_COLUMNS
        ))
        .bind(id.as_str())
        .bind(transition.expected.as_str())
        .bind(transition.target.as_str())
        .bind(transition.transaction_id.as_str())
        .bind(transition.webhook_at.as_datetime())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("transition", e))?;

        if let Some(row) = updated {
            return Ok(TransitionOutcome::Applied(Enrollment::try_from(row)?));
        }

        match self.find_by_id(id).await? {
            Some(current) => Ok(TransitionOutcome::Stale(current)),
            None => Err(DomainError::new(
                ErrorCode::EnrollmentNotFound,
                "Enrollment not found",
            )
            .with_detail("enrollment_id", id.as_str())),
        }
    }
}
