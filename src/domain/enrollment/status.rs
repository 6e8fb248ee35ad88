//! Enrollment payment status state machine.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{StateMachine, ValidationError};

/// Payment lifecycle status of an enrollment.
///
/// `Pending` is the only non-terminal state: a paid checkout starts there and
/// the first decisive webhook moves it to `Active` or `Failed` for good.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentStatus {
    /// Checkout started, awaiting the gateway's verdict. No access.
    Pending,

    /// Payment captured. The student has access to the course.
    Active,

    /// Payment declined or abandoned. No access.
    Failed,
}

impl EnrollmentStatus {
    /// Returns the persisted representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            EnrollmentStatus::Pending => "pending",
            EnrollmentStatus::Active => "active",
            EnrollmentStatus::Failed => "failed",
        }
    }
}

impl StateMachine for EnrollmentStatus {
    fn valid_transitions(&self) -> Vec<Self> {
        use EnrollmentStatus::*;
        match self {
            Pending => vec![Active, Failed],
            Active => vec![],
            Failed => vec![],
        }
    }
}

impl fmt::Display for EnrollmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EnrollmentStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(EnrollmentStatus::Pending),
            "active" => Ok(EnrollmentStatus::Active),
            "failed" => Ok(EnrollmentStatus::Failed),
            other => Err(ValidationError::invalid_format(
                "status",
                format!("unknown enrollment status '{}'", other),
            )),
        }
    }
}
