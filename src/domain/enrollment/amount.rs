//! Fixed-point payment amount.
//!
//! Amounts are signed as part of the webhook HMAC, so they must have exactly
//! one textual form. `Amount` always carries two decimal places and renders
//! as e.g. `499.00`, whatever JSON number spelling the gateway used.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::ValidationError;

/// Number of fractional digits carried by every amount.
const SCALE: u32 = 2;

/// Largest amount that fits the `NUMERIC(12,2)` column.
const MAX_MINOR_UNITS: i64 = 9_999_999_999_99;

/// Non-negative monetary amount with two decimal places.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    /// Creates an amount, rejecting negatives, values with more than two
    /// fractional digits, and values beyond the storable range.
    pub fn new(value: Decimal) -> Result<Self, ValidationError> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(ValidationError::invalid_format(
                "amount",
                "must not be negative",
            ));
        }

        let normalized = value.normalize();
        if normalized.scale() > SCALE {
            return Err(ValidationError::invalid_format(
                "amount",
                "must have at most two decimal places",
            ));
        }
        if normalized > Decimal::new(MAX_MINOR_UNITS, SCALE) {
            return Err(ValidationError::invalid_format("amount", "exceeds maximum"));
        }

        let mut scaled = normalized;
        scaled.rescale(SCALE);
        Ok(Self(scaled))
    }

    /// Converts a JSON number into an amount.
    ///
    /// Floats are read through their shortest decimal spelling (`19.99`, not
    /// the binary expansion), so `499`, `499.0` and `499.00` all yield `499.00`.
    pub fn from_json_number(number: &serde_json::Number) -> Result<Self, ValidationError> {
        let value = if let Some(i) = number.as_i64() {
            Decimal::from(i)
        } else if let Some(u) = number.as_u64() {
            Decimal::from(u)
        } else {
            let text = number.to_string();
            Decimal::from_str(&text)
                .or_else(|_| Decimal::from_scientific(&text))
                .map_err(|_| {
                    ValidationError::invalid_format("amount", format!("unreadable number {}", text))
                })?
        };
        Self::new(value)
    }

    /// Returns the canonical two-decimal rendering used for signing.
    pub fn canonical(&self) -> String {
        format!("{:.2}", self.0)
    }

    /// Returns the underlying decimal.
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}

impl FromStr for Amount {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = Decimal::from_str(s.trim())
            .map_err(|_| ValidationError::invalid_format("amount", format!("'{}' is not a number", s)))?;
        Self::new(value)
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = ValidationError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}
