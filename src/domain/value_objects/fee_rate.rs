//! # Fee Rate
//!
//! Platform fee expressed as a fraction of the gross amount.

use crate::domain::errors::{DomainError, DomainResult};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Platform fee rate in `[0, 1)`.
///
/// Defaults to 5%.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct FeeRate(Decimal);

impl FeeRate {
    /// Creates a validated fee rate.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::ValidationError` if the rate is negative or not
    /// below one.
    pub fn new(rate: Decimal) -> DomainResult<Self> {
        if rate.is_sign_negative() && !rate.is_zero() {
            return Err(DomainError::ValidationError(format!(
                "fee rate {rate} must not be negative"
            )));
        }
        if rate >= Decimal::ONE {
            return Err(DomainError::ValidationError(format!(
                "fee rate {rate} must be below 1"
            )));
        }
        Ok(Self(rate))
    }

    /// Returns the rate as a decimal fraction.
    #[inline]
    #[must_use]
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }
}

impl Default for FeeRate {
    fn default() -> Self {
        Self(Decimal::new(5, 2))
    }
}

impl TryFrom<Decimal> for FeeRate {
    type Error = DomainError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<FeeRate> for Decimal {
    fn from(rate: FeeRate) -> Self {
        rate.0
    }
}

impl fmt::Display for FeeRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0 * Decimal::ONE_HUNDRED)
    }
}
