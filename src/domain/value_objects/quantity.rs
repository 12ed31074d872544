//! # Quantity Value Object
//!
//! Positive whole number of product units.

use crate::domain::errors::{DomainError, DomainResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of units requested or offered. Always at least one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct Quantity(u64);

impl Quantity {
    /// Creates a validated quantity.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidQuantity` if `units` is zero.
    pub fn new(units: u64) -> DomainResult<Self> {
        if units == 0 {
            return Err(DomainError::InvalidQuantity(
                "quantity must be positive".to_string(),
            ));
        }
        Ok(Self(units))
    }

    /// Returns the number of units.
    #[inline]
    #[must_use]
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl TryFrom<u64> for Quantity {
    type Error = DomainError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Quantity> for u64 {
    fn from(quantity: Quantity) -> Self {
        quantity.0
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
