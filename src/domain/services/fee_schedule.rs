//! # Fee Schedule
//!
//! Splits a gross settlement amount into the platform fee and the net amount
//! paid to the seller.
//!
//! ```text
//! gross = quantity × unit price
//! fee   = round(gross × rate, cents, rounding)
//! net   = gross − fee
//! ```
//!
//! # Examples
//!
//! ```
//! use agri_contracts::domain::services::FeeSchedule;
//! use agri_contracts::domain::value_objects::Money;
//!
//! let split = FeeSchedule::default()
//!     .split("760.00".parse::<Money>().unwrap())
//!     .unwrap();
//! assert_eq!(split.fee.to_string(), "38.00");
//! assert_eq!(split.net.to_string(), "722.00");
//! ```

use crate::domain::errors::DomainResult;
use crate::domain::value_objects::{FeeRate, Money, Quantity, Rounding};
use serde::{Deserialize, Serialize};

/// Fee rate plus the rounding policy applied to the fee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FeeSchedule {
    rate: FeeRate,
    rounding: Rounding,
}

/// Result of splitting a gross amount.
///
/// `net == gross - fee` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutSplit {
    /// Amount owed by the buyer.
    pub gross: Money,
    /// Platform fee retained.
    pub fee: Money,
    /// Amount paid to the seller.
    pub net: Money,
}

impl FeeSchedule {
    /// Creates a schedule.
    #[must_use]
    pub const fn new(rate: FeeRate, rounding: Rounding) -> Self {
        Self { rate, rounding }
    }

    /// Returns the fee rate.
    #[inline]
    #[must_use]
    pub fn rate(&self) -> FeeRate {
        self.rate
    }

    /// Returns the rounding policy.
    #[inline]
    #[must_use]
    pub fn rounding(&self) -> Rounding {
        self.rounding
    }

    /// Splits `gross` into fee and net.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Arithmetic` on overflow.
    pub fn split(&self, gross: Money) -> DomainResult<PayoutSplit> {
        let fee = gross.apply_rate(self.rate, self.rounding)?;
        let net = gross.safe_sub(fee)?;
        Ok(PayoutSplit { gross, fee, net })
    }

    /// Computes `quantity × unit_price` and splits it.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Arithmetic` on overflow.
    pub fn split_order(&self, quantity: Quantity, unit_price: Money) -> DomainResult<PayoutSplit> {
        self.split(unit_price.times(quantity)?)
    }
}
