//! # Money Value Object
//!
//! Fixed-point currency amount with a two-digit minor unit.
//!
//! Amounts are stored as [`Decimal`] rescaled to [`MINOR_UNIT_SCALE`] places,
//! so `9.5` and `9.50` compare and render identically. Values with more
//! precision than the minor unit are rejected rather than silently rounded;
//! rounding only happens through [`Money::apply_rate`], under an explicit
//! [`Rounding`] policy.
//!
//! # Examples
//!
//! ```
//! use agri_contracts::domain::value_objects::{Money, Quantity};
//!
//! let price: Money = "9.50".parse().unwrap();
//! let gross = price.times(Quantity::new(80).unwrap()).unwrap();
//! assert_eq!(gross.to_string(), "760.00");
//! ```

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::value_objects::arithmetic::{
    round_to_scale, ArithmeticError, ArithmeticResult, CheckedArithmetic, Rounding,
};
use crate::domain::value_objects::fee_rate::FeeRate;
use crate::domain::value_objects::quantity::Quantity;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of decimal places in the currency minor unit (cents).
pub const MINOR_UNIT_SCALE: u32 = 2;

/// A non-negative currency amount.
///
/// # Invariants
///
/// - Never negative
/// - Exactly [`MINOR_UNIT_SCALE`] decimal places
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Money(Decimal);

impl Money {
    /// Zero amount.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Creates a validated amount.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidPrice` if the value is negative or has
    /// more decimal places than the minor unit.
    pub fn new(value: Decimal) -> DomainResult<Self> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(DomainError::InvalidPrice(
                "amount must not be negative".to_string(),
            ));
        }
        if value.normalize().scale() > MINOR_UNIT_SCALE {
            return Err(DomainError::InvalidPrice(format!(
                "amount {value} has more than {MINOR_UNIT_SCALE} decimal places"
            )));
        }
        let mut amount = value;
        amount.rescale(MINOR_UNIT_SCALE);
        Ok(Self(amount))
    }

    /// Creates an amount from minor units (cents).
    #[must_use]
    pub fn from_minor(minor: u64) -> Self {
        Self(Decimal::from_i128_with_scale(
            i128::from(minor),
            MINOR_UNIT_SCALE,
        ))
    }

    /// Returns the underlying decimal value.
    #[inline]
    #[must_use]
    pub fn amount(&self) -> Decimal {
        self.0
    }

    /// Returns true if the amount is strictly greater than zero.
    #[inline]
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Returns true if the amount is zero.
    #[inline]
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns the amount in minor units, as payment processors expect.
    ///
    /// # Errors
    ///
    /// Returns `ArithmeticError::Overflow` if the value does not fit in `u64`.
    pub fn to_minor_units(&self) -> ArithmeticResult<u64> {
        self.0
            .safe_mul(Decimal::ONE_HUNDRED)?
            .to_u64()
            .ok_or(ArithmeticError::Overflow)
    }

    /// Multiplies a unit price by a quantity.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Arithmetic` on overflow.
    pub fn times(&self, quantity: Quantity) -> DomainResult<Self> {
        let product = self.0.safe_mul(Decimal::from(quantity.get()))?;
        Self::new(product)
    }

    /// Adds `rhs`.
    ///
    /// # Errors
    ///
    /// Returns `ArithmeticError::Overflow` if the sum overflows.
    pub fn safe_add(&self, rhs: Self) -> ArithmeticResult<Self> {
        Ok(Self(self.0.safe_add(rhs.0)?))
    }

    /// Subtracts `rhs`, refusing to go below zero.
    ///
    /// # Errors
    ///
    /// Returns `ArithmeticError::Underflow` if `rhs` is larger than `self`.
    pub fn safe_sub(&self, rhs: Self) -> ArithmeticResult<Self> {
        let difference = self.0.safe_sub(rhs.0)?;
        if difference.is_sign_negative() && !difference.is_zero() {
            return Err(ArithmeticError::Underflow);
        }
        Ok(Self(round_to_scale(difference, MINOR_UNIT_SCALE, Rounding::Down)))
    }

    /// Applies a rate (e.g. a platform fee) and rounds to the minor unit.
    ///
    /// # Errors
    ///
    /// Returns `ArithmeticError::Overflow` if the product overflows.
    pub fn apply_rate(&self, rate: FeeRate, rounding: Rounding) -> ArithmeticResult<Self> {
        let raw = self.0.safe_mul(rate.as_decimal())?;
        Ok(Self(round_to_scale(raw, MINOR_UNIT_SCALE, rounding)))
    }
}

impl TryFrom<Decimal> for Money {
    type Error = DomainError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Money> for Decimal {
    fn from(money: Money) -> Self {
        money.0
    }
}

impl FromStr for Money {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = Decimal::from_str(s.trim())
            .map_err(|e| DomainError::InvalidPrice(format!("cannot parse '{s}': {e}")))?;
        Self::new(value)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    mod construction {
        use super::*;

        #[test]
        fn rescales_to_minor_unit() {
            let money = Money::new(Decimal::new(95, 1)).unwrap();
            assert_eq!(money.to_string(), "9.50");
            assert_eq!(money, Money::from_minor(950));
        }

        #[test]
        fn rejects_sub_cent_precision() {
            let result = Money::new(Decimal::new(9505, 3));
            assert!(matches!(result, Err(DomainError::InvalidPrice(_))));
        }

        #[test]
        fn accepts_trailing_zeros_beyond_scale() {
            let money = Money::new(Decimal::new(95000, 4)).unwrap();
            assert_eq!(money, Money::from_minor(950));
        }

        #[test]
        fn rejects_negative() {
            let result = Money::new(Decimal::new(-1, 0));
            assert!(matches!(result, Err(DomainError::InvalidPrice(_))));
        }

        #[test]
        fn parses_from_str() {
            let money: Money = " 10.00 ".parse().unwrap();
            assert_eq!(money, Money::from_minor(1000));
            assert!("ten".parse::<Money>().is_err());
        }

        #[test]
        fn zero_is_not_positive() {
            assert!(!Money::ZERO.is_positive());
            assert!(Money::ZERO.is_zero());
            assert!(Money::from_minor(1).is_positive());
        }
    }

    mod arithmetic {
        use super::*;

        #[test]
        fn times_quantity() {
            let gross = Money::from_minor(950)
                .times(Quantity::new(80).unwrap())
                .unwrap();
            assert_eq!(gross, Money::from_minor(76_000));
        }

        #[test]
        fn safe_sub_refuses_negative() {
            let result = Money::from_minor(100).safe_sub(Money::from_minor(101));
            assert_eq!(result, Err(ArithmeticError::Underflow));
        }

        #[test]
        fn apply_rate_rounds_half_up() {
            let fee = Money::from_minor(3333)
                .apply_rate(FeeRate::new(Decimal::new(5, 2)).unwrap(), Rounding::HalfUp)
                .unwrap();
            assert_eq!(fee, Money::from_minor(167));
        }

        #[test]
        fn to_minor_units() {
            assert_eq!(Money::from_minor(72_200).to_minor_units().unwrap(), 72_200);
        }
    }

    mod serde {
        use super::*;

        #[test]
        fn roundtrip_preserves_value() {
            let money = Money::from_minor(76_000);
            let json = serde_json::to_string(&money).unwrap();
            let back: Money = serde_json::from_str(&json).unwrap();
            assert_eq!(money, back);
        }

        #[test]
        fn deserialize_validates() {
            let result: Result<Money, _> = serde_json::from_str("\"-5.00\"");
            assert!(result.is_err());
        }
    }
}
