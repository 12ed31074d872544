//! # Checked Arithmetic
//!
//! Traits and utilities for safe fixed-point arithmetic.
//!
//! This module provides:
//! - [`ArithmeticError`] - Error type for arithmetic failures
//! - [`CheckedArithmetic`] - Trait for safe arithmetic operations
//! - [`Rounding`] - Rounding policy applied when reducing scale
//! - [`round_to_scale`] - Rounds a decimal to a fixed number of places
//!
//! # Examples
//!
//! ```
//! use agri_contracts::domain::value_objects::arithmetic::{round_to_scale, Rounding};
//! use rust_decimal::Decimal;
//!
//! // 1.6665 rounds half-up to 1.67
//! let fee = round_to_scale(Decimal::new(16665, 4), 2, Rounding::HalfUp);
//! assert_eq!(fee, Decimal::new(167, 2));
//! ```

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error type for arithmetic operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum ArithmeticError {
    /// Arithmetic operation resulted in overflow.
    #[error("arithmetic overflow")]
    Overflow,

    /// Arithmetic operation resulted in underflow.
    #[error("arithmetic underflow")]
    Underflow,
}

/// Result type for arithmetic operations.
pub type ArithmeticResult<T> = Result<T, ArithmeticError>;

/// Rounding policy used when an amount is reduced to the currency minor unit.
///
/// Only non-negative amounts flow through settlement, so `HalfUp` is
/// implemented as midpoint-away-from-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rounding {
    /// Truncate towards zero.
    Down,
    /// Round away from zero whenever a remainder exists.
    Up,
    /// Round to nearest, ties away from zero.
    #[default]
    HalfUp,
}

impl Rounding {
    fn strategy(self) -> RoundingStrategy {
        match self {
            Self::Down => RoundingStrategy::ToZero,
            Self::Up => RoundingStrategy::AwayFromZero,
            Self::HalfUp => RoundingStrategy::MidpointAwayFromZero,
        }
    }
}

impl fmt::Display for Rounding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Down => write!(f, "Down"),
            Self::Up => write!(f, "Up"),
            Self::HalfUp => write!(f, "HalfUp"),
        }
    }
}

/// Rounds `value` to `scale` decimal places under the given policy.
///
/// The result always carries exactly `scale` decimal places, so `5` rounded
/// to two places renders as `5.00`.
#[inline]
#[must_use]
pub fn round_to_scale(value: Decimal, scale: u32, rounding: Rounding) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(scale, rounding.strategy());
    rounded.rescale(scale);
    rounded
}

/// Trait for checked arithmetic operations.
///
/// Provides safe arithmetic methods that return `Result` instead of
/// panicking on overflow or underflow.
pub trait CheckedArithmetic: Sized {
    /// Safely add two values.
    ///
    /// # Errors
    ///
    /// Returns `ArithmeticError::Overflow` if the result would overflow.
    fn safe_add(self, rhs: Self) -> ArithmeticResult<Self>;

    /// Safely subtract two values.
    ///
    /// # Errors
    ///
    /// Returns `ArithmeticError::Underflow` if the result would underflow.
    fn safe_sub(self, rhs: Self) -> ArithmeticResult<Self>;

    /// Safely multiply two values.
    ///
    /// # Errors
    ///
    /// Returns `ArithmeticError::Overflow` if the result would overflow.
    fn safe_mul(self, rhs: Self) -> ArithmeticResult<Self>;
}

impl CheckedArithmetic for Decimal {
    #[inline]
    fn safe_add(self, rhs: Self) -> ArithmeticResult<Self> {
        self.checked_add(rhs).ok_or(ArithmeticError::Overflow)
    }

    #[inline]
    fn safe_sub(self, rhs: Self) -> ArithmeticResult<Self> {
        self.checked_sub(rhs).ok_or(ArithmeticError::Underflow)
    }

    #[inline]
    fn safe_mul(self, rhs: Self) -> ArithmeticResult<Self> {
        self.checked_mul(rhs).ok_or(ArithmeticError::Overflow)
    }
}
