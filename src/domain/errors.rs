//! # Domain Errors
//!
//! Error types for business rule violations inside the aggregates.
//!
//! # Examples
//!
//! ```
//! use agri_contracts::domain::errors::DomainError;
//!
//! let err = DomainError::InvalidQuantity("quantity must be positive".to_string());
//! assert!(err.is_validation());
//! ```

use crate::domain::value_objects::arithmetic::ArithmeticError;
use crate::domain::value_objects::{
    ContractState, Money, OfferId, PayoutStatus, Quantity, TransactionId,
};
use thiserror::Error;

/// Error raised when a domain invariant or lifecycle rule is violated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// Quantity is zero or otherwise unusable.
    #[error("invalid quantity: {0}")]
    InvalidQuantity(String),

    /// Price or amount is not positive or has too many decimal places.
    #[error("invalid price: {0}")]
    InvalidPrice(String),

    /// Generic input validation failure.
    #[error("validation error: {0}")]
    ValidationError(String),

    /// Contract no longer accepts offers or acceptance.
    #[error("contract is not open (state: {state})")]
    NotOpen {
        /// Effective state of the contract.
        state: ContractState,
    },

    /// Offered price is above the buyer's ceiling.
    #[error("offered price {offered} exceeds ceiling {ceiling}")]
    PriceExceedsCeiling {
        /// Price in the offer.
        offered: Money,
        /// Contract maximum price.
        ceiling: Money,
    },

    /// Offered quantity is above the requested quantity.
    #[error("offered quantity {offered} exceeds requested {requested}")]
    QuantityExceedsRequested {
        /// Quantity in the offer.
        offered: Quantity,
        /// Contract quantity.
        requested: Quantity,
    },

    /// No offer with this id exists in the contract.
    #[error("offer not found: {0}")]
    OfferNotFound(OfferId),

    /// Contract already has a winning offer.
    #[error("contract already fulfilled")]
    AlreadyFulfilled,

    /// Standalone transaction was already paid out.
    #[error("transaction already paid: {0}")]
    AlreadyPaid(TransactionId),

    /// Illegal lifecycle transition for a contract.
    #[error("invalid state transition from {from} to {to}")]
    InvalidStateTransition {
        /// Current state.
        from: ContractState,
        /// Requested state.
        to: ContractState,
    },

    /// Illegal lifecycle transition for a payout.
    #[error("invalid payout transition from {from} to {to}")]
    InvalidPayoutTransition {
        /// Current status.
        from: PayoutStatus,
        /// Requested status.
        to: PayoutStatus,
    },

    /// Fixed-point arithmetic failed.
    #[error("arithmetic error: {0}")]
    Arithmetic(#[from] ArithmeticError),
}

impl DomainError {
    /// Returns true if the error stems from malformed or out-of-range input.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidQuantity(_)
                | Self::InvalidPrice(_)
                | Self::ValidationError(_)
                | Self::PriceExceedsCeiling { .. }
                | Self::QuantityExceedsRequested { .. }
                | Self::Arithmetic(_)
        )
    }

    /// Returns true if the operation is invalid for the entity's current state.
    #[must_use]
    pub fn is_state_conflict(&self) -> bool {
        matches!(
            self,
            Self::NotOpen { .. }
                | Self::AlreadyFulfilled
                | Self::AlreadyPaid(_)
                | Self::InvalidStateTransition { .. }
                | Self::InvalidPayoutTransition { .. }
        )
    }
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
