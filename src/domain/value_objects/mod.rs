//! # Value Objects
//!
//! Immutable types with validation and domain semantics.
//!
//! ## Identity Types
//!
//! - [`ContractId`], [`OfferId`], [`PayoutId`], [`TransactionId`]: UUID-based identifiers
//! - [`PartyId`]: String-based identity of a buyer or farmer
//! - [`EventId`]: Domain event identifier
//!
//! ## Numeric Types
//!
//! - [`Money`]: Non-negative fixed-point amount at cent precision
//! - [`Quantity`]: Positive whole number of units
//! - [`FeeRate`]: Platform fee fraction
//!
//! ## Arithmetic
//!
//! - [`ArithmeticError`]: Error type for arithmetic failures
//! - [`CheckedArithmetic`]: Trait for safe arithmetic operations
//! - [`Rounding`]: Explicit rounding policy
//!
//! ## Lifecycle Enums
//!
//! - [`ContractState`]: Contract state machine
//! - [`OfferState`], [`PayoutStatus`], [`TransactionPayoutStatus`]
//! - [`PartyRole`]: Buyer or farmer

pub mod arithmetic;
pub mod contract_state;
pub mod enums;
pub mod fee_rate;
pub mod ids;
pub mod money;
pub mod notification;
pub mod quantity;
pub mod timestamp;

pub use arithmetic::{ArithmeticError, ArithmeticResult, CheckedArithmetic, Rounding};
pub use contract_state::ContractState;
pub use enums::{OfferState, ParseEnumError, PartyRole, PayoutStatus, TransactionPayoutStatus};
pub use fee_rate::FeeRate;
pub use ids::{
    ContractId, EventId, ExternalPayoutId, OfferId, PartyId, PayoutId, TransactionId,
};
pub use money::{Money, MINOR_UNIT_SCALE};
pub use notification::{Notification, NotificationCategory};
pub use quantity::Quantity;
pub use timestamp::Timestamp;
