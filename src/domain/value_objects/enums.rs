//! # Domain Enums
//!
//! Enumeration types for marketplace concepts.
//!
//! - [`OfferState`] - Lifecycle of a fulfillment offer
//! - [`PayoutStatus`] - Lifecycle of a payout record
//! - [`PartyRole`] - Buyer or farmer
//! - [`TransactionPayoutStatus`] - Payout progress of a standalone sale
//!
//! All enums implement `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`,
//! `Display`, `FromStr`, and Serde traits.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// State of an offer within its contract.
///
/// # Examples
///
/// ```
/// use agri_contracts::domain::value_objects::OfferState;
///
/// assert!(OfferState::Pending.is_pending());
/// assert_eq!(OfferState::Accepted.to_string(), "ACCEPTED");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OfferState {
    /// Awaiting the buyer's decision.
    #[default]
    Pending,
    /// Selected as the winning offer.
    Accepted,
    /// Lost to a sibling offer.
    Rejected,
}

impl OfferState {
    /// Returns true if the offer is still awaiting a decision.
    #[inline]
    #[must_use]
    pub const fn is_pending(self) -> bool {
        matches!(self, Self::Pending)
    }
}

impl fmt::Display for OfferState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Accepted => write!(f, "ACCEPTED"),
            Self::Rejected => write!(f, "REJECTED"),
        }
    }
}

impl FromStr for OfferState {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "PENDING" => Ok(Self::Pending),
            "ACCEPTED" => Ok(Self::Accepted),
            "REJECTED" => Ok(Self::Rejected),
            _ => Err(ParseEnumError::InvalidValue("OfferState", s.to_string())),
        }
    }
}

/// Status of a payout record.
///
/// ```text
/// Pending → Completed
///    ↓         ↑
///  Failed ─────┘ (explicit retry with the same idempotency key)
///    ↓
///   Void  (refused by the processor, superseded by a new reservation)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PayoutStatus {
    /// Reserved, issuance not yet confirmed.
    #[default]
    Pending,
    /// Issued by the payment processor.
    Completed,
    /// Issuance failed; may be retried.
    Failed,
    /// Never issued and closed; no longer counts against its source.
    Void,
}

impl PayoutStatus {
    /// Returns true if the payout was issued.
    #[inline]
    #[must_use]
    pub const fn is_completed(self) -> bool {
        matches!(self, Self::Completed)
    }

    /// Returns true if the payout was closed without being issued.
    #[inline]
    #[must_use]
    pub const fn is_void(self) -> bool {
        matches!(self, Self::Void)
    }

    /// Returns true if this status can transition to `target`.
    #[must_use]
    pub const fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Pending, Self::Completed)
                | (Self::Pending, Self::Failed)
                | (Self::Failed, Self::Completed)
                | (Self::Failed, Self::Failed)
                | (Self::Failed, Self::Void)
        )
    }
}

impl fmt::Display for PayoutStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Completed => write!(f, "COMPLETED"),
            Self::Failed => write!(f, "FAILED"),
            Self::Void => write!(f, "VOID"),
        }
    }
}

impl FromStr for PayoutStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "PENDING" => Ok(Self::Pending),
            "COMPLETED" => Ok(Self::Completed),
            "FAILED" => Ok(Self::Failed),
            "VOID" => Ok(Self::Void),
            _ => Err(ParseEnumError::InvalidValue("PayoutStatus", s.to_string())),
        }
    }
}

/// Role of an authenticated party.
///
/// Parsed from the lowercase tags `"buyer"` and `"farmer"` supplied by the
/// identity layer; parsing is case-insensitive.
///
/// ```
/// use agri_contracts::domain::value_objects::PartyRole;
///
/// assert_eq!("Farmer".parse::<PartyRole>().unwrap(), PartyRole::Farmer);
/// assert!("admin".parse::<PartyRole>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartyRole {
    /// Posts contracts and accepts offers.
    Buyer,
    /// Receives contract notifications and submits offers.
    Farmer,
}

impl fmt::Display for PartyRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buyer => write!(f, "buyer"),
            Self::Farmer => write!(f, "farmer"),
        }
    }
}

impl FromStr for PartyRole {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "buyer" => Ok(Self::Buyer),
            "farmer" => Ok(Self::Farmer),
            _ => Err(ParseEnumError::InvalidValue("PartyRole", s.to_string())),
        }
    }
}

/// Payout progress of a standalone sale transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionPayoutStatus {
    /// Seller has not been paid yet.
    #[default]
    Pending,
    /// Seller was paid.
    Completed,
}

impl fmt::Display for TransactionPayoutStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Completed => write!(f, "COMPLETED"),
        }
    }
}

impl FromStr for TransactionPayoutStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "PENDING" => Ok(Self::Pending),
            "COMPLETED" => Ok(Self::Completed),
            _ => Err(ParseEnumError::InvalidValue(
                "TransactionPayoutStatus",
                s.to_string(),
            )),
        }
    }
}

/// Error returned when parsing an enum from a string fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseEnumError {
    /// The provided string value is not valid for the enum.
    InvalidValue(&'static str, String),
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidValue(enum_name, value) => {
                write!(f, "invalid {enum_name} value: '{value}'")
            }
        }
    }
}

impl std::error::Error for ParseEnumError {}
