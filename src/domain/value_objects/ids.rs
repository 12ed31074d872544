//! # Identifiers
//!
//! Strongly-typed identifiers for marketplace entities.
//!
//! - UUID-based: [`ContractId`], [`OfferId`], [`PayoutId`], [`TransactionId`], [`EventId`]
//! - String-based: [`PartyId`] (issued by the identity collaborator) and
//!   [`ExternalPayoutId`] (issued by the payment processor)
//!
//! # Examples
//!
//! ```
//! use agri_contracts::domain::value_objects::{ContractId, PartyId};
//!
//! let contract = ContractId::new_v4();
//! let buyer = PartyId::new("buyer-1");
//! assert_ne!(contract, ContractId::new_v4());
//! assert_eq!(buyer.as_str(), "buyer-1");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generates a new random identifier.
            #[must_use]
            pub fn new_v4() -> Self {
                Self(Uuid::new_v4())
            }

            /// Returns the inner UUID.
            #[inline]
            #[must_use]
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

uuid_id!(
    /// Identifier of an open contract.
    ContractId
);
uuid_id!(
    /// Identifier of an offer, unique within its contract.
    OfferId
);
uuid_id!(
    /// Identifier of a payout record.
    PayoutId
);
uuid_id!(
    /// Identifier of a standalone sale transaction.
    TransactionId
);
uuid_id!(
    /// Identifier of a domain event.
    EventId
);

/// Identity of a buyer or farmer, as supplied by the identity collaborator.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartyId(String);

impl PartyId {
    /// Creates a party identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PartyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PartyId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Identifier assigned to a payout by the payment processor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExternalPayoutId(String);

impl ExternalPayoutId {
    /// Wraps a processor-issued identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExternalPayoutId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
