//! # Offer Entity
//!
//! A farmer's proposal to fulfill an open contract.
//!
//! Offers are owned by their [`Contract`](crate::domain::entities::Contract)
//! and are only mutated through the contract's transition methods.

use crate::domain::value_objects::{Money, OfferId, OfferState, PartyId, Quantity, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A fulfillment offer embedded in a contract.
///
/// # Invariants
///
/// - `quantity` ≤ contract quantity and `price` ≤ contract ceiling, checked
///   once at submission
/// - State moves only Pending → Accepted or Pending → Rejected
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offer {
    id: OfferId,
    farmer: PartyId,
    quantity: Quantity,
    price: Money,
    state: OfferState,
    submitted_at: Timestamp,
}

impl Offer {
    pub(crate) fn pending(
        farmer: PartyId,
        quantity: Quantity,
        price: Money,
        submitted_at: Timestamp,
    ) -> Self {
        Self {
            id: OfferId::new_v4(),
            farmer,
            quantity,
            price,
            state: OfferState::Pending,
            submitted_at,
        }
    }

    /// Reconstructs an offer from storage.
    #[must_use]
    pub fn from_parts(
        id: OfferId,
        farmer: PartyId,
        quantity: Quantity,
        price: Money,
        state: OfferState,
        submitted_at: Timestamp,
    ) -> Self {
        Self {
            id,
            farmer,
            quantity,
            price,
            state,
            submitted_at,
        }
    }

    /// Returns the offer ID.
    #[inline]
    #[must_use]
    pub fn id(&self) -> OfferId {
        self.id
    }

    /// Returns the offering farmer.
    #[inline]
    #[must_use]
    pub fn farmer(&self) -> &PartyId {
        &self.farmer
    }

    /// Returns the offered quantity.
    #[inline]
    #[must_use]
    pub fn quantity(&self) -> Quantity {
        self.quantity
    }

    /// Returns the offered unit price.
    #[inline]
    #[must_use]
    pub fn price(&self) -> Money {
        self.price
    }

    /// Returns the offer state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> OfferState {
        self.state
    }

    /// Returns when the offer was submitted.
    #[inline]
    #[must_use]
    pub fn submitted_at(&self) -> Timestamp {
        self.submitted_at
    }

    pub(crate) fn accept(&mut self) {
        self.state = OfferState::Accepted;
    }

    pub(crate) fn reject(&mut self) {
        if self.state.is_pending() {
            self.state = OfferState::Rejected;
        }
    }
}

impl fmt::Display for Offer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Offer({} by {}: {} @ {} [{}])",
            self.id, self.farmer, self.quantity, self.price, self.state
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample() -> Offer {
        Offer::pending(
            PartyId::new("farmer-a"),
            Quantity::new(80).unwrap(),
            Money::from_minor(950),
            Timestamp::from_secs(1_000).unwrap(),
        )
    }

    #[test]
    fn starts_pending() {
        assert_eq!(sample().state(), OfferState::Pending);
    }

    #[test]
    fn reject_leaves_accepted_untouched() {
        let mut offer = sample();
        offer.accept();
        offer.reject();
        assert_eq!(offer.state(), OfferState::Accepted);
    }

    #[test]
    fn display_contains_terms() {
        let text = sample().to_string();
        assert!(text.contains("farmer-a"));
        assert!(text.contains("80 @ 9.50"));
    }
}
