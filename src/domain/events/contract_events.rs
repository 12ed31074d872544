//! # Contract Events
//!
//! Events emitted by the contract ledger.
//!
//! # Event Flow
//!
//! ```text
//! ContractCreated -> FarmersMatched* -> OfferSubmitted* -> OfferAccepted
//!
//! Before acceptance: ContractCancelled | ContractExpired
//! ```

use crate::domain::entities::{Contract, Offer};
use crate::domain::events::domain_event::{EventMetadata, EventType, impl_domain_event};
use crate::domain::value_objects::{Money, OfferId, PartyId, Quantity, Timestamp};
use serde::{Deserialize, Serialize};

/// A buyer posted a new contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractCreated {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// Posting buyer.
    pub buyer: PartyId,
    /// Requested product.
    pub product_type: String,
    /// Requested quantity.
    pub quantity: Quantity,
    /// Price ceiling per unit.
    pub max_price: Money,
    /// Contract end time.
    pub end_time: Timestamp,
}

impl ContractCreated {
    /// Creates the event from a freshly created contract.
    #[must_use]
    pub fn from_contract(contract: &Contract, now: Timestamp) -> Self {
        Self {
            metadata: EventMetadata::for_contract(contract.id(), now),
            buyer: contract.buyer().clone(),
            product_type: contract.product_type().to_string(),
            quantity: contract.quantity(),
            max_price: contract.max_price(),
            end_time: contract.end_time(),
        }
    }
}

impl_domain_event!(ContractCreated, EventType::Contract, "ContractCreated");

/// A matching pass selected farmers to notify.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FarmersMatched {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// Requested product.
    pub product_type: String,
    /// Requested quantity.
    pub quantity: Quantity,
    /// Price ceiling per unit.
    pub max_price: Money,
    /// Farmers not previously notified.
    pub farmers: Vec<PartyId>,
}

impl FarmersMatched {
    /// Creates the event for newly matched farmers.
    #[must_use]
    pub fn new(contract: &Contract, farmers: Vec<PartyId>, now: Timestamp) -> Self {
        Self {
            metadata: EventMetadata::for_contract(contract.id(), now),
            product_type: contract.product_type().to_string(),
            quantity: contract.quantity(),
            max_price: contract.max_price(),
            farmers,
        }
    }
}

impl_domain_event!(FarmersMatched, EventType::Contract, "FarmersMatched");

/// A farmer submitted an offer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferSubmitted {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// Contract owner, who is notified.
    pub buyer: PartyId,
    /// Requested product.
    pub product_type: String,
    /// The new offer.
    pub offer_id: OfferId,
    /// Offering farmer.
    pub farmer: PartyId,
    /// Offered quantity.
    pub quantity: Quantity,
    /// Offered unit price.
    pub price: Money,
}

impl OfferSubmitted {
    /// Creates the event.
    #[must_use]
    pub fn new(contract: &Contract, offer: &Offer, now: Timestamp) -> Self {
        Self {
            metadata: EventMetadata::for_contract(contract.id(), now),
            buyer: contract.buyer().clone(),
            product_type: contract.product_type().to_string(),
            offer_id: offer.id(),
            farmer: offer.farmer().clone(),
            quantity: offer.quantity(),
            price: offer.price(),
        }
    }
}

impl_domain_event!(OfferSubmitted, EventType::Offer, "OfferSubmitted");

/// The buyer accepted an offer and the contract was fulfilled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferAccepted {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// Requested product.
    pub product_type: String,
    /// The winning offer.
    pub offer_id: OfferId,
    /// Winning farmer.
    pub winner: PartyId,
    /// Farmers whose offers were all rejected.
    pub rejected_farmers: Vec<PartyId>,
}

impl OfferAccepted {
    /// Creates the event from a fulfilled contract.
    ///
    /// Returns `None` if the contract has no winning offer.
    #[must_use]
    pub fn from_contract(contract: &Contract, now: Timestamp) -> Option<Self> {
        let winner = contract.winning_offer()?;
        let rejected_farmers = contract
            .offering_farmers()
            .into_iter()
            .filter(|farmer| farmer != winner.farmer())
            .collect();
        Some(Self {
            metadata: EventMetadata::for_contract(contract.id(), now),
            product_type: contract.product_type().to_string(),
            offer_id: winner.id(),
            winner: winner.farmer().clone(),
            rejected_farmers,
        })
    }
}

impl_domain_event!(OfferAccepted, EventType::Offer, "OfferAccepted");

/// The buyer withdrew the contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractCancelled {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// Requested product.
    pub product_type: String,
    /// Farmers with offers on the contract.
    pub offering_farmers: Vec<PartyId>,
}

impl ContractCancelled {
    /// Creates the event from a cancelled contract.
    #[must_use]
    pub fn from_contract(contract: &Contract, now: Timestamp) -> Self {
        Self {
            metadata: EventMetadata::for_contract(contract.id(), now),
            product_type: contract.product_type().to_string(),
            offering_farmers: contract.offering_farmers(),
        }
    }
}

impl_domain_event!(ContractCancelled, EventType::Contract, "ContractCancelled");

/// The contract's end time elapsed before an offer was accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractExpired {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// Contract owner.
    pub buyer: PartyId,
    /// Requested product.
    pub product_type: String,
    /// Number of offers received.
    pub offer_count: usize,
}

impl ContractExpired {
    /// Creates the event from an expired contract.
    #[must_use]
    pub fn from_contract(contract: &Contract, now: Timestamp) -> Self {
        Self {
            metadata: EventMetadata::for_contract(contract.id(), now),
            buyer: contract.buyer().clone(),
            product_type: contract.product_type().to_string(),
            offer_count: contract.offers().len(),
        }
    }
}

impl_domain_event!(ContractExpired, EventType::Contract, "ContractExpired");
