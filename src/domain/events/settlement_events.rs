//! # Settlement Events
//!
//! Events emitted by the settlement engine.

use crate::domain::entities::{Payout, PayoutSource};
use crate::domain::events::domain_event::{EventMetadata, EventType, impl_domain_event};
use crate::domain::value_objects::{ContractId, Money, PartyId, PayoutId, Timestamp};
use serde::{Deserialize, Serialize};

fn contract_of(source: PayoutSource) -> Option<ContractId> {
    match source {
        PayoutSource::Contract(id) => Some(id),
        PayoutSource::Transaction(_) => None,
    }
}

/// A payout was issued by the payment processor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutCompleted {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// The payout record.
    pub payout_id: PayoutId,
    /// What was settled.
    pub source: PayoutSource,
    /// Paid party.
    pub recipient: PartyId,
    /// Amount issued.
    pub net_amount: Money,
    /// ISO currency code.
    pub currency: String,
}

impl PayoutCompleted {
    /// Creates the event from a completed payout.
    #[must_use]
    pub fn from_payout(payout: &Payout, now: Timestamp) -> Self {
        Self {
            metadata: EventMetadata::new(contract_of(payout.source()), now),
            payout_id: payout.id(),
            source: payout.source(),
            recipient: payout.recipient().clone(),
            net_amount: payout.net_amount(),
            currency: payout.currency().to_string(),
        }
    }
}

impl_domain_event!(PayoutCompleted, EventType::Settlement, "PayoutCompleted");

/// A payout attempt failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutFailed {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// The payout record.
    pub payout_id: PayoutId,
    /// What was being settled.
    pub source: PayoutSource,
    /// Intended recipient.
    pub recipient: PartyId,
    /// Processor or engine error.
    pub reason: String,
    /// Whether a retry may succeed.
    pub retryable: bool,
}

impl PayoutFailed {
    /// Creates the event from a failed payout.
    #[must_use]
    pub fn from_payout(
        payout: &Payout,
        reason: impl Into<String>,
        retryable: bool,
        now: Timestamp,
    ) -> Self {
        Self {
            metadata: EventMetadata::new(contract_of(payout.source()), now),
            payout_id: payout.id(),
            source: payout.source(),
            recipient: payout.recipient().clone(),
            reason: reason.into(),
            retryable,
        }
    }
}

impl_domain_event!(PayoutFailed, EventType::Settlement, "PayoutFailed");
