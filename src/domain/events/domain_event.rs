//! # Domain Event Trait
//!
//! Base trait for all domain events, along with common event metadata.

use crate::domain::value_objects::{ContractId, EventId, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Type of domain event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    /// Contract lifecycle events.
    Contract,
    /// Offer submission and acceptance.
    Offer,
    /// Payout events.
    Settlement,
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Contract => write!(f, "CONTRACT"),
            Self::Offer => write!(f, "OFFER"),
            Self::Settlement => write!(f, "SETTLEMENT"),
        }
    }
}

/// Trait for all domain events.
///
/// Domain events are immutable records of significant occurrences that
/// other parts of the system (notifications, audit) react to.
pub trait DomainEvent: Send + Sync + fmt::Debug {
    /// Returns the unique identifier for this event.
    fn event_id(&self) -> EventId;

    /// Returns the contract this event relates to, if any.
    fn contract_id(&self) -> Option<ContractId>;

    /// Returns when this event occurred.
    fn timestamp(&self) -> Timestamp;

    /// Returns the category of this event.
    fn event_type(&self) -> EventType;

    /// Returns the human-readable name of this event.
    fn event_name(&self) -> &'static str;
}

/// Common metadata embedded in every concrete event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventMetadata {
    /// Unique identifier for this event.
    pub event_id: EventId,
    /// The contract this event relates to.
    pub contract_id: Option<ContractId>,
    /// When this event occurred.
    pub timestamp: Timestamp,
}

impl EventMetadata {
    /// Creates metadata with a generated event ID.
    #[must_use]
    pub fn new(contract_id: Option<ContractId>, timestamp: Timestamp) -> Self {
        Self {
            event_id: EventId::new_v4(),
            contract_id,
            timestamp,
        }
    }

    /// Creates metadata for a specific contract.
    #[must_use]
    pub fn for_contract(contract_id: ContractId, timestamp: Timestamp) -> Self {
        Self::new(Some(contract_id), timestamp)
    }
}

/// Implements [`DomainEvent`] for a struct with a `metadata: EventMetadata` field.
macro_rules! impl_domain_event {
    ($event:ty, $event_type:expr, $name:literal) => {
        impl $crate::domain::events::domain_event::DomainEvent for $event {
            fn event_id(&self) -> $crate::domain::value_objects::EventId {
                self.metadata.event_id
            }

            fn contract_id(&self) -> Option<$crate::domain::value_objects::ContractId> {
                self.metadata.contract_id
            }

            fn timestamp(&self) -> $crate::domain::value_objects::Timestamp {
                self.metadata.timestamp
            }

            fn event_type(&self) -> $crate::domain::events::domain_event::EventType {
                $event_type
            }

            fn event_name(&self) -> &'static str {
                $name
            }
        }
    };
}

pub(crate) use impl_domain_event;
