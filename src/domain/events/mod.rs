//! # Domain Events
//!
//! Events emitted during marketplace operations, used for notifications
//! and audit logging.
//!
//! ## Contract Events
//!
//! - [`ContractCreated`]: New contract posted
//! - [`FarmersMatched`]: Eligible farmers selected for notification
//! - [`OfferSubmitted`]: Farmer submitted an offer
//! - [`OfferAccepted`]: Buyer accepted an offer
//! - [`ContractCancelled`]: Buyer withdrew the contract
//! - [`ContractExpired`]: End time elapsed without acceptance
//!
//! ## Settlement Events
//!
//! - [`PayoutCompleted`]: Payout issued
//! - [`PayoutFailed`]: Payout attempt failed

pub mod contract_events;
pub mod domain_event;
pub mod market_event;
pub mod settlement_events;

pub use contract_events::{
    ContractCancelled, ContractCreated, ContractExpired, FarmersMatched, OfferAccepted,
    OfferSubmitted,
};
pub use domain_event::{DomainEvent, EventMetadata, EventType};
pub use market_event::MarketEvent;
pub use settlement_events::{PayoutCompleted, PayoutFailed};
