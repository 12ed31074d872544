//! # Domain Entities
//!
//! Aggregate roots and entities representing core business concepts.
//!
//! ## Aggregates
//!
//! - [`Contract`]: Open contract with its offer state machine
//! - [`Payout`]: Settlement record with exactly-once issuance
//! - [`Transaction`]: Standalone sale eligible for a manual payout
//!
//! ## Entities
//!
//! - [`Offer`]: Farmer's fulfillment offer, owned by a contract

pub mod contract;
pub mod offer;
pub mod payout;
pub mod transaction;

pub use contract::{Contract, ContractBuilder};
pub use offer::Offer;
pub use payout::{Payout, PayoutSource};
pub use transaction::Transaction;
