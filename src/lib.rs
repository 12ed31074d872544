//! # agri-contracts
//!
//! Open purchase contracts between buyers and farmers.
//!
//! A buyer posts an open contract (product type, quantity, price ceiling,
//! deadline). Farmers submit competing offers against it until the buyer
//! accepts exactly one. Acceptance drives settlement: a platform fee is
//! deducted from the gross amount and the net is paid out to the winning
//! farmer, exactly once.
//!
//! # Architecture
//!
//! ```text
//! application::services   ContractLedger ─► SettlementEngine
//!                              │   └──► Matcher
//!                              └──────► NotificationDispatcher
//! domain                  Contract / Offer / Payout aggregates, Money, events
//! infrastructure          repositories, collaborator gateways, config, telemetry
//! ```
//!
//! External collaborators (party directory, notifier, payment issuer) are
//! reached through the traits in [`infrastructure::gateways::traits`] and
//! injected at construction time.

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
