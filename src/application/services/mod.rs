//! # Application Services
//!
//! Services that orchestrate domain logic and infrastructure.
//!
//! - [`ContractLedger`]: contract lifecycle and the negotiation state machine
//! - [`SettlementEngine`]: fee splits and exactly-once payouts
//! - [`Matcher`]: farmer eligibility by product type
//! - [`NotificationDispatcher`]: best-effort notification side channel

pub mod contract_ledger;
mod lock_table;
pub mod matcher;
pub mod notification_dispatcher;
pub mod retry;
pub mod settlement_engine;

pub use contract_ledger::ContractLedger;
pub use matcher::Matcher;
pub use notification_dispatcher::NotificationDispatcher;
pub use retry::CollaboratorPolicy;
pub use settlement_engine::{SettlementEngine, SettlementPolicy};
