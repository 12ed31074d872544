//! # Persistence Layer
//!
//! Repository ports and their in-memory adapters.
//!
//! ## Repository Traits (Ports)
//!
//! - [`ContractRepository`]: Contract aggregates
//! - [`PayoutRepository`]: Payout records
//! - [`TransactionRepository`]: Standalone sale transactions

pub mod in_memory;
pub mod traits;

pub use traits::{
    ContractRepository, PayoutRepository, RepositoryError, RepositoryResult,
    TransactionRepository,
};
