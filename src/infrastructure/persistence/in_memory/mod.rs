//! # In-Memory Repositories
//!
//! In-memory implementations for tests and local runs without a database.
//!
//! ## Available Repositories
//!
//! - [`InMemoryContractRepository`]: Contract persistence with version checks
//! - [`InMemoryPayoutRepository`]: Payout persistence with a uniqueness index
//! - [`InMemoryTransactionRepository`]: Transaction persistence
//!
//! ## Thread Safety
//!
//! Contracts and transactions use `Arc<RwLock<HashMap>>`; payouts use
//! `DashMap` so the unique index can be claimed atomically.

pub mod contract_repository;
pub mod payout_repository;
pub mod transaction_repository;

pub use contract_repository::InMemoryContractRepository;
pub use payout_repository::InMemoryPayoutRepository;
pub use transaction_repository::InMemoryTransactionRepository;
