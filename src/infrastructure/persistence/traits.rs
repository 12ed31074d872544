//! # Repository Traits
//!
//! Port definitions for persistence abstraction.
//!
//! # Available Repositories
//!
//! - [`ContractRepository`]: Contracts with their embedded offers
//! - [`PayoutRepository`]: Payout records with a (source, recipient) uniqueness index
//! - [`TransactionRepository`]: Standalone sale transactions
//!
//! # Examples
//!
//! ```ignore
//! use agri_contracts::infrastructure::persistence::traits::ContractRepository;
//!
//! async fn buyer_contracts(repo: &impl ContractRepository, buyer: &PartyId) {
//!     let contracts = repo.find_by_buyer(buyer).await.unwrap();
//!     println!("{} contracts", contracts.len());
//! }
//! ```

use crate::domain::entities::{Contract, Payout, PayoutSource, Transaction};
use crate::domain::value_objects::{ContractId, PartyId, PayoutId, TransactionId};
use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

/// Error type for repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Entity not found.
    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound {
        /// Type of entity.
        entity_type: &'static str,
        /// Entity identifier.
        id: String,
    },

    /// Duplicate entity or unique-key violation.
    #[error("Duplicate entity: {entity_type} with key {id} already exists")]
    Duplicate {
        /// Type of entity.
        entity_type: &'static str,
        /// Conflicting key.
        id: String,
    },

    /// Optimistic locking conflict.
    #[error("Version conflict: {entity_type} with id {id} has been modified")]
    VersionConflict {
        /// Type of entity.
        entity_type: &'static str,
        /// Entity identifier.
        id: String,
        /// Expected version.
        expected: u64,
        /// Actual version.
        actual: u64,
    },

    /// Storage backend unreachable.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl RepositoryError {
    /// Creates a not found error.
    #[must_use]
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates a duplicate error.
    #[must_use]
    pub fn duplicate(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::Duplicate {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates a version conflict error.
    #[must_use]
    pub fn version_conflict(
        entity_type: &'static str,
        id: impl Into<String>,
        expected: u64,
        actual: u64,
    ) -> Self {
        Self::VersionConflict {
            entity_type,
            id: id.into(),
            expected,
            actual,
        }
    }

    /// Creates a connection error.
    #[must_use]
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns true if this is a not found error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns true if this is a duplicate error.
    #[must_use]
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::Duplicate { .. })
    }

    /// Returns true if this is a version conflict error.
    #[must_use]
    pub fn is_version_conflict(&self) -> bool {
        matches!(self, Self::VersionConflict { .. })
    }

    /// Returns true if the backend was unreachable.
    #[must_use]
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }
}

/// Result type for repository operations.
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Repository for contract aggregates.
///
/// Offers are embedded in the contract and persisted with it.
#[async_trait]
pub trait ContractRepository: Send + Sync + fmt::Debug {
    /// Inserts a new contract.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Duplicate` if the ID already exists.
    async fn insert(&self, contract: &Contract) -> RepositoryResult<()>;

    /// Replaces a stored contract if its version still equals `expected_version`.
    ///
    /// # Errors
    ///
    /// - `RepositoryError::NotFound` if the contract does not exist
    /// - `RepositoryError::VersionConflict` if it was modified concurrently
    async fn update(&self, contract: &Contract, expected_version: u64) -> RepositoryResult<()>;

    /// Gets a contract by ID.
    async fn get(&self, id: ContractId) -> RepositoryResult<Option<Contract>>;

    /// Finds contracts posted by `buyer`, oldest first.
    async fn find_by_buyer(&self, buyer: &PartyId) -> RepositoryResult<Vec<Contract>>;

    /// Finds contracts on which `farmer` has an offer, oldest first.
    async fn find_by_farmer(&self, farmer: &PartyId) -> RepositoryResult<Vec<Contract>>;

    /// Returns every contract, oldest first.
    async fn find_all(&self) -> RepositoryResult<Vec<Contract>>;
}

/// Repository for payout records.
///
/// Implementations must enforce uniqueness of `(source, recipient)` among
/// non-void payouts at insert time; this is what makes settlement
/// exactly-once. Storing a payout as Void releases its pair.
#[async_trait]
pub trait PayoutRepository: Send + Sync + fmt::Debug {
    /// Inserts a new payout.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Duplicate` if a non-void payout for the
    /// same `(source, recipient)` pair (or the same ID) already exists.
    async fn insert(&self, payout: &Payout) -> RepositoryResult<()>;

    /// Replaces a stored payout.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the payout does not exist.
    async fn update(&self, payout: &Payout) -> RepositoryResult<()>;

    /// Gets a payout by ID.
    async fn get(&self, id: PayoutId) -> RepositoryResult<Option<Payout>>;

    /// Finds payouts for a source, oldest first.
    async fn find_by_source(&self, source: PayoutSource) -> RepositoryResult<Vec<Payout>>;

    /// Finds payouts to a recipient, oldest first.
    async fn find_by_recipient(&self, recipient: &PartyId) -> RepositoryResult<Vec<Payout>>;
}

/// Repository for standalone sale transactions.
#[async_trait]
pub trait TransactionRepository: Send + Sync + fmt::Debug {
    /// Inserts or replaces a transaction.
    async fn save(&self, transaction: &Transaction) -> RepositoryResult<()>;

    /// Gets a transaction by ID.
    async fn get(&self, id: TransactionId) -> RepositoryResult<Option<Transaction>>;
}
