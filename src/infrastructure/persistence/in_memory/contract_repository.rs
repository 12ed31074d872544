//! # In-Memory Contract Repository
//!
//! In-memory implementation of [`ContractRepository`] for tests and the demo
//! binary.

use crate::domain::entities::Contract;
use crate::domain::value_objects::{ContractId, PartyId};
use crate::infrastructure::persistence::traits::{
    ContractRepository, RepositoryError, RepositoryResult,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory implementation of [`ContractRepository`].
///
/// Uses a thread-safe `HashMap`; `update` performs a compare-and-swap on
/// the contract version under the write lock.
#[derive(Debug, Clone, Default)]
pub struct InMemoryContractRepository {
    storage: Arc<RwLock<HashMap<ContractId, Contract>>>,
}

impl InMemoryContractRepository {
    /// Creates a new empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored contracts.
    pub async fn len(&self) -> usize {
        self.storage.read().await.len()
    }

    /// Returns true if no contracts are stored.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    async fn collect_where<F>(&self, predicate: F) -> Vec<Contract>
    where
        F: Fn(&Contract) -> bool,
    {
        let storage = self.storage.read().await;
        let mut found: Vec<Contract> = storage.values().filter(|c| predicate(c)).cloned().collect();
        found.sort_by_key(|c| (c.created_at(), c.id()));
        found
    }
}

#[async_trait]
impl ContractRepository for InMemoryContractRepository {
    async fn insert(&self, contract: &Contract) -> RepositoryResult<()> {
        let mut storage = self.storage.write().await;
        if storage.contains_key(&contract.id()) {
            return Err(RepositoryError::duplicate(
                "Contract",
                contract.id().to_string(),
            ));
        }
        storage.insert(contract.id(), contract.clone());
        Ok(())
    }

    async fn update(&self, contract: &Contract, expected_version: u64) -> RepositoryResult<()> {
        let mut storage = self.storage.write().await;
        let stored = storage
            .get_mut(&contract.id())
            .ok_or_else(|| RepositoryError::not_found("Contract", contract.id().to_string()))?;
        if stored.version() != expected_version {
            return Err(RepositoryError::version_conflict(
                "Contract",
                contract.id().to_string(),
                expected_version,
                stored.version(),
            ));
        }
        *stored = contract.clone();
        Ok(())
    }

    async fn get(&self, id: ContractId) -> RepositoryResult<Option<Contract>> {
        let storage = self.storage.read().await;
        Ok(storage.get(&id).cloned())
    }

    async fn find_by_buyer(&self, buyer: &PartyId) -> RepositoryResult<Vec<Contract>> {
        Ok(self.collect_where(|c| c.buyer() == buyer).await)
    }

    async fn find_by_farmer(&self, farmer: &PartyId) -> RepositoryResult<Vec<Contract>> {
        Ok(self.collect_where(|c| c.has_offer_from(farmer)).await)
    }

    async fn find_all(&self) -> RepositoryResult<Vec<Contract>> {
        Ok(self.collect_where(|_| true).await)
    }
}
